//! §4.D Link-reference registry.
//!
//! Maps a normalized link label to its `(destination, title)`. Grounded on
//! the teacher's `lint_context.rs` `ReferenceDef`/`parse_reference_defs`,
//! but normalizing per spec (trim, collapse internal whitespace, Unicode
//! case-fold) rather than the teacher's lowercase-only normalization, and
//! enforcing first-occurrence-wins (invariant 5) rather than last-wins.

use indexmap::IndexMap;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRefDefinition {
    pub destination: String,
    pub title: Option<String>,
}

/// Case-folds and whitespace-collapses a link label per CommonMark §4.7 /
/// spec §4.D. Idempotent: `normalize_label(normalize_label(x)) ==
/// normalize_label(x)`.
pub fn normalize_label(label: &str) -> String {
    let collapsed: String = label.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.nfc().collect::<String>().to_lowercase()
}

#[derive(Debug, Default)]
pub struct LinkRefRegistry {
    defs: IndexMap<String, LinkRefDefinition>,
}

impl LinkRefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition. First occurrence wins: a later duplicate
    /// normalized label is silently ignored as a definition (it remains
    /// usable as literal text by whatever parsed it).
    pub fn register(&mut self, label: &str, destination: impl Into<String>, title: Option<String>) -> bool {
        let key = normalize_label(label);
        if self.defs.contains_key(&key) {
            return false;
        }
        self.defs.insert(
            key,
            LinkRefDefinition {
                destination: destination.into(),
                title,
            },
        );
        true
    }

    pub fn lookup(&self, label: &str) -> Option<&LinkRefDefinition> {
        self.defs.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
