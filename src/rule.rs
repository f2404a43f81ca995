//! §4.H plugin interface: the shape every lint rule implements.
//!
//! Grounded on the teacher's `rule::Rule` trait (`name`/`description`/
//! `check(ctx)`), reshaped per SPEC_FULL.md §9 from a whole-document
//! `check` call into the three-lifecycle streaming model described in
//! `original_source/pymarkdown/plugin_manager.py`'s `Plugin` ABC
//! (`get_details`, `initialize_from_config`, `starting_new_file`,
//! `completed_file`, `next_line`) plus a `next_token` hook this crate adds
//! since PyMarkdown dispatches lines, not tokens. `RuleDetails::validate`
//! mirrors `PluginManager`'s load-time checks that raised `BadPluginError`
//! on a missing/misshapen `PluginDetails` field.

use crate::error::ConfigurationError;
use crate::lrd::LinkRefRegistry;
use crate::token::Token;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// The interface version this build of the engine supports. A rule whose
/// `RuleDetails::interface_version` doesn't match is rejected at
/// registration time, before any file is scanned.
pub const INTERFACE_VERSION: u32 = 1;

/// A rule's identity record, returned by [`Rule::details`].
#[derive(Debug, Clone, Copy)]
pub struct RuleDetails {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled_by_default: bool,
    pub interface_version: u32,
}

impl RuleDetails {
    /// Checks the dispatcher's registration invariants: interface version
    /// matches, and `id`/`name`/`description` are non-empty.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.interface_version != INTERFACE_VERSION {
            return Err(ConfigurationError::InterfaceVersionMismatch {
                rule_id: self.id.to_string(),
                found: self.interface_version,
                expected: INTERFACE_VERSION,
            });
        }
        for (field, value) in [("id", self.id), ("name", self.name), ("description", self.description)] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::EmptyRequiredField {
                    rule_id: self.id.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One rule's slice of the `--config`/`--set` JSON configuration document
/// (spec §6). Typed accessors raise [`ConfigurationError::TypeMismatch`] on
/// a present-but-wrong-typed key; an absent key falls back to `default`.
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    values: JsonMap<String, JsonValue>,
}

impl RuleConfig {
    pub fn new(values: JsonMap<String, JsonValue>) -> Self {
        Self { values }
    }

    /// Mutable access to the backing map, used by `config::apply_set_overrides`
    /// to merge `--set` overrides on top of a loaded config document. Rules
    /// themselves only ever read configuration, never write it.
    pub(crate) fn values_mut(&mut self) -> &mut JsonMap<String, JsonValue> {
        &mut self.values
    }

    pub fn get_bool(&self, rule_id: &str, key: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(JsonValue::Bool(b)) => Ok(*b),
            Some(other) => Err(Self::mismatch(rule_id, key, "boolean", other)),
        }
    }

    pub fn get_int(&self, rule_id: &str, key: &str, default: i64) -> Result<i64, ConfigurationError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(JsonValue::Number(n)) if n.is_i64() => Ok(n.as_i64().expect("is_i64 just checked")),
            Some(other) => Err(Self::mismatch(rule_id, key, "integer", other)),
        }
    }

    pub fn get_string(&self, rule_id: &str, key: &str, default: &str) -> Result<String, ConfigurationError> {
        match self.values.get(key) {
            None => Ok(default.to_string()),
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(Self::mismatch(rule_id, key, "string", other)),
        }
    }

    /// A string accessor with an extra `validator` predicate, matching
    /// spec §6's `get_string(key, default, validator)` signature — used by
    /// rules with an enumerated style option (e.g. `MD003.style`).
    pub fn get_validated_string(
        &self,
        rule_id: &str,
        key: &str,
        default: &str,
        validator: impl Fn(&str) -> bool,
    ) -> Result<String, ConfigurationError> {
        let value = self.get_string(rule_id, key, default)?;
        if validator(&value) {
            Ok(value)
        } else {
            Err(ConfigurationError::TypeMismatch {
                key: format!("{rule_id}.{key}"),
                expected: "a value this rule's validator accepts",
                actual: value,
            })
        }
    }

    fn mismatch(rule_id: &str, key: &str, expected: &'static str, actual: &JsonValue) -> ConfigurationError {
        ConfigurationError::TypeMismatch {
            key: format!("{rule_id}.{key}"),
            expected,
            actual: actual.to_string(),
        }
    }
}

/// A single reported violation, emitted through [`RuleContext::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: &'static str,
    pub rule_name: &'static str,
    pub description: &'static str,
    pub line: u32,
    pub column: u32,
    pub detail: Option<String>,
}

/// Per-file dispatch context handed to every lifecycle hook: current line
/// number, file path, and the `report` sink. One `RuleContext` is shared
/// across every rule for a given file, re-pointed at the rule currently
/// being dispatched so `report` can stamp the right identity.
pub struct RuleContext<'a> {
    pub path: &'a str,
    pub line: u32,
    details: RuleDetails,
    violations: &'a mut Vec<Violation>,
    registry: Option<&'a LinkRefRegistry>,
}

impl<'a> RuleContext<'a> {
    pub fn new(path: &'a str, details: RuleDetails, violations: &'a mut Vec<Violation>) -> Self {
        Self {
            path,
            line: 0,
            details,
            violations,
            registry: None,
        }
    }

    /// Attaches the document's link-reference registry, so rules like
    /// MD052 can tell a dangling reference apart from one that resolved.
    pub fn with_registry(mut self, registry: &'a LinkRefRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn registry(&self) -> Option<&LinkRefRegistry> {
        self.registry
    }

    pub fn report(&mut self, line: u32, column: u32, detail: Option<String>) {
        self.violations.push(Violation {
            rule_id: self.details.id,
            rule_name: self.details.name,
            description: self.details.description,
            line,
            column,
            detail,
        });
    }
}

/// A unit of lint logic subscribing to the per-file token/line stream.
///
/// Every method but [`Rule::details`] has a no-op default, so a rule
/// implements only the hooks it needs — matching the teacher's `Rule`
/// trait's heavy use of default methods, and PyMarkdown's `Plugin` ABC
/// where everything but `get_details` is optional.
pub trait Rule: Send + Sync {
    fn details(&self) -> RuleDetails;

    /// Load this rule's typed parameters out of its configuration slice.
    /// Called once, before `starting_file`, for every enabled rule.
    fn initialize_from_config(&mut self, _config: &RuleConfig) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Before any token of a new file is dispatched. Rules holding
    /// per-file state (e.g. "have I seen an H1 yet") reset it here.
    fn starting_file(&mut self, _path: &str) {}

    /// Once per raw source line, for rules that check line-level
    /// properties (trailing whitespace, line length) independent of
    /// token structure.
    fn next_line(&mut self, _ctx: &mut RuleContext<'_>, _text: &str) {}

    /// Once per token, in document order.
    fn next_token(&mut self, _ctx: &mut RuleContext<'_>, _token: &Token) {}

    /// After the final end token of a file.
    fn finished_file(&mut self, _ctx: &mut RuleContext<'_>) {}
}
