//! MD052: reference links and images must resolve against a link reference
//! definition.
//!
//! An unresolved `[text][label]` degrades during inline resolution (§4.F)
//! into literal `Text` tokens carrying no trace of the label that was
//! attempted, so this rule can't work purely off the token stream. It
//! instead re-scans each raw source line for the three reference forms
//! (full `[text][label]`, collapsed `[text][]`, shortcut `[text]`) and
//! checks each label against the [`LinkRefRegistry`](crate::lrd::LinkRefRegistry)
//! threaded onto [`RuleContext`] for exactly this purpose. Grounded on the
//! teacher's `md052_reference_links_images.rs`, which does the same
//! line-text-plus-registry cross-check rather than trusting the parsed AST
//! to retain failed-resolution attempts.

use crate::rule::{Rule, RuleContext, RuleDetails};

pub struct Md052ReferenceLinksImages {
    in_fenced_code: bool,
}

impl Default for Md052ReferenceLinksImages {
    fn default() -> Self {
        Self { in_fenced_code: false }
    }
}

/// One `[...]` or `[...][...]` reference candidate found on a line.
struct Candidate {
    column: usize,
    label: String,
}

fn find_candidates(text: &str) -> Vec<Candidate> {
    let chars: Vec<char> = text.chars().collect();
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '[' {
            i += 1;
            continue;
        }
        let start = i;
        let Some((first, after_first)) = read_bracket(&chars, i) else {
            i += 1;
            continue;
        };

        if after_first < chars.len() && chars[after_first] == '(' {
            // Inline-style link/image, e.g. `[text](dest)` — not a reference.
            i = after_first + 1;
            continue;
        }

        if after_first < chars.len() && chars[after_first] == '[' {
            if let Some((second, after_second)) = read_bracket(&chars, after_first) {
                let label = if second.is_empty() { first } else { second };
                candidates.push(Candidate { column: start, label });
                i = after_second;
                continue;
            }
        }

        candidates.push(Candidate { column: start, label: first });
        i = after_first;
    }

    candidates
}

/// Reads a `[...]` span starting at `open`, returning its inner text and the
/// index just past the closing bracket. Does not handle nested brackets.
fn read_bracket(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut j = open + 1;
    let mut inner = String::new();
    while j < chars.len() {
        match chars[j] {
            ']' => return Some((inner, j + 1)),
            '[' => return None,
            c => inner.push(c),
        }
        j += 1;
    }
    None
}

impl Rule for Md052ReferenceLinksImages {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD052",
            name: "reference-links-images",
            description: "Reference links and images should use a label that is defined",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn starting_file(&mut self, _path: &str) {
        self.in_fenced_code = false;
    }

    fn next_line(&mut self, ctx: &mut RuleContext<'_>, text: &str) {
        if text.trim_start().starts_with("```") || text.trim_start().starts_with("~~~") {
            self.in_fenced_code = !self.in_fenced_code;
            return;
        }
        if self.in_fenced_code {
            return;
        }

        let Some(registry) = ctx.registry() else { return };

        for candidate in find_candidates(text) {
            if registry.lookup(&candidate.label).is_none() {
                ctx.report(
                    ctx.line,
                    candidate.column as u32 + 1,
                    Some(format!("no link reference definition found for label '{}'", candidate.label)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrd::LinkRefRegistry;

    fn check(rule: &mut Md052ReferenceLinksImages, registry: &LinkRefRegistry, text: &str) -> Vec<crate::rule::Violation> {
        let mut violations = Vec::new();
        let mut ctx = RuleContext::new("doc.md", rule.details(), &mut violations).with_registry(registry);
        ctx.line = 1;
        rule.next_line(&mut ctx, text);
        violations
    }

    #[test]
    fn resolved_full_reference_is_not_flagged() {
        let mut registry = LinkRefRegistry::new();
        registry.register("foo", "/foo", None);
        let mut rule = Md052ReferenceLinksImages::default();
        assert!(check(&mut rule, &registry, "see [text][foo] here").is_empty());
    }

    #[test]
    fn unresolved_full_reference_is_flagged() {
        let registry = LinkRefRegistry::new();
        let mut rule = Md052ReferenceLinksImages::default();
        let violations = check(&mut rule, &registry, "see [text][missing] here");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].detail.as_deref().unwrap().contains("missing"));
    }

    #[test]
    fn unresolved_shortcut_reference_is_flagged() {
        let registry = LinkRefRegistry::new();
        let mut rule = Md052ReferenceLinksImages::default();
        let violations = check(&mut rule, &registry, "see [nope] here");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn collapsed_reference_resolves_against_its_own_text() {
        let mut registry = LinkRefRegistry::new();
        registry.register("text", "/text", None);
        let mut rule = Md052ReferenceLinksImages::default();
        assert!(check(&mut rule, &registry, "see [text][] here").is_empty());
    }

    #[test]
    fn inline_style_links_are_not_references_and_are_never_flagged() {
        let registry = LinkRefRegistry::new();
        let mut rule = Md052ReferenceLinksImages::default();
        assert!(check(&mut rule, &registry, "see [text](https://example.com) here").is_empty());
    }

    #[test]
    fn fenced_code_lines_are_skipped() {
        let registry = LinkRefRegistry::new();
        let mut rule = Md052ReferenceLinksImages::default();
        rule.in_fenced_code = true;
        assert!(check(&mut rule, &registry, "[nope] inside a fence").is_empty());
    }
}
