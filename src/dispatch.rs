//! §4.H rule dispatcher.
//!
//! Registers rules in a deterministic, sorted-by-id order (spec §5's
//! "insertion order of their registration, which is deterministic from the
//! sorted rule-id list at initialization time"), then drives three
//! lifecycle events per file: `starting_file`, one `next_token`/`next_line`
//! call per token/line in document order, and `finished_file`.
//!
//! Grounded on the teacher's `rule::Rule` consumers
//! (`PluginManager::starting_new_file`/`next_line`/`completed_file` in
//! `original_source/pymarkdown/plugin_manager.py`) for the per-file loop
//! shape, and on the teacher's `std::panic::catch_unwind` usage
//! (`utils/ast_utils.rs`, `main.rs`) for turning a misbehaving rule's panic
//! into a [`RuleExecutionError`] instead of aborting the whole process —
//! PyMarkdown wraps the analogous `Exception` into `BadPluginError`.

use crate::error::{ConfigurationError, DispatchPhase, RuleExecutionError};
use crate::lrd::LinkRefRegistry;
use crate::rule::{Rule, RuleConfig, RuleContext, Violation};
use crate::token::Token;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

/// Owns the set of enabled rules for one run and drives them over each
/// document's token stream. Built once per invocation of the CLI (or
/// embedder); [`RuleDispatcher::run_file`] is called once per document.
pub struct RuleDispatcher {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleDispatcher {
    /// Registers `rules`, applying command-line enable/disable sets (by id
    /// or name) on top of each rule's `enabled_by_default`, with disable
    /// taking priority when both sets mention the same rule. Rules end up
    /// sorted by id for deterministic invocation order. Per-rule
    /// configuration is loaded via `initialize_from_config` before any file
    /// is scanned; a rule whose metadata or configuration is invalid
    /// aborts registration entirely (`ConfigurationError` is fatal to the
    /// whole process per spec §7).
    pub fn new(
        mut rules: Vec<Box<dyn Rule>>,
        enable: &HashSet<String>,
        disable: &HashSet<String>,
        config: &HashMap<String, RuleConfig>,
    ) -> Result<Self, ConfigurationError> {
        rules.sort_by(|a, b| a.details().id.cmp(b.details().id));

        let mut enabled = Vec::new();
        for mut rule in rules {
            let details = rule.details();
            details.validate()?;

            let mentioned_disabled = disable.contains(details.id) || disable.contains(details.name);
            let mentioned_enabled = enable.contains(details.id) || enable.contains(details.name);
            let is_enabled = if mentioned_disabled {
                false
            } else if mentioned_enabled {
                true
            } else {
                details.enabled_by_default
            };

            if !is_enabled {
                continue;
            }

            let empty = RuleConfig::default();
            let rule_config = config.get(details.id).unwrap_or(&empty);
            rule.initialize_from_config(rule_config)?;
            enabled.push(rule);
        }

        Ok(Self { rules: enabled })
    }

    pub fn enabled_rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.details().id).collect()
    }

    /// Runs all enabled rules over one file's lines and token stream,
    /// collecting every reported [`Violation`]. A rule that panics during
    /// any hook is isolated: its error is wrapped in a
    /// [`RuleExecutionError`], the remaining tokens for that rule in this
    /// file are skipped, but other rules and other files continue.
    pub fn run_file(
        &mut self,
        path: &str,
        lines: &[&str],
        tokens: &[Token],
        registry: &LinkRefRegistry,
    ) -> (Vec<Violation>, Vec<RuleExecutionError>) {
        let mut violations = Vec::new();
        let mut errors = Vec::new();

        for rule in &mut self.rules {
            let details = rule.details();
            if catch(&details.id, DispatchPhase::StartingFile, &mut errors, AssertUnwindSafe(|| rule.starting_file(path))).is_none() {
                continue;
            }

            let mut skip_rule = false;
            for (idx, line) in lines.iter().enumerate() {
                if skip_rule {
                    break;
                }
                let mut ctx = RuleContext::new(path, details, &mut violations);
                ctx.line = idx as u32 + 1;
                let line = *line;
                if catch(
                    &details.id,
                    DispatchPhase::NextLine,
                    &mut errors,
                    AssertUnwindSafe(|| rule.next_line(&mut ctx, line)),
                )
                .is_none()
                {
                    skip_rule = true;
                }
            }
            if skip_rule {
                continue;
            }

            for token in tokens {
                let mut ctx = RuleContext::new(path, details, &mut violations).with_registry(registry);
                ctx.line = token.pos.line;
                if catch(
                    &details.id,
                    DispatchPhase::NextToken,
                    &mut errors,
                    AssertUnwindSafe(|| rule.next_token(&mut ctx, token)),
                )
                .is_none()
                {
                    skip_rule = true;
                    break;
                }
            }
            if skip_rule {
                continue;
            }

            let mut ctx = RuleContext::new(path, details, &mut violations).with_registry(registry);
            ctx.line = last_line(lines, tokens);
            catch(
                &details.id,
                DispatchPhase::FinishedFile,
                &mut errors,
                AssertUnwindSafe(|| rule.finished_file(&mut ctx)),
            );
        }

        violations.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
        (violations, errors)
    }
}

fn last_line(lines: &[&str], tokens: &[Token]) -> u32 {
    tokens
        .last()
        .map(|t| t.pos.line)
        .unwrap_or(lines.len().max(1) as u32)
}

fn catch(
    rule_id: &'static str,
    phase: DispatchPhase,
    errors: &mut Vec<RuleExecutionError>,
    body: AssertUnwindSafe<impl FnOnce()>,
) -> Option<()> {
    match panic::catch_unwind(body) {
        Ok(()) => Some(()),
        Err(payload) => {
            let detail = panic_message(&payload);
            errors.push(RuleExecutionError {
                rule_id: rule_id.to_string(),
                phase,
                detail,
            });
            None
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::rule::RuleDetails;
    use crate::token::TokenKind;

    struct Flagger {
        id: &'static str,
    }

    impl Rule for Flagger {
        fn details(&self) -> RuleDetails {
            RuleDetails {
                id: self.id,
                name: "flagger",
                description: "flags every heading",
                enabled_by_default: true,
                interface_version: crate::rule::INTERFACE_VERSION,
            }
        }

        fn next_token(&mut self, ctx: &mut RuleContext<'_>, token: &Token) {
            if let TokenKind::AtxHeadingStart { .. } = token.kind {
                ctx.report(token.pos.line, token.pos.column, None);
            }
        }
    }

    struct Panicker;

    impl Rule for Panicker {
        fn details(&self) -> RuleDetails {
            RuleDetails {
                id: "MD998",
                name: "panicker",
                description: "always panics",
                enabled_by_default: true,
                interface_version: crate::rule::INTERFACE_VERSION,
            }
        }

        fn next_token(&mut self, _ctx: &mut RuleContext<'_>, _token: &Token) {
            panic!("boom");
        }
    }

    fn heading_token() -> Token {
        Token::new(Position::new(1, 1), TokenKind::AtxHeadingStart { level: 1, hashes: 1 })
    }

    #[test]
    fn enabled_by_default_rule_reports_violations() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Flagger { id: "MD001" })];
        let mut dispatcher = RuleDispatcher::new(rules, &HashSet::new(), &HashSet::new(), &HashMap::new()).unwrap();
        let (violations, errors) = dispatcher.run_file("doc.md", &["# Title"], &[heading_token()], &LinkRefRegistry::new());
        assert_eq!(violations.len(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn disable_set_suppresses_a_default_enabled_rule() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Flagger { id: "MD001" })];
        let disable: HashSet<String> = ["MD001".to_string()].into_iter().collect();
        let dispatcher = RuleDispatcher::new(rules, &HashSet::new(), &disable, &HashMap::new()).unwrap();
        assert!(dispatcher.enabled_rule_ids().is_empty());
    }

    #[test]
    fn disable_takes_priority_over_enable_for_the_same_rule() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Flagger { id: "MD001" })];
        let enable: HashSet<String> = ["MD001".to_string()].into_iter().collect();
        let disable: HashSet<String> = ["MD001".to_string()].into_iter().collect();
        let dispatcher = RuleDispatcher::new(rules, &enable, &disable, &HashMap::new()).unwrap();
        assert!(dispatcher.enabled_rule_ids().is_empty());
    }

    #[test]
    fn rules_are_invoked_in_sorted_id_order() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Flagger { id: "MD010" }), Box::new(Flagger { id: "MD002" })];
        let dispatcher = RuleDispatcher::new(rules, &HashSet::new(), &HashSet::new(), &HashMap::new()).unwrap();
        assert_eq!(dispatcher.enabled_rule_ids(), vec!["MD002", "MD010"]);
    }

    #[test]
    fn a_panicking_rule_yields_a_rule_execution_error_without_aborting_the_run() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Panicker)];
        let mut dispatcher = RuleDispatcher::new(rules, &HashSet::new(), &HashSet::new(), &HashMap::new()).unwrap();
        let (violations, errors) = dispatcher.run_file("doc.md", &["# Title"], &[heading_token()], &LinkRefRegistry::new());
        assert!(violations.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule_id, "MD998");
        assert_eq!(errors[0].phase, DispatchPhase::NextToken);
    }

    #[test]
    fn unknown_interface_version_rejects_registration() {
        struct Stale;
        impl Rule for Stale {
            fn details(&self) -> RuleDetails {
                RuleDetails {
                    id: "MD997",
                    name: "stale",
                    description: "old interface",
                    enabled_by_default: true,
                    interface_version: crate::rule::INTERFACE_VERSION + 1,
                }
            }
        }
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Stale)];
        let result = RuleDispatcher::new(rules, &HashSet::new(), &HashSet::new(), &HashMap::new());
        assert!(matches!(result, Err(ConfigurationError::InterfaceVersionMismatch { .. })));
    }
}
