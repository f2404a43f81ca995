//! MD013: lines must not exceed a configured maximum length.
//!
//! Grounded on the teacher's `md013_line_length.rs` line-by-line character
//! count against `self.line_length`; kept deliberately small relative to
//! the teacher's ~2000-line rule, which additionally special-cases code
//! blocks, tables, and headings behind their own config flags — this
//! rule implements the single-flat-limit core the spec's scenario exercises.

use crate::rule::{Rule, RuleConfig, RuleContext, RuleDetails};

pub struct Md013LineLength {
    line_length: i64,
}

impl Default for Md013LineLength {
    fn default() -> Self {
        Self { line_length: Self::DEFAULT_LENGTH }
    }
}

impl Md013LineLength {
    const DEFAULT_LENGTH: i64 = 80;
}

impl Rule for Md013LineLength {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD013",
            name: "line-length",
            description: "Line length",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn initialize_from_config(&mut self, config: &RuleConfig) -> Result<(), crate::error::ConfigurationError> {
        self.line_length = config.get_int("MD013", "line_length", Self::DEFAULT_LENGTH)?;
        Ok(())
    }

    fn next_line(&mut self, ctx: &mut RuleContext<'_>, text: &str) {
        let len = text.chars().count() as i64;
        if len > self.line_length {
            ctx.report(
                ctx.line,
                self.line_length as u32 + 1,
                Some(format!("expected <= {}, found {len}", self.line_length)),
            );
        }
    }
}
