//! Error kinds, in increasing severity, matching the four failure modes a
//! document scan can encounter. Modeled after the teacher's `rule::LintError`
//! (`thiserror`-derived, `#[from]` conversions for I/O) but split into the
//! severities the rule-dispatch engine needs to distinguish: configuration
//! problems abort the whole run, rule panics are scoped to one file, parse
//! anomalies are diagnostic-only, and unreadable files are per-file fatal.

use thiserror::Error;

/// Invalid user configuration or bad rule metadata.
///
/// Surfaced before any scanning begins; fatal to the whole process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("rule '{rule_id}' is unknown")]
    UnknownRule { rule_id: String },

    #[error("rule '{rule_id}' declares interface_version {found}, expected {expected}")]
    InterfaceVersionMismatch {
        rule_id: String,
        found: u32,
        expected: u32,
    },

    #[error("rule '{rule_id}' field '{field}' must be a non-empty string")]
    EmptyRequiredField { rule_id: String, field: String },

    #[error("key '{key}' expected a {expected} value but got '{actual}'")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("could not parse --set override '{raw}': {reason}")]
    BadSetOverride { raw: String, reason: String },

    #[error("config file '{path}' is not valid JSON: {detail}")]
    InvalidJson { path: String, detail: String },
}

/// A rule raised (panicked or returned an internal error) while being
/// dispatched a token or line. Scoped to the file currently being scanned;
/// remaining tokens for that file are skipped, but other files continue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("rule '{rule_id}' failed during {phase}: {detail}")]
pub struct RuleExecutionError {
    pub rule_id: String,
    pub phase: DispatchPhase,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    StartingFile,
    NextLine,
    NextToken,
    FinishedFile,
}

impl std::fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchPhase::StartingFile => "starting_file",
            DispatchPhase::NextLine => "next_line",
            DispatchPhase::NextToken => "next_token",
            DispatchPhase::FinishedFile => "finished_file",
        };
        f.write_str(s)
    }
}

/// Non-fatal tokenizer anomaly. The tokenizer never fails outright (it
/// degrades to literal text per CommonMark's permissiveness); anomalies are
/// recorded here purely for diagnostic logging, not surfaced as violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAnomaly {
    pub line: u32,
    pub detail: String,
}

impl std::fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.detail)
    }
}

/// Unreadable file or invalid UTF-8. Per-file fatal; the overall process
/// exit code still goes non-zero, but other files keep scanning.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not valid UTF-8 at byte {byte_offset}")]
    InvalidUtf8 { path: String, byte_offset: usize },
}
