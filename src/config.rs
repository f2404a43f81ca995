//! §6 CLI configuration surface: the `--config` JSON document and `--set
//! key=value` overrides, resolved into a per-rule [`RuleConfig`] map the
//! dispatcher hands to each rule's `initialize_from_config`.
//!
//! Grounded on the teacher's `config::loading` (`std::fs::read_to_string`
//! then a serde deserialization, wrapped in a typed `ConfigError` on I/O or
//! parse failure); reshaped from the teacher's layered TOML/markdownlint
//! source-tracked config into the single flat JSON document spec §6
//! describes, since this crate's config is `{rule_id: {key: value, ...}}`
//! rather than a project-wide TOML file with enable/disable precedence
//! tracking built in (that precedence now lives in `dispatch::RuleDispatcher`).

use crate::error::ConfigurationError;
use crate::rule::RuleConfig;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;

/// Loads a `--config <path>` JSON document of the form
/// `{"MD013": {"line_length": 100}, ...}` into a per-rule config map.
pub fn load_config_file(path: &Path) -> Result<HashMap<String, RuleConfig>, ConfigurationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::InvalidJson {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    parse_config_document(&content, &path.display().to_string())
}

fn parse_config_document(content: &str, path_label: &str) -> Result<HashMap<String, RuleConfig>, ConfigurationError> {
    let root: JsonValue = serde_json::from_str(content).map_err(|e| ConfigurationError::InvalidJson {
        path: path_label.to_string(),
        detail: e.to_string(),
    })?;
    let JsonValue::Object(rules) = root else {
        return Err(ConfigurationError::InvalidJson {
            path: path_label.to_string(),
            detail: "top-level config document must be a JSON object of {rule_id: {...}}".to_string(),
        });
    };

    let mut out = HashMap::new();
    for (rule_id, value) in rules {
        let JsonValue::Object(fields) = value else {
            return Err(ConfigurationError::InvalidJson {
                path: path_label.to_string(),
                detail: format!("config for rule '{rule_id}' must be a JSON object"),
            });
        };
        out.insert(rule_id, RuleConfig::new(fields));
    }
    Ok(out)
}

/// Parses one `--set key=value` override. `key` is `rule_id.field` (e.g.
/// `MD013.line_length`); a bare `field` with no rule prefix is rejected,
/// since every override must target a specific rule's configuration slice.
///
/// Without a sigil, `value` is inferred as JSON bool/number/string in that
/// order (so `--set MD013.line_length=100` needs no sigil). Sigils force
/// the type when the bare value would otherwise be misread:
/// - `$!true` / `$!false` forces boolean.
/// - `$#123` forces integer (rejecting anything that doesn't parse as one).
/// - `$*anything` forces string, even if `anything` looks like a number or
///   `true`/`false` (e.g. `--set MD003.style=$*atx`, or, were the value
///   itself `"true"`, `--set MD012.label=$*true`).
pub fn parse_set_override(raw: &str) -> Result<(String, String, JsonValue), ConfigurationError> {
    let (key, raw_value) = raw.split_once('=').ok_or_else(|| ConfigurationError::BadSetOverride {
        raw: raw.to_string(),
        reason: "expected 'rule_id.key=value'".to_string(),
    })?;
    let (rule_id, field) = key.split_once('.').ok_or_else(|| ConfigurationError::BadSetOverride {
        raw: raw.to_string(),
        reason: "key must be of the form 'rule_id.field'".to_string(),
    })?;
    if rule_id.is_empty() || field.is_empty() {
        return Err(ConfigurationError::BadSetOverride {
            raw: raw.to_string(),
            reason: "rule_id and field must both be non-empty".to_string(),
        });
    }

    let value = parse_set_value(raw, raw_value)?;
    Ok((rule_id.to_string(), field.to_string(), value))
}

fn parse_set_value(raw: &str, raw_value: &str) -> Result<JsonValue, ConfigurationError> {
    if let Some(rest) = raw_value.strip_prefix("$!") {
        return match rest {
            "true" => Ok(JsonValue::Bool(true)),
            "false" => Ok(JsonValue::Bool(false)),
            _ => Err(ConfigurationError::BadSetOverride {
                raw: raw.to_string(),
                reason: format!("'$!{rest}' is not a boolean; use $!true or $!false"),
            }),
        };
    }
    if let Some(rest) = raw_value.strip_prefix("$#") {
        return rest
            .parse::<i64>()
            .map(|n| JsonValue::Number(n.into()))
            .map_err(|_| ConfigurationError::BadSetOverride {
                raw: raw.to_string(),
                reason: format!("'$#{rest}' is not an integer"),
            });
    }
    if let Some(rest) = raw_value.strip_prefix("$*") {
        return Ok(JsonValue::String(rest.to_string()));
    }

    if raw_value == "true" {
        Ok(JsonValue::Bool(true))
    } else if raw_value == "false" {
        Ok(JsonValue::Bool(false))
    } else if let Ok(n) = raw_value.parse::<i64>() {
        Ok(JsonValue::Number(n.into()))
    } else {
        Ok(JsonValue::String(raw_value.to_string()))
    }
}

/// Applies a list of `--set` overrides on top of a config map already
/// loaded from `--config` (or an empty map if none was given). Overrides
/// win over file values for the same `rule_id.field`.
pub fn apply_set_overrides(
    mut base: HashMap<String, RuleConfig>,
    overrides: &[String],
) -> Result<HashMap<String, RuleConfig>, ConfigurationError> {
    for raw in overrides {
        let (rule_id, field, value) = parse_set_override(raw)?;
        let entry = base.entry(rule_id).or_insert_with(|| RuleConfig::new(JsonMap::new()));
        entry.insert(field, value);
    }
    Ok(base)
}

impl RuleConfig {
    /// Inserts or overwrites one field, used by `apply_set_overrides`.
    /// Kept here (rather than on `RuleConfig` itself in `rule.rs`) since
    /// mutation is only ever needed by the CLI's override-merging path,
    /// not by rules reading their own config.
    fn insert(&mut self, field: String, value: JsonValue) {
        self.values_mut().insert(field, value);
    }
}
