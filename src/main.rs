//! CLI front end (§6): discovers Markdown files, loads configuration,
//! drives [`gfmlint_core::dispatch::RuleDispatcher`] over each one, and
//! prints the stable report format.
//!
//! Grounded on the teacher's `main.rs` (`clap`-derived args, `env_logger`
//! init from `RUST_LOG`, `colored` for terminal output, exit codes via
//! `exit_codes::exit`) and `parallel.rs` (`rayon::par_iter` fan-out across
//! independent files, gated behind a feature flag and a minimum file
//! count). Scoped down from the teacher's many subcommands (`check`,
//! `fmt`, `init`, `rule`, `config`, `server`, …) to the single flat command
//! spec §6 names. Each file gets its own freshly built `RuleDispatcher`
//! rather than one shared, mutably-dispatched instance: §5 gives every
//! document independent state, and a rule's `starting_file` reset is only
//! safe when nothing else is touching that rule's fields concurrently.

use clap::Parser;
#[cfg(feature = "color")]
use colored::Colorize;
use gfmlint_core::config::{apply_set_overrides, load_config_file};
use gfmlint_core::dispatch::RuleDispatcher;
use gfmlint_core::error::ConfigurationError;
use gfmlint_core::exit_codes::exit;
use gfmlint_core::rule::RuleConfig;
use gfmlint_core::rules::all_rules;
use gfmlint_core::scanner::SourceScanner;
use gfmlint_core::{output, tokenize};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

/// A GFM/CommonMark Markdown linter.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files or directories to scan. Pass `-` to read a single document
    /// from stdin.
    #[arg(required = true)]
    paths: Vec<String>,

    /// Rule ids or names to force-enable, comma-separated.
    #[arg(long, value_delimiter = ',')]
    enable_rules: Vec<String>,

    /// Rule ids or names to force-disable, comma-separated. Takes
    /// priority over `--enable-rules` for any rule named in both.
    #[arg(long, value_delimiter = ',')]
    disable_rules: Vec<String>,

    /// JSON document of `{rule_id: {key: value, ...}}`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// A single `rule_id.field=value` override. Repeatable.
    #[arg(long = "set")]
    set: Vec<String>,

    /// Abort with exit code 1 on any configuration error instead of
    /// logging a warning and falling back to built-in defaults.
    #[arg(long)]
    strict_config: bool,

    /// Increase log verbosity (also controlled by `RUST_LOG`).
    #[arg(short, long)]
    verbose: bool,
}

/// The enable/disable/per-rule-config state resolved from the CLI, already
/// validated once against `all_rules()` so later per-file dispatcher
/// construction can `expect` success.
struct ResolvedConfig {
    enable: HashSet<String>,
    disable: HashSet<String>,
    rules: HashMap<String, RuleConfig>,
}

impl ResolvedConfig {
    fn build_dispatcher(&self) -> RuleDispatcher {
        RuleDispatcher::new(all_rules(), &self.enable, &self.disable, &self.rules)
            .expect("already validated in resolve_config")
    }
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp(None).format_target(false);
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let resolved = match resolve_config(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("{}", config_error_line(&e.to_string()));
            exit::violations_found();
        }
    };

    let inputs = match discover_inputs(&cli.paths) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("{}", io_error_line(&e.to_string()));
            exit::tool_error();
        }
    };

    let results = lint_inputs(&resolved, &inputs);

    let mut had_io_error = false;
    let mut had_violations = false;
    let mut had_rule_error = false;
    for result in &results {
        match result {
            Ok(outcome) => {
                had_rule_error |= outcome.had_rule_error;
                if !outcome.report.is_empty() {
                    had_violations = true;
                    println!("{}", outcome.report);
                }
            }
            Err(detail) => {
                had_io_error = true;
                eprintln!("{}", io_error_line(detail));
            }
        }
    }

    if had_io_error {
        exit::tool_error();
    } else if had_violations || had_rule_error {
        exit::violations_found();
    } else {
        exit::success();
    }
}

#[cfg(feature = "color")]
fn config_error_line(detail: &str) -> String {
    format!("{}: {detail}", "Config error".red().bold())
}
#[cfg(not(feature = "color"))]
fn config_error_line(detail: &str) -> String {
    format!("Config error: {detail}")
}

#[cfg(feature = "color")]
fn io_error_line(detail: &str) -> String {
    format!("{}: {detail}", "Error".red().bold())
}
#[cfg(not(feature = "color"))]
fn io_error_line(detail: &str) -> String {
    format!("Error: {detail}")
}

/// Resolves `--enable-rules`/`--disable-rules`/`--config`/`--set` into a
/// [`ResolvedConfig`], validating it once against a throwaway dispatcher.
/// Outside `--strict-config`, any [`ConfigurationError`] raised while
/// loading the user's `--config`/`--set` values is logged and the whole
/// configuration is discarded in favor of every rule's built-in defaults,
/// so one bad override doesn't stop the tool from linting at all. A
/// `ConfigurationError` coming from rule *metadata* itself (an
/// `interface_version` mismatch) always aborts regardless of
/// `--strict-config`: that indicates a broken build, not a user typo.
fn resolve_config(cli: &Cli) -> Result<ResolvedConfig, ConfigurationError> {
    let enable: HashSet<String> = cli.enable_rules.iter().cloned().collect();
    let disable: HashSet<String> = cli.disable_rules.iter().cloned().collect();

    let rules = match load_user_config(cli) {
        Ok(rules) => rules,
        Err(e) if cli.strict_config => return Err(e),
        Err(e) => {
            log::warn!("ignoring invalid configuration ({e}); using rule defaults");
            HashMap::new()
        }
    };

    match RuleDispatcher::new(all_rules(), &enable, &disable, &rules) {
        Ok(_) => Ok(ResolvedConfig { enable, disable, rules }),
        Err(e) if cli.strict_config => Err(e),
        Err(e) => {
            log::warn!("ignoring invalid configuration ({e}); using rule defaults");
            let rules = HashMap::new();
            RuleDispatcher::new(all_rules(), &enable, &disable, &rules)?;
            Ok(ResolvedConfig { enable, disable, rules })
        }
    }
}

fn load_user_config(cli: &Cli) -> Result<HashMap<String, RuleConfig>, ConfigurationError> {
    let base = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => HashMap::new(),
    };
    apply_set_overrides(base, &cli.set)
}

enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn display_path(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }
}

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

fn discover_inputs(paths: &[String]) -> std::io::Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for raw in paths {
        if raw == "-" {
            inputs.push(Input::Stdin);
            continue;
        }
        let path = Path::new(raw);
        if path.is_dir() {
            for entry in ignore::WalkBuilder::new(path).build() {
                let entry = entry.map_err(std::io::Error::other)?;
                let entry_path = entry.path();
                if entry_path.is_file() && has_markdown_extension(entry_path) {
                    inputs.push(Input::File(entry_path.to_path_buf()));
                }
            }
        } else {
            inputs.push(Input::File(path.to_path_buf()));
        }
    }
    Ok(inputs)
}

fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_input(input: &Input) -> std::io::Result<String> {
    match input {
        Input::Stdin => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Input::File(path) => std::fs::read_to_string(path),
    }
}

/// A successfully-linted file's report text plus whether any rule raised a
/// `RuleExecutionError` while running (§7: a rule-execution error must
/// still surface as exit code 1 even when it produced zero violations).
struct FileReport {
    report: String,
    had_rule_error: bool,
}

/// `Ok(report)` on success (reading and dispatch both ran, however many
/// violations or rule errors resulted), `Err(display_path: detail)` on an
/// unreadable file or invalid UTF-8.
type FileOutcome = Result<FileReport, String>;

fn lint_one(resolved: &ResolvedConfig, input: &Input) -> FileOutcome {
    let path = input.display_path();
    let source = read_input(input).map_err(|e| format!("{path}: {e}"))?;

    let tokenized = tokenize(&source);
    let lines: Vec<&str> = SourceScanner::new(&source).map(|l| l.text).collect();

    let mut dispatcher = resolved.build_dispatcher();
    let (mut violations, errors) = dispatcher.run_file(&path, &lines, tokenized.tokens.as_slice(), &tokenized.registry);
    let had_rule_error = !errors.is_empty();
    for error in errors {
        log::warn!("{path}: {error}");
    }
    for anomaly in tokenized.anomalies {
        log::debug!("{path}: {anomaly}");
    }
    violations.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
    Ok(FileReport {
        report: output::format_report(&path, &violations),
        had_rule_error,
    })
}

#[cfg(feature = "parallel")]
fn lint_inputs(resolved: &ResolvedConfig, inputs: &[Input]) -> Vec<FileOutcome> {
    use rayon::prelude::*;

    if inputs.len() < 2 {
        return inputs.iter().map(|input| lint_one(resolved, input)).collect();
    }
    inputs.par_iter().map(|input| lint_one(resolved, input)).collect()
}

#[cfg(not(feature = "parallel"))]
fn lint_inputs(resolved: &ResolvedConfig, inputs: &[Input]) -> Vec<FileOutcome> {
    inputs.iter().map(|input| lint_one(resolved, input)).collect()
}
