// scribe-cli: shared utilities for CLI tools.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use scribe_core::span;
use scribe_engine::{
    AggregatorConfig, AnalysisRequest, AnalysisRunner, DocumentSession, EngineConfig,
    ErrorPatternAggregator, FallbackProvider, PatternReport, ProviderSpec,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Configuration file name.
const CONFIG_FILE: &str = "scribe.toml";

/// Per-user configuration directory under `$HOME`.
const CONFIG_DIR: &str = ".scribe";

/// Separator printed after each reported suggestion.
pub const SEPARATOR: &str = "=================================================";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Find and load the engine configuration.
///
/// Search order:
/// 1. `config_path` argument (if provided; must exist)
/// 2. `SCRIBE_CONFIG` environment variable
/// 3. `~/.scribe/scribe.toml`
/// 4. `./scribe.toml`
///
/// Falls back to the built-in defaults when no file is found.
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig, String> {
    if let Some(p) = config_path {
        return EngineConfig::load(Path::new(p)).map_err(|e| e.to_string());
    }
    for path in build_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading configuration");
            return EngineConfig::load(&path).map_err(|e| e.to_string());
        }
    }
    Ok(EngineConfig::default())
}

fn build_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("SCRIBE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(CONFIG_DIR).join(CONFIG_FILE));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(CONFIG_FILE));
    }

    paths
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// The CLI tools only run the offline rule provider. Narrowing the rank
/// table to it lets a complete analysis be recognized.
pub fn offline_config(mut config: EngineConfig) -> EngineConfig {
    config.providers = vec![ProviderSpec::new(FallbackProvider::NAME, 0)];
    config
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Parse a `--config=PATH` or `-c PATH` argument from command line args.
///
/// Returns `(config_path, remaining_args)`.
pub fn parse_config_path(args: &[String]) -> Result<(Option<String>, Vec<String>), String> {
    take_value(args, "--config", "-c")
}

/// Remove `--NAME=VALUE`, `--NAME VALUE` or `SHORT VALUE` from `args`.
///
/// Returns `(value, remaining_args)`.
pub fn take_value(
    args: &[String],
    long: &str,
    short: &str,
) -> Result<(Option<String>, Vec<String>), String> {
    let mut value = None;
    let mut remaining = Vec::new();
    let mut iter = args.iter();
    let prefix = format!("{long}=");

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            value = Some(val.to_string());
        } else if arg == long || arg == short {
            match iter.next() {
                Some(val) => value = Some(val.clone()),
                None => return Err(format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    Ok((value, remaining))
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Install a stderr log subscriber filtered by `SCRIBE_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCRIBE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

pub fn read_stdin() -> String {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {e}")));
    input
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Open `text` in a session and run the fallback provider over it.
pub async fn analyze(text: &str, config: &EngineConfig) -> Result<DocumentSession, String> {
    let provider = FallbackProvider::with_rules(&config.fallback_rules)
        .map_err(|e| format!("invalid fallback rule: {e}"))?;
    let config = offline_config(config.clone());
    let runner = AnalysisRunner::new(Duration::from_millis(config.provider_timeout_ms))
        .with_provider(Arc::new(provider));

    let mut session = DocumentSession::new(text, config);
    if let AnalysisRequest::Issued(ticket) = session.begin_analysis(0) {
        runner.run_ticket(&mut session, &ticket).await;
    }
    Ok(session)
}

/// Print each live suggestion of `session` as a diff-able block.
pub fn write_suggestions(out: &mut impl Write, session: &DocumentSession) -> io::Result<()> {
    let text = session.store().chars();
    for s in session.suggestions() {
        let found = span::slice(text, s.span).unwrap_or_default();
        writeln!(out, "{}", session.text())?;
        writeln!(
            out,
            "E: {} {} (start={})",
            s.category,
            s.severity.label(),
            s.start()
        )?;
        writeln!(out, "E: \"{found}\"")?;
        writeln!(out, "S: \"{}\"", s.replacement_text)?;
        if !s.explanation.primary.is_empty() {
            writeln!(out, "   {}", s.explanation.to_delimited())?;
        }
        writeln!(out, "{SEPARATOR}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Statistics file
// ---------------------------------------------------------------------------

/// Load the aggregator persisted at `path`, or a fresh one if the file does
/// not exist yet.
pub fn load_aggregator(
    path: &Path,
    config: &AggregatorConfig,
) -> Result<ErrorPatternAggregator, String> {
    if !path.exists() {
        return Ok(ErrorPatternAggregator::new(config));
    }
    let report = read_report(path)?;
    Ok(ErrorPatternAggregator::from_report(report, config))
}

pub fn read_report(path: &Path) -> Result<PatternReport, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

pub fn save_report(path: &Path, report: &PatternReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("failed to serialize statistics: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

/// Human-readable report.
pub fn write_report(out: &mut impl Write, report: &PatternReport) -> io::Result<()> {
    writeln!(out, "Overall accuracy: {:.1}%", report.overall_accuracy)?;
    writeln!(out, "Errors recorded: {}", report.total_errors)?;
    if let Some(area) = report.most_problematic_area {
        writeln!(out, "Most problematic area: {area}")?;
    }
    if let Some(area) = report.strongest_area {
        writeln!(out, "Strongest area: {area}")?;
    }
    let e = &report.engagement;
    writeln!(
        out,
        "Suggestions shown: {}, accepted: {}, dismissed: {}",
        e.shown, e.accepted, e.dismissed
    )?;
    writeln!(out)?;

    for area in report.areas.iter().filter(|a| a.opportunities > 0) {
        writeln!(
            out,
            "{:<24} {:>6.1}%  ({} errors / {} opportunities)",
            area.area.label(),
            area.accuracy,
            area.errors,
            area.opportunities
        )?;
        for p in report
            .patterns
            .iter()
            .filter(|p| p.area == area.area && p.count > 0)
        {
            let examples = p.examples.join(", ");
            writeln!(out, "  {:<30} {:>4}  e.g. {examples}", p.subcategory, p.count)?;
        }
    }
    Ok(())
}
