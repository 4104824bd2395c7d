// scribe-fix: Apply every suggestion to text read from stdin.
//
// The corrected text is written to stdout. With --stats, accepted fixes and
// the opportunities of the input are added to a persisted error pattern
// report.
//
// Usage:
//   scribe-fix [-c CONFIG] [--stats PATH]
//
// Options:
//   -c, --config PATH   Engine configuration (TOML)
//   -s, --stats PATH    Statistics file (JSON) to update
//   -h, --help          Print help

use std::io::{self, Write};
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, args) =
        scribe_cli::parse_config_path(&args).unwrap_or_else(|e| scribe_cli::fatal(&e));
    let (stats_path, args) = scribe_cli::take_value(&args, "--stats", "-s")
        .unwrap_or_else(|e| scribe_cli::fatal(&e));

    if scribe_cli::wants_help(&args) {
        println!("scribe-fix: Apply every suggestion to text.");
        println!();
        println!("Usage: scribe-fix [-c CONFIG] [--stats PATH]");
        println!();
        println!("Reads text from stdin and prints the corrected text.");
        println!();
        println!("Options:");
        println!("  -c, --config PATH   Engine configuration (TOML)");
        println!("  -s, --stats PATH    Statistics file (JSON) to update");
        println!("  -h, --help          Print this help");
        return;
    }

    scribe_cli::init_tracing();
    let config =
        scribe_cli::load_config(config_path.as_deref()).unwrap_or_else(|e| scribe_cli::fatal(&e));
    let input = scribe_cli::read_stdin();

    let mut session = scribe_cli::analyze(&input, &config)
        .await
        .unwrap_or_else(|e| scribe_cli::fatal(&e));
    let outcome = session.accept_all();
    if !outcome.skipped.is_empty() {
        eprintln!("warning: {} suggestion(s) could not be applied", outcome.skipped.len());
    }

    if let Some(path) = stats_path.map(PathBuf::from) {
        let mut aggregator = scribe_cli::load_aggregator(&path, &config.aggregator)
            .unwrap_or_else(|e| scribe_cli::fatal(&e));
        aggregator.record_text_opportunities(&input);
        aggregator.observe_all(&session.take_events());
        scribe_cli::save_report(&path, &aggregator.snapshot())
            .unwrap_or_else(|e| scribe_cli::fatal(&e));
    }

    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(session.text().as_bytes()) {
        scribe_cli::fatal(&format!("failed to write output: {e}"));
    }
}
