// scribe-stats: Print a persisted error pattern report.
//
// Usage:
//   scribe-stats [--json] PATH
//
// Options:
//   --json       Print the report as JSON
//   -h, --help   Print help

use std::io;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if scribe_cli::wants_help(&args) {
        println!("scribe-stats: Print an error pattern report.");
        println!();
        println!("Usage: scribe-stats [--json] PATH");
        println!();
        println!("PATH is a statistics file written by scribe-fix --stats.");
        println!();
        println!("Options:");
        println!("  --json       Print the report as JSON");
        println!("  -h, --help   Print this help");
        return;
    }

    scribe_cli::init_tracing();
    let json = args.iter().any(|a| a == "--json");
    let Some(path) = args.iter().find(|a| !a.starts_with('-')) else {
        scribe_cli::fatal("missing statistics file (see --help)");
    };

    let report = scribe_cli::read_report(Path::new(path)).unwrap_or_else(|e| scribe_cli::fatal(&e));
    if json {
        let text = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| scribe_cli::fatal(&format!("failed to serialize report: {e}")));
        println!("{text}");
        return;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = scribe_cli::write_report(&mut out, &report) {
        scribe_cli::fatal(&format!("failed to write output: {e}"));
    }
}
