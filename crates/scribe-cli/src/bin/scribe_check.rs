// scribe-check: Report writing suggestions for text read from stdin.
//
// Each paragraph is analyzed independently by the offline rule provider and
// every live suggestion is printed in a diff-able block.
//
// Usage:
//   scribe-check [-c CONFIG] [OPTIONS]
//
// Options:
//   -c, --config PATH   Engine configuration (TOML)
//   --empty-line        Paragraphs are separated by empty lines
//                       (default: each line is a paragraph)
//   -h, --help          Print help

use std::io::{self, Write};

use scribe_engine::EngineConfig;

async fn handle_paragraph(paragraph: &str, config: &EngineConfig, out: &mut impl Write) {
    let session = scribe_cli::analyze(paragraph, config)
        .await
        .unwrap_or_else(|e| scribe_cli::fatal(&e));
    if let Err(e) = scribe_cli::write_suggestions(out, &session) {
        scribe_cli::fatal(&format!("failed to write output: {e}"));
    }
}

/// Split `input` into paragraphs: one per non-empty line, or blocks of lines
/// separated by empty lines.
fn paragraphs(input: &str, empty_line_separates: bool) -> Vec<String> {
    if !empty_line_separates {
        return input
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }
    let mut out = Vec::new();
    let mut paragraph = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !paragraph.is_empty() {
                out.push(std::mem::take(&mut paragraph));
            }
            continue;
        }
        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(trimmed);
    }
    if !paragraph.is_empty() {
        out.push(paragraph);
    }
    out
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, args) =
        scribe_cli::parse_config_path(&args).unwrap_or_else(|e| scribe_cli::fatal(&e));

    if scribe_cli::wants_help(&args) {
        println!("scribe-check: Report writing suggestions.");
        println!();
        println!("Usage: scribe-check [-c CONFIG] [OPTIONS]");
        println!();
        println!("Checks text read from stdin and prints suggestions.");
        println!("Normally paragraphs are separated by line feeds. Use option");
        println!("--empty-line if paragraphs are separated by empty lines.");
        println!();
        println!("Options:");
        println!("  -c, --config PATH   Engine configuration (TOML)");
        println!("  --empty-line        Paragraphs separated by empty lines");
        println!("  -h, --help          Print this help");
        return;
    }

    scribe_cli::init_tracing();
    let empty_line_separates = args.iter().any(|a| a == "--empty-line");
    let config =
        scribe_cli::load_config(config_path.as_deref()).unwrap_or_else(|e| scribe_cli::fatal(&e));

    let input = scribe_cli::read_stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for paragraph in paragraphs(&input, empty_line_separates) {
        handle_paragraph(&paragraph, &config, &mut out).await;
    }
}
