//! Shared CLI output helpers for consistent operator-facing text.
//!
//! Human output goes to stdout with colored status symbols; `--json` swaps
//! every helper for one JSON object per line so the commands can be
//! scripted.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::{OwoColorize, Stream};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

static OUTPUT_CONFIG: OnceLock<OutputConfig> = OnceLock::new();

fn read_config() -> OutputConfig {
    OUTPUT_CONFIG.get().copied().unwrap_or_default()
}

/// Apply output settings from global CLI flags. Only the first call counts.
pub fn configure(config: OutputConfig) {
    let _ = OUTPUT_CONFIG.set(config);
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!("{}", json!({ "type": kind, "payload": payload }));
}

fn suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    let config = read_config();
    if config.json || suppressed(config) {
        return;
    }
    println!(
        "{} {}",
        "factionkeep".if_supports_color(Stream::Stdout, |t| t.bold()),
        version.if_supports_color(Stream::Stdout, |t| t.dimmed())
    );
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();
    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if suppressed(config) {
        return;
    }
    println!();
    println!("{}", title.if_supports_color(Stream::Stdout, |t| t.bold()));
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();
    if config.json {
        emit_json_line("field", json!({ "label": label, "value": value }));
        return;
    }
    if suppressed(config) {
        return;
    }
    println!(
        "  {:<16} {}",
        label.if_supports_color(Stream::Stdout, |t| t.dimmed()),
        value
    );
}

/// Print a success line.
pub fn success(message: &str) {
    let config = read_config();
    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if suppressed(config) {
        return;
    }
    println!(
        "  {} {}",
        "✓".if_supports_color(Stream::Stdout, |t| t.green()),
        message
    );
}

/// Print a warning line. Shown even in quiet mode.
pub fn warning(message: &str) {
    if is_json() {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }
    println!(
        "  {} {}",
        "⚠".if_supports_color(Stream::Stdout, |t| t.yellow()),
        message
    );
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
        return;
    }
    eprintln!(
        "  {} {}",
        "×".if_supports_color(Stream::Stderr, |t| t.red()),
        message
    );
}

/// Print a dimmed note.
pub fn note(message: &str) {
    let config = read_config();
    if config.json || suppressed(config) {
        return;
    }
    println!(
        "  {}",
        message.if_supports_color(Stream::Stdout, |t| t.dimmed())
    );
}

/// Format a value for emphasis.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    value
        .if_supports_color(Stream::Stdout, |t| t.cyan())
        .to_string()
}

/// Print rows as an indented table, or as a JSON array in `--json` mode.
pub fn table<T>(kind: &str, rows: Vec<T>, json_rows: Vec<serde_json::Value>)
where
    T: Tabled,
{
    let config = read_config();
    if config.json {
        emit_json_line(kind, serde_json::Value::Array(json_rows));
        return;
    }
    if suppressed(config) {
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for line in table.to_string().lines() {
        println!("  {line}");
    }
}
