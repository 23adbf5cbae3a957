//! Terminal output for the CLI.
//!
//! Every helper has a human rendering and a JSON-lines rendering
//! (`{"type": ..., "payload": ...}`) selected by the global `--json` flag.
//! `--quiet` drops regular lines but keeps warnings and errors.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

/// Output flags shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    /// 0 = normal, 1+ = increasingly verbose.
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn current() -> OutputConfig {
    let cell = OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()));
    match cell.read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    let cell = OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()));
    match cell.write() {
        Ok(mut slot) => *slot = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

#[must_use]
pub fn is_json() -> bool {
    current().json
}

/// Number of `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Channel {
    /// Stdout, hidden by `--quiet`.
    Regular,
    /// Stdout, shown even with `--quiet`.
    Notice,
    /// Stderr, always shown.
    Error,
}

fn emit(channel: Channel, kind: &str, payload: Value, human: impl FnOnce() -> String) {
    let config = current();
    if config.json {
        let line = json!({ "type": kind, "payload": payload });
        if channel == Channel::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        return;
    }
    match channel {
        Channel::Regular if config.quiet => {}
        Channel::Regular | Channel::Notice => println!("{}", human()),
        Channel::Error => eprintln!("{}", human()),
    }
}

/// Program name and version, followed by a blank line.
pub fn header(version: &str) {
    emit(
        Channel::Regular,
        "header",
        json!({ "app": "armada", "version": version }),
        || format!("{} {}\n", "armada".bold(), version.dimmed()),
    );
}

/// Labeled value in the aligned key column.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        Channel::Regular,
        "field",
        json!({ "label": label, "value": value }),
        || format!("  {:<14} {}", label.dimmed(), value),
    );
}

pub fn success(message: &str) {
    emit(Channel::Regular, "success", json!({ "message": message }), || {
        format!("  {} {message}", "✓".green())
    });
}

pub fn warning(message: &str) {
    emit(Channel::Notice, "warning", json!({ "message": message }), || {
        format!("  {} {message}", "⚠".yellow())
    });
}

pub fn error(message: &str) {
    emit(Channel::Error, "error", json!({ "message": message }), || {
        format!("  {} {message}", "×".red())
    });
}

pub fn section(title: &str) {
    emit(Channel::Regular, "section", json!({ "title": title }), || {
        format!("\n{}", title.bold())
    });
}

pub fn hint(message: &str) {
    emit(Channel::Regular, "hint", json!({ "message": message }), || {
        format!("  {}: {}", "hint".cyan().dimmed(), message.dimmed())
    });
}

/// Indented block, e.g. a rendered table.
pub fn lines(content: &str) {
    emit(Channel::Regular, "lines", json!({ "content": content }), || {
        content
            .lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    });
}

/// Print a complete JSON document as-is.
pub fn json_output(value: Value) {
    println!("{value}");
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Bar over `len` agents; hidden in JSON or quiet mode.
pub fn progress(len: u64, message: &str) -> ProgressBar {
    let config = current();
    if config.json || config.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .tick_strings(SPINNER)
        .template("  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("━╸─"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn progress_success(pb: &ProgressBar, message: &str) {
    pb.finish_and_clear();
    if !is_json() {
        success(message);
    }
}

pub fn progress_fail(pb: &ProgressBar, message: &str) {
    pb.finish_and_clear();
    if !is_json() {
        error(message);
    }
}

fn paint(value: impl Display, style: impl FnOnce(&str) -> String) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        style(&value)
    }
}

pub fn positive(value: impl Display) -> String {
    paint(value, |v| v.green().to_string())
}

pub fn negative(value: impl Display) -> String {
    paint(value, |v| v.red().to_string())
}

pub fn highlight(value: impl Display) -> String {
    paint(value, |v| v.cyan().to_string())
}
