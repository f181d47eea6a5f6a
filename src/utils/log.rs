// src/utils/log.rs

//! Operator-facing progress output for commands.
//!
//! Library diagnostics go through the `log` facade. These helpers print the
//! run's headline steps and summaries, filtered by the configured level.
//! Info lines go to stdout, everything else to stderr.

use std::sync::OnceLock;

use chrono::Local;
use log::{Level, LevelFilter};

static CONSOLE_LEVEL: OnceLock<LevelFilter> = OnceLock::new();

/// Set the console level from a config string (`"debug"`, `"warn"`, ...).
/// Unknown values mean info. Only the first call has an effect.
pub fn init(level: &str) {
    let _ = CONSOLE_LEVEL.set(parse_level(level));
}

fn parse_level(level: &str) -> LevelFilter {
    match level.trim() {
        l if l.eq_ignore_ascii_case("warning") => LevelFilter::Warn,
        l => l.parse().unwrap_or(LevelFilter::Info),
    }
}

fn enabled(level: Level) -> bool {
    level <= CONSOLE_LEVEL.get().copied().unwrap_or(LevelFilter::Info)
}

fn line(level: Level, message: &str) -> String {
    format!("{} {:<5} {}", Local::now().format("%H:%M:%S"), level, message)
}

fn emit(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    match level {
        Level::Info => println!("{}", line(level, message)),
        _ => eprintln!("{}", line(level, message)),
    }
}

pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn info(message: &str) {
    emit(Level::Info, message);
}

pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

pub fn error(message: &str) {
    emit(Level::Error, message);
}

/// Printed regardless of the console level.
pub fn success(message: &str) {
    println!("{}", line(Level::Info, &format!("ok: {message}")));
}

/// `[2/4] message`
pub fn step(step_num: usize, total: usize, message: &str) {
    emit(Level::Info, &format!("[{step_num}/{total}] {message}"));
}

pub fn header(title: &str) {
    if enabled(Level::Info) {
        println!();
        println!("{}", line(Level::Info, &format!("resale-feed | {title}")));
    }
}

pub fn sub_item(message: &str) {
    emit(Level::Info, &format!("  - {message}"));
}

/// Key/value block with keys padded to a common width.
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled(Level::Info) {
        println!();
        for row in render_summary(title, items) {
            println!("{}", line(Level::Info, &row));
        }
    }
}

fn render_summary(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(items.len() + 1);
    rows.push(format!("{title}:"));
    for (key, value) in items {
        let pad = width - key.chars().count();
        rows.push(format!("  {key}{} : {value}", " ".repeat(pad)));
    }
    rows
}
