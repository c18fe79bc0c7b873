use ansi_term::Colour::{Blue, Green, Red, Yellow};
use std::fmt;
use std::io::{self, Write};

const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";

pub fn info<T: fmt::Display>(msg: T) {
    println!("{} {}", Blue.bold().paint(ICON_INFO), msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{} {}", Green.bold().paint(ICON_OK), msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{} {}", Yellow.bold().paint(ICON_WARN), msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{} {}", Red.bold().paint(ICON_ERR), msg);
}

/// Rewrites the current stderr line with the week being crawled.
pub fn week_progress(week: u32) {
    eprint!("\r🗓️  Week: {week:>2}");
    io::stderr().flush().ok();
}

/// Ends a run of `week_progress` lines.
pub fn end_progress() {
    eprintln!();
}
