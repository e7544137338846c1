// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive source picker shown when no short code is given.

use colored::Colorize;
use courier_config::{ALL_SOURCES_CODE, CourierConfig};
use courier_core::CourierError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// What the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// A short code (or `all`), possibly one that does not exist.
    Code(String),
    Quit,
}

/// Maps a menu answer to a choice: a number picks from the list, anything
/// else is taken as a short code.
pub fn interpret(config: &CourierConfig, answer: &str) -> Choice {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") || answer == "quit" {
        return Choice::Quit;
    }
    if let Ok(index) = answer.parse::<usize>() {
        if index == 0 {
            return Choice::Code(ALL_SOURCES_CODE.to_string());
        }
        if let Some(source) = config.sources.get(index - 1) {
            return Choice::Code(source.short_code.clone());
        }
    }
    Choice::Code(answer.to_string())
}

/// Shows a numbered menu and reads one answer.
pub fn choose(config: &CourierConfig) -> Result<Choice, CourierError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| CourierError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "courier".bold().green());
    for (i, source) in config.sources.iter().enumerate() {
        println!("  {:>2}) {} {}", i + 1, source.short_code.bold(), source.name.dimmed());
    }
    println!("  {:>2}) {}", 0, ALL_SOURCES_CODE.bold());
    println!("Enter a number or short code, {} to quit.", "q".yellow());

    match rl.readline(&format!("{}> ", "courier".green())) {
        Ok(line) => Ok(interpret(config, &line)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(Choice::Quit),
        Err(e) => Err(CourierError::Internal(format!("failed to read selection: {e}"))),
    }
}
