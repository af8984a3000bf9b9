//! Terminal helpers for the question loop

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use certvec_core::{DatasetProfile, Result};

use crate::qa::{Answer, EXIT_KEYWORD};

const PROMPT: &str = "certvec>";

/// Display the startup banner
pub fn display_banner(profile: DatasetProfile) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(60, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let lines = [
        "certvec - Azure vector search assistant".to_string(),
        String::new(),
        format!("Dataset: {}", profile),
        format!("Index:   {}", profile.index_name()),
    ];
    for line in lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            let padding = banner_width.saturating_sub(line.chars().count() + 4);
            println!("{}", format!("│  {}{}│", line, " ".repeat(padding)).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        format!("Ask a question, 'help' for commands, or '{}' to quit", EXIT_KEYWORD).dimmed()
    );
    println!();
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask about Azure services or certifications", "question".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", EXIT_KEYWORD.green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  Which service should I use to run serverless code?");
    println!("  What do I need to know for AZ-204?");
}

/// Print an answer followed by the documents it was grounded on
pub fn print_answer(answer: &Answer) {
    println!();
    println!("{}", answer.text);
    println!();
    if answer.hits.is_empty() {
        println!("{}", "No matching documents were found.".dimmed());
        return;
    }
    println!("{}", "Sources:".dimmed());
    for hit in &answer.hits {
        let label = ["title", "certification_name", "service_name"]
            .iter()
            .find_map(|field| hit.document.text(field).ok())
            .or_else(|| hit.document.id())
            .unwrap_or("document");
        println!("  {} {} ({:.3})", "•".dimmed(), label.dimmed(), hit.score);
    }
    println!();
}

/// Restores cooked mode when the prompt returns, including on error
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn redraw(input: &str) -> Result<()> {
    print!("\r{} {}  \r{} {}", PROMPT.green().bold(), " ".repeat(50), PROMPT.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

/// Read one line with history navigation.
///
/// Returns `None` at end of input or on Ctrl-C/Ctrl-D.
pub fn read_prompt(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    let guard = RawModeGuard::enable()?;
    let mut input = String::new();
    let mut history_index: Option<usize> = None;
    let mut cursor_pos = 0;

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    loop {
        if let Event::Key(key_event) = event::read()? {
            match key_event.code {
                KeyCode::Enter => {
                    drop(guard);
                    println!();
                    let input = input.trim().to_string();
                    if !input.is_empty() {
                        history.push(input.clone());
                    }
                    return Ok(Some(input));
                }
                KeyCode::Char('c') | KeyCode::Char('d')
                    if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    drop(guard);
                    println!();
                    return Ok(None);
                }
                KeyCode::Char(c) => {
                    input.insert(cursor_pos, c);
                    cursor_pos += c.len_utf8();
                    redraw(&input)?;
                }
                KeyCode::Backspace => {
                    if let Some(c) = input[..cursor_pos].chars().next_back() {
                        cursor_pos -= c.len_utf8();
                        input.remove(cursor_pos);
                        redraw(&input)?;
                    }
                }
                KeyCode::Up => {
                    if !history.is_empty() {
                        let new_index = match history_index {
                            None => history.len() - 1,
                            Some(idx) if idx > 0 => idx - 1,
                            Some(idx) => idx,
                        };
                        history_index = Some(new_index);
                        input = history[new_index].clone();
                        cursor_pos = input.len();
                        redraw(&input)?;
                    }
                }
                KeyCode::Down => {
                    if let Some(idx) = history_index {
                        if idx + 1 < history.len() {
                            history_index = Some(idx + 1);
                            input = history[idx + 1].clone();
                        } else {
                            history_index = None;
                            input.clear();
                        }
                        cursor_pos = input.len();
                        redraw(&input)?;
                    }
                }
                KeyCode::Esc => {
                    drop(guard);
                    println!();
                    return Ok(Some(String::new()));
                }
                _ => {}
            }
        }
    }
}
