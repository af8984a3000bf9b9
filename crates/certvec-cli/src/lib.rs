//! Interactive question loop for certvec
//!
//! Retrieval-augmented answers over an indexed dataset, plus the terminal
//! and logging helpers the binary uses.

mod qa;
mod telemetry;
mod ui;

#[cfg(test)]
mod tests;

pub use qa::{Answer, QaSession, SYSTEM_PROMPT, build_messages, is_exit_keyword, render_hit};
pub use telemetry::init_tracing;
pub use ui::{display_banner, print_answer, print_help, read_prompt};

// Re-export core types
pub use certvec_core::{Error, Result};
