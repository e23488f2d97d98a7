//! The two runs and the pieces they are built from.
//!
//! `get_comments` resolves references, fetches every comment, and flattens
//! them into the workbook's comment sheet. `respond` reads that sheet back
//! and posts the replies users typed into it.

pub mod backref;
pub mod fetch;
pub mod flatten;
pub mod get_comments;
pub mod resolve;
pub mod respond;
pub mod show;

use serde::{Deserialize, Serialize};

/// Marker written in place of a missing comment author.
pub const DEFAULT_EXTERNAL_AUTHOR: &str = "External User";

/// How a run reacts to a failed document or row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Record the failure and keep going.
    #[default]
    Lenient,
    /// Abort the run on the first failure.
    Strict,
}

impl RunMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            RunMode::Strict
        } else {
            RunMode::Lenient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: RunMode,
    pub external_author: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            external_author: DEFAULT_EXTERNAL_AUTHOR.to_string(),
        }
    }
}

impl RunOptions {
    pub fn strict() -> Self {
        Self {
            mode: RunMode::Strict,
            ..Default::default()
        }
    }
}

/// One document or row that a lenient run skipped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub subject: String,
    pub message: String,
}

impl RunFailure {
    pub fn new(subject: impl Into<String>, error: &impl std::fmt::Display) -> Self {
        Self {
            subject: subject.into(),
            message: error.to_string(),
        }
    }
}

/// Render failures as a bulleted block, or nothing.
pub fn format_failures(failures: &[RunFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let lines = failures
        .iter()
        .map(|f| format!("  - {}: {}", f.subject, f.message))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\nFailures ({}):\n{}\n", failures.len(), lines)
}
