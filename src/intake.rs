// src/intake.rs
//! Idea intake: one submitted block of text becomes one card per non-empty line.

use serde::Deserialize;

use crate::card::{VideoCard, WorkflowStage};
use crate::categorizer::Categorizer;

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeRequest {
    pub text: String,
    /// Column to drop the new cards into; defaults to the backlog.
    #[serde(default)]
    pub status: Option<WorkflowStage>,
}

/// Trimmed, non-empty lines in input order.
pub fn split_ideas(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

pub fn intake(categorizer: &Categorizer, req: &IntakeRequest) -> Vec<VideoCard> {
    split_ideas(&req.text)
        .map(|line| {
            let mut card = categorizer.categorize(line);
            if let Some(status) = req.status {
                card.status = status;
            }
            card
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_padded_lines() {
        let lines: Vec<&str> = split_ideas("  first \n\n\t\r\nsecond\r\n   ").collect();
        assert_eq!(lines, vec!["first", "second"]);
    }
}
