//! End-of-session statistics and breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{levels, ResponseRecord, TerminationReason};
use crate::scoring::{Diagnostics, StrategyKind};

/// Correct/incorrect counts for a group of responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    /// Percentage correct, one decimal. Zero for an empty group.
    pub percent_correct: f64,
}

impl OutcomeTally {
    fn record(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.percent_correct = percent(self.correct, self.total);
    }
}

/// Percentage rounded to one decimal; zero when `total` is zero.
pub fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Tallies for levels 1–5. Every level is present, zero-filled if unused.
pub fn breakdown_by_level(responses: &[ResponseRecord]) -> BTreeMap<u8, OutcomeTally> {
    let mut by_level: BTreeMap<u8, OutcomeTally> =
        levels().map(|level| (level, OutcomeTally::default())).collect();
    for r in responses {
        by_level.entry(r.difficulty).or_default().record(r.is_correct);
    }
    by_level
}

/// Tallies for the categories that actually appear in `responses`.
pub fn breakdown_by_category(responses: &[ResponseRecord]) -> BTreeMap<String, OutcomeTally> {
    let mut by_category: BTreeMap<String, OutcomeTally> = BTreeMap::new();
    for r in responses {
        by_category
            .entry(r.category.clone())
            .or_default()
            .record(r.is_correct);
    }
    by_category
}

/// `max − min` over the last `window` scores, or `None` if the history is
/// shorter than the window.
pub fn recent_score_range(history: &[f64], window: usize) -> Option<f64> {
    if window == 0 || history.len() < window {
        return None;
    }
    let recent = &history[history.len() - window..];
    let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
    Some(max - min)
}

/// Everything handed outward when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalStatistics {
    pub strategy: StrategyKind,
    pub answered: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub percent_correct: f64,
    /// Final grade from the strategy's `score`, two decimals.
    pub final_score: f64,
    /// The engine's level after the last answer.
    pub final_difficulty: u8,
    /// Running grade after each answer.
    pub score_history: Vec<f64>,
    pub diagnostics: Diagnostics,
    pub by_level: BTreeMap<u8, OutcomeTally>,
    pub by_category: BTreeMap<String, OutcomeTally>,
    /// Engine level at the moment each item was posed.
    pub difficulty_progression: Vec<u8>,
    /// Answered item ids in order.
    pub item_ids: Vec<String>,
    pub termination_reason: TerminationReason,
}
