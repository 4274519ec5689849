//! Elo-style rating scorer.
//!
//! Each answered item is a match against an opponent whose rating is derived
//! from the item's level. Updates are applied in response order.

use serde::{Deserialize, Serialize};

use super::{round_to, Diagnostics, Scorer, MAX_SCORE, MIN_SCORE};
use crate::model::ResponseRecord;

pub const DEFAULT_K_FACTOR: f64 = 32.0;
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Opponent rating of a level-1 item.
const BASE_ITEM_RATING: f64 = 1200.0;
/// Opponent rating added per level above 1.
const RATING_PER_LEVEL: f64 = 150.0;

/// Opponent rating for an item of the given level (1 ⇒ 1200 … 5 ⇒ 1800).
pub fn item_rating(difficulty: u8) -> f64 {
    BASE_ITEM_RATING + (difficulty as f64 - 1.0) * RATING_PER_LEVEL
}

/// Expected outcome for `student_rating` against `item_rating`.
pub fn expected_score(student_rating: f64, item_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((item_rating - student_rating) / 400.0))
}

/// Piecewise-linear map from rating to grade.
///
/// 900–1200 ⇒ 0–1, 1200–1800 ⇒ 1–5, and above 1800 the slope continues past
/// 5 (callers clamp). Below 900 the grade floors at 0.
pub fn rating_to_score(rating: f64) -> f64 {
    if rating < 1200.0 {
        ((rating - 900.0) / 300.0).max(MIN_SCORE)
    } else if rating > 1800.0 {
        MAX_SCORE + (rating - 1800.0) / 200.0
    } else {
        1.0 + (rating - 1200.0) / 600.0 * 4.0
    }
}

/// Elo diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloDiagnostics {
    pub rating: f64,
    /// Net change from the initial rating.
    pub rating_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EloScorer {
    k_factor: f64,
    initial_rating: f64,
}

impl Default for EloScorer {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

impl EloScorer {
    pub fn new(k_factor: f64, initial_rating: f64) -> Self {
        Self {
            k_factor,
            initial_rating,
        }
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    pub fn initial_rating(&self) -> f64 {
        self.initial_rating
    }

    /// Rating after replaying `responses` in order.
    pub fn final_rating(&self, responses: &[ResponseRecord]) -> f64 {
        responses.iter().fold(self.initial_rating, |rating, r| {
            let expected = expected_score(rating, item_rating(r.difficulty));
            let outcome = if r.is_correct { 1.0 } else { 0.0 };
            rating + self.k_factor * (outcome - expected)
        })
    }

    pub fn elo_diagnostics(&self, responses: &[ResponseRecord]) -> EloDiagnostics {
        let rating = self.final_rating(responses);
        EloDiagnostics {
            rating: round_to(rating, 1),
            rating_change: round_to(rating - self.initial_rating, 1),
        }
    }
}

impl Scorer for EloScorer {
    fn score(&self, responses: &[ResponseRecord]) -> f64 {
        rating_to_score(self.final_rating(responses)).clamp(MIN_SCORE, MAX_SCORE)
    }

    fn diagnostics(&self, responses: &[ResponseRecord]) -> Diagnostics {
        Diagnostics::Elo(self.elo_diagnostics(responses))
    }
}
