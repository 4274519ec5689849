//! One-parameter logistic IRT scorer.
//!
//! Ability θ is estimated by Newton-Raphson maximum likelihood and mapped
//! linearly onto the 0–5 grade scale.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{round_to, Diagnostics, Scorer, MAX_SCORE, MIN_SCORE};
use crate::model::ResponseRecord;

/// Default Newton-Raphson iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Estimation clamp for θ.
pub const THETA_MIN: f64 = -3.0;
pub const THETA_MAX: f64 = 3.0;

/// θ range mapped onto the grade scale; values outside are clamped.
pub const EFFECTIVE_THETA_MIN: f64 = -2.0;
pub const EFFECTIVE_THETA_MAX: f64 = 2.5;

/// Logit units per difficulty level, centred on level 3.
const LEVEL_SCALE: f64 = 0.8;
const PROBABILITY_FLOOR: f64 = 0.001;
const PROBABILITY_CEIL: f64 = 0.999;
const CONVERGENCE_STEP: f64 = 0.01;
const FLAT_CURVATURE: f64 = 0.001;

/// Map a 1–5 difficulty level onto the logit scale (level 3 ⇒ 0).
pub fn item_location(difficulty: u8) -> f64 {
    (difficulty as f64 - 3.0) * LEVEL_SCALE
}

/// P(correct) for ability `theta` against an item of the given level.
pub fn probability_correct(theta: f64, difficulty: u8) -> f64 {
    1.0 / (1.0 + (-(theta - item_location(difficulty))).exp())
}

/// Map θ onto the grade scale, rounded to two decimals.
pub fn theta_to_score(theta: f64) -> f64 {
    let limited = theta.clamp(EFFECTIVE_THETA_MIN, EFFECTIVE_THETA_MAX);
    let score = (limited - EFFECTIVE_THETA_MIN) / (EFFECTIVE_THETA_MAX - EFFECTIVE_THETA_MIN)
        * MAX_SCORE;
    round_to(score.clamp(MIN_SCORE, MAX_SCORE), 2)
}

/// Qualitative ability band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    /// No responses yet.
    Unrated,
    Basic,
    Foundational,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn from_theta(theta: f64) -> Self {
        if theta < -1.5 {
            SkillLevel::Basic
        } else if theta < -0.5 {
            SkillLevel::Foundational
        } else if theta < 0.5 {
            SkillLevel::Intermediate
        } else if theta < 1.5 {
            SkillLevel::Advanced
        } else {
            SkillLevel::Expert
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkillLevel::Unrated => "Unrated",
            SkillLevel::Basic => "Basic",
            SkillLevel::Foundational => "Foundational",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        };
        f.write_str(label)
    }
}

/// IRT diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrtDiagnostics {
    pub theta: f64,
    /// 1 − mean |P(correct) − outcome|; 1 means the model fits perfectly.
    pub consistency: f64,
    pub skill_level: SkillLevel,
}

/// Simplified IRT scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct IrtScorer {
    max_iterations: u32,
}

impl Default for IrtScorer {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl IrtScorer {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Maximum-likelihood θ, starting from 0. Empty history yields 0.
    pub fn estimate_theta(&self, responses: &[ResponseRecord]) -> f64 {
        self.estimate_theta_trace(responses)
            .last()
            .copied()
            .unwrap_or(0.0)
    }

    /// Every θ visited by the Newton-Raphson iteration, starting with the
    /// initial 0.0.
    pub fn estimate_theta_trace(&self, responses: &[ResponseRecord]) -> Vec<f64> {
        let mut theta = 0.0;
        let mut trace = vec![theta];
        if responses.is_empty() {
            return trace;
        }

        for _ in 0..self.max_iterations {
            let (gradient, curvature) = responses.iter().fold((0.0, 0.0), |(g, h), r| {
                let p = probability_correct(theta, r.difficulty)
                    .clamp(PROBABILITY_FLOOR, PROBABILITY_CEIL);
                let g = if r.is_correct { g + (1.0 - p) } else { g - p };
                (g, h - p * (1.0 - p))
            });

            // Flat likelihood: no further correction possible.
            if curvature.abs() < FLAT_CURVATURE {
                break;
            }

            let next = (theta - gradient / curvature).clamp(THETA_MIN, THETA_MAX);
            let step = (next - theta).abs();
            theta = next;
            trace.push(theta);
            if step < CONVERGENCE_STEP {
                break;
            }
        }

        trace
    }

    /// Fit between the estimated θ and the observed outcomes, in `[0, 1]`.
    pub fn consistency(&self, responses: &[ResponseRecord], theta: f64) -> f64 {
        if responses.is_empty() {
            return 0.0;
        }
        let total_error: f64 = responses
            .iter()
            .map(|r| {
                let observed = if r.is_correct { 1.0 } else { 0.0 };
                (probability_correct(theta, r.difficulty) - observed).abs()
            })
            .sum();
        (1.0 - total_error / responses.len() as f64).clamp(0.0, 1.0)
    }

    pub fn irt_diagnostics(&self, responses: &[ResponseRecord]) -> IrtDiagnostics {
        if responses.is_empty() {
            return IrtDiagnostics {
                theta: 0.0,
                consistency: 0.0,
                skill_level: SkillLevel::Unrated,
            };
        }
        let theta = self.estimate_theta(responses);
        IrtDiagnostics {
            theta: round_to(theta, 3),
            consistency: round_to(self.consistency(responses, theta), 3),
            skill_level: SkillLevel::from_theta(theta),
        }
    }
}

impl Scorer for IrtScorer {
    fn score(&self, responses: &[ResponseRecord]) -> f64 {
        theta_to_score(self.estimate_theta(responses))
    }

    fn diagnostics(&self, responses: &[ResponseRecord]) -> Diagnostics {
        Diagnostics::Irt(self.irt_diagnostics(responses))
    }
}
