//! Exam configuration.
//!
//! The on-disk layout is a TOML file with `[exam]`, `[parameters]` and
//! `[scoring]` sections; see [`crate::loader::load_config`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::model::{MAX_LEVEL, MIN_LEVEL};
use crate::scoring::ScoringConfig;

/// Descriptive exam metadata. Not used by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub institution: String,
    /// Item bank file or directory. Relative paths resolve against the
    /// config file's directory when loaded through the loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_bank: Option<PathBuf>,
}

/// Session length, starting level, and stopping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamParameters {
    /// Answers required before the score may be declared stable.
    pub min_questions: u32,
    /// Hard ceiling on answers.
    pub max_questions: u32,
    /// Level of the first item, 1–5.
    pub initial_difficulty: u8,
    /// Largest score range over the window that counts as converged.
    pub stabilization_threshold: f64,
    /// Number of most recent running scores inspected.
    pub stabilization_window: usize,
    /// Chance of moving one level after weak evidence: a correct answer on
    /// an easier item, or a miss on a harder one.
    #[serde(default = "default_level_change_probability")]
    pub level_change_probability: f64,
}

fn default_level_change_probability() -> f64 {
    0.5
}

impl Default for ExamParameters {
    fn default() -> Self {
        Self {
            min_questions: 15,
            max_questions: 30,
            initial_difficulty: 3,
            stabilization_threshold: 0.15,
            stabilization_window: 3,
            level_change_probability: default_level_change_probability(),
        }
    }
}

impl ExamParameters {
    /// Check ranges. Reports the first offending field.
    pub fn validate(&self) -> Result<(), CatError> {
        const CONTEXT: &str = "exam parameters";

        if self.min_questions < 1 {
            return Err(CatError::validation(CONTEXT, "min_questions", "must be at least 1"));
        }
        if self.max_questions < self.min_questions {
            return Err(CatError::validation(
                CONTEXT,
                "max_questions",
                format!(
                    "must be at least min_questions ({}), got {}",
                    self.min_questions, self.max_questions
                ),
            ));
        }
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.initial_difficulty) {
            return Err(CatError::validation(
                CONTEXT,
                "initial_difficulty",
                format!(
                    "must be between {MIN_LEVEL} and {MAX_LEVEL}, got {}",
                    self.initial_difficulty
                ),
            ));
        }
        if !(self.stabilization_threshold > 0.0 && self.stabilization_threshold.is_finite()) {
            return Err(CatError::validation(
                CONTEXT,
                "stabilization_threshold",
                format!("must be positive, got {}", self.stabilization_threshold),
            ));
        }
        if self.stabilization_window < 2 {
            return Err(CatError::validation(
                CONTEXT,
                "stabilization_window",
                format!("must be at least 2, got {}", self.stabilization_window),
            ));
        }
        if !(0.0..=1.0).contains(&self.level_change_probability) {
            return Err(CatError::validation(
                CONTEXT,
                "level_change_probability",
                format!("must be within [0, 1], got {}", self.level_change_probability),
            ));
        }
        Ok(())
    }
}

/// Everything the adaptive engine needs to run a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub parameters: ExamParameters,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// A full exam configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    #[serde(default)]
    pub exam: ExamMetadata,
    pub parameters: ExamParameters,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl ExamConfig {
    /// Range-check the parameters. The scoring section is checked when the
    /// engine is built.
    pub fn validate(&self) -> Result<(), CatError> {
        self.parameters.validate()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            parameters: self.parameters.clone(),
            scoring: self.scoring.clone(),
        }
    }
}
