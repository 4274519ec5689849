//! Pluggable scoring models.
//!
//! Every model maps a chronological response history onto a 0–5 grade and
//! reports model-specific diagnostics. The set of models is closed, so the
//! strategy is an enum chosen once per session from configuration.

pub mod elo;
pub mod hybrid;
pub mod irt;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::model::ResponseRecord;

pub use elo::{EloDiagnostics, EloScorer};
pub use hybrid::{HybridDiagnostics, HybridScorer};
pub use irt::{IrtDiagnostics, IrtScorer, SkillLevel};

/// Lowest grade any model produces.
pub const MIN_SCORE: f64 = 0.0;
/// Highest grade any model produces.
pub const MAX_SCORE: f64 = 5.0;

/// Common contract for scoring models.
///
/// Implementations must return their neutral default on an empty history.
pub trait Scorer {
    /// Final grade in `[MIN_SCORE, MAX_SCORE]`.
    fn score(&self, responses: &[ResponseRecord]) -> f64;

    /// Running grade shown while the session is in progress.
    fn partial_score(&self, responses: &[ResponseRecord]) -> f64 {
        self.score(responses)
    }

    fn diagnostics(&self, responses: &[ResponseRecord]) -> Diagnostics;
}

/// Model-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Diagnostics {
    Irt(IrtDiagnostics),
    Elo(EloDiagnostics),
    Hybrid(HybridDiagnostics),
}

impl Diagnostics {
    /// Flattened `(name, value)` pairs, for display.
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        let irt_metrics = |d: &IrtDiagnostics| {
            vec![
                ("theta", format!("{:.3}", d.theta)),
                ("consistency", format!("{:.3}", d.consistency)),
                ("skill_level", d.skill_level.to_string()),
            ]
        };
        let elo_metrics = |d: &EloDiagnostics| {
            vec![
                ("rating", format!("{:.1}", d.rating)),
                ("rating_change", format!("{:+.1}", d.rating_change)),
            ]
        };

        match self {
            Diagnostics::Irt(d) => irt_metrics(d),
            Diagnostics::Elo(d) => elo_metrics(d),
            Diagnostics::Hybrid(d) => {
                let mut metrics = irt_metrics(&d.irt);
                metrics.extend(elo_metrics(&d.elo));
                metrics.push(("irt_weight", format!("{:.2}", d.irt_weight)));
                metrics.push(("elo_weight", format!("{:.2}", d.elo_weight)));
                metrics
            }
        }
    }
}

/// Configuration tag selecting a scoring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "irt_simplificado")]
    Irt,
    #[serde(rename = "elo")]
    Elo,
    #[serde(rename = "hibrido")]
    Hybrid,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Irt => "irt_simplificado",
            StrategyKind::Elo => "elo",
            StrategyKind::Hybrid => "hibrido",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "irt_simplificado" => Ok(StrategyKind::Irt),
            "elo" => Ok(StrategyKind::Elo),
            "hibrido" => Ok(StrategyKind::Hybrid),
            other => Err(CatError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Strategy-specific parameters. Unset values take each model's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irt_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elo_weight: Option<f64>,
}

/// The `[scoring]` configuration section.
///
/// The tag stays a plain string so an unknown tag is reported as a
/// configuration error when the strategy is built, not as a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: ScoringParams,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Irt.as_str().to_string(),
            parameters: ScoringParams::default(),
        }
    }
}

impl ScoringConfig {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            parameters: ScoringParams::default(),
        }
    }
}

/// The scoring model in use for a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringStrategy {
    Irt(IrtScorer),
    Elo(EloScorer),
    Hybrid(HybridScorer),
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        ScoringStrategy::Irt(IrtScorer::default())
    }
}

impl ScoringStrategy {
    /// Build the strategy named by `config.kind`.
    ///
    /// Fails on an unknown tag, on parameters that do not apply to the chosen
    /// model, and on parameter values no model can work with.
    pub fn from_config(config: &ScoringConfig) -> Result<Self, CatError> {
        let kind: StrategyKind = config.kind.parse()?;
        let params = &config.parameters;

        let allowed: &[&str] = match kind {
            StrategyKind::Irt => &["max_iterations"],
            StrategyKind::Elo => &["k_factor", "initial_rating"],
            StrategyKind::Hybrid => &[
                "max_iterations",
                "k_factor",
                "initial_rating",
                "irt_weight",
                "elo_weight",
            ],
        };
        if let Some(name) = params.set_names().into_iter().find(|n| !allowed.contains(n)) {
            return Err(CatError::Configuration(format!(
                "parameter `{name}` does not apply to the `{kind}` strategy"
            )));
        }

        let strategy = match kind {
            StrategyKind::Irt => ScoringStrategy::Irt(irt_from(params)?),
            StrategyKind::Elo => ScoringStrategy::Elo(elo_from(params)?),
            StrategyKind::Hybrid => ScoringStrategy::Hybrid(HybridScorer::new(
                irt_from(params)?,
                elo_from(params)?,
                params.irt_weight.unwrap_or(hybrid::DEFAULT_IRT_WEIGHT),
                params.elo_weight.unwrap_or(hybrid::DEFAULT_ELO_WEIGHT),
            )?),
        };

        tracing::debug!(strategy = %kind, "scoring strategy ready");
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            ScoringStrategy::Irt(_) => StrategyKind::Irt,
            ScoringStrategy::Elo(_) => StrategyKind::Elo,
            ScoringStrategy::Hybrid(_) => StrategyKind::Hybrid,
        }
    }
}

impl ScoringParams {
    fn set_names(&self) -> Vec<&'static str> {
        [
            ("max_iterations", self.max_iterations.is_some()),
            ("k_factor", self.k_factor.is_some()),
            ("initial_rating", self.initial_rating.is_some()),
            ("irt_weight", self.irt_weight.is_some()),
            ("elo_weight", self.elo_weight.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

fn irt_from(params: &ScoringParams) -> Result<IrtScorer, CatError> {
    let max_iterations = params.max_iterations.unwrap_or(irt::DEFAULT_MAX_ITERATIONS);
    if max_iterations == 0 {
        return Err(CatError::Configuration(
            "max_iterations must be at least 1".into(),
        ));
    }
    Ok(IrtScorer::new(max_iterations))
}

fn elo_from(params: &ScoringParams) -> Result<EloScorer, CatError> {
    let k_factor = params.k_factor.unwrap_or(elo::DEFAULT_K_FACTOR);
    let initial_rating = params.initial_rating.unwrap_or(elo::DEFAULT_INITIAL_RATING);
    if !k_factor.is_finite() || k_factor <= 0.0 {
        return Err(CatError::Configuration(format!(
            "k_factor must be positive, got {k_factor}"
        )));
    }
    if !initial_rating.is_finite() {
        return Err(CatError::Configuration(
            "initial_rating must be a finite number".into(),
        ));
    }
    Ok(EloScorer::new(k_factor, initial_rating))
}

impl Scorer for ScoringStrategy {
    fn score(&self, responses: &[ResponseRecord]) -> f64 {
        match self {
            ScoringStrategy::Irt(s) => s.score(responses),
            ScoringStrategy::Elo(s) => s.score(responses),
            ScoringStrategy::Hybrid(s) => s.score(responses),
        }
    }

    fn partial_score(&self, responses: &[ResponseRecord]) -> f64 {
        match self {
            ScoringStrategy::Irt(s) => s.partial_score(responses),
            ScoringStrategy::Elo(s) => s.partial_score(responses),
            ScoringStrategy::Hybrid(s) => s.partial_score(responses),
        }
    }

    fn diagnostics(&self, responses: &[ResponseRecord]) -> Diagnostics {
        match self {
            ScoringStrategy::Irt(s) => s.diagnostics(responses),
            ScoringStrategy::Elo(s) => s.diagnostics(responses),
            ScoringStrategy::Hybrid(s) => s.diagnostics(responses),
        }
    }
}

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
