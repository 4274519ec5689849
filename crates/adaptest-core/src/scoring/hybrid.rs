//! Weighted blend of the IRT and Elo scorers.

use serde::{Deserialize, Serialize};

use super::elo::{EloDiagnostics, EloScorer};
use super::irt::{IrtDiagnostics, IrtScorer};
use super::{Diagnostics, Scorer, MAX_SCORE, MIN_SCORE};
use crate::error::CatError;
use crate::model::ResponseRecord;

pub const DEFAULT_IRT_WEIGHT: f64 = 0.7;
pub const DEFAULT_ELO_WEIGHT: f64 = 0.3;

/// Both sub-models' diagnostics plus the normalized weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridDiagnostics {
    pub irt: IrtDiagnostics,
    pub elo: EloDiagnostics,
    pub irt_weight: f64,
    pub elo_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridScorer {
    irt: IrtScorer,
    elo: EloScorer,
    irt_weight: f64,
    elo_weight: f64,
}

impl Default for HybridScorer {
    fn default() -> Self {
        Self {
            irt: IrtScorer::default(),
            elo: EloScorer::default(),
            irt_weight: DEFAULT_IRT_WEIGHT,
            elo_weight: DEFAULT_ELO_WEIGHT,
        }
    }
}

impl HybridScorer {
    /// Build a blend; weights are normalized to sum to 1.
    pub fn new(
        irt: IrtScorer,
        elo: EloScorer,
        irt_weight: f64,
        elo_weight: f64,
    ) -> Result<Self, CatError> {
        if !irt_weight.is_finite() || !elo_weight.is_finite() || irt_weight < 0.0 || elo_weight < 0.0
        {
            return Err(CatError::Configuration(format!(
                "hybrid weights must be finite and non-negative, got irt={irt_weight}, elo={elo_weight}"
            )));
        }
        let total = irt_weight + elo_weight;
        if total <= 0.0 {
            return Err(CatError::Configuration(
                "hybrid weights must not both be zero".into(),
            ));
        }

        Ok(Self {
            irt,
            elo,
            irt_weight: irt_weight / total,
            elo_weight: elo_weight / total,
        })
    }

    /// Normalized `(irt, elo)` weights.
    pub fn weights(&self) -> (f64, f64) {
        (self.irt_weight, self.elo_weight)
    }

    pub fn irt(&self) -> &IrtScorer {
        &self.irt
    }

    pub fn elo(&self) -> &EloScorer {
        &self.elo
    }
}

impl Scorer for HybridScorer {
    fn score(&self, responses: &[ResponseRecord]) -> f64 {
        let blended = self.irt.score(responses) * self.irt_weight
            + self.elo.score(responses) * self.elo_weight;
        blended.clamp(MIN_SCORE, MAX_SCORE)
    }

    fn diagnostics(&self, responses: &[ResponseRecord]) -> Diagnostics {
        Diagnostics::Hybrid(HybridDiagnostics {
            irt: self.irt.irt_diagnostics(responses),
            elo: self.elo.elo_diagnostics(responses),
            irt_weight: self.irt_weight,
            elo_weight: self.elo_weight,
        })
    }
}
