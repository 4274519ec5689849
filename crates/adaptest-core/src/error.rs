//! Domain error types.
//!
//! Validation and configuration errors abort session setup. Bank exhaustion is
//! not an error: it surfaces as `None` from `AdaptiveEngine::next_item` and is
//! routed into the termination rules.

use thiserror::Error;

/// Errors raised by the adaptive testing core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// A malformed item or configuration value.
    #[error("invalid {context}: `{field}` {reason}")]
    Validation {
        /// What was being validated (e.g. "item q-17", "exam parameters").
        context: String,
        /// The first offending field.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// The configured scoring strategy tag is not known.
    #[error("unknown scoring strategy `{0}` (expected one of: irt_simplificado, elo, hibrido)")]
    UnknownStrategy(String),

    /// Strategy parameters that cannot produce a working scorer.
    #[error("invalid scoring configuration: {0}")]
    Configuration(String),

    /// The caller broke the one-item-in-flight protocol.
    #[error("session protocol violation: {0}")]
    Session(String),
}

impl CatError {
    pub(crate) fn validation(
        context: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        CatError::Validation {
            context: context.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Returns `true` for malformed items or configuration values.
    pub fn is_validation(&self) -> bool {
        matches!(self, CatError::Validation { .. })
    }

    /// Returns `true` for scoring-strategy selection or parameter errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CatError::UnknownStrategy(_) | CatError::Configuration(_)
        )
    }

    /// The offending field, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CatError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
