//! adaptest-core — adaptive testing engine and scoring models.
//!
//! A session draws items near the examinee's current level, moves that level
//! after each answer, keeps a running 0–5 grade under a pluggable scoring
//! model, and stops once the grade settles or the bank runs dry.

pub mod bank;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod report;
pub mod scoring;
pub mod session;
pub mod statistics;

pub use bank::QuestionBank;
pub use config::{EngineConfig, ExamConfig, ExamMetadata, ExamParameters};
pub use engine::{AdaptiveEngine, Phase, Progress, SessionState};
pub use error::CatError;
pub use model::{Item, ResponseRecord, TerminationReason};
pub use scoring::{Scorer, ScoringConfig, ScoringStrategy, StrategyKind};
pub use statistics::FinalStatistics;
