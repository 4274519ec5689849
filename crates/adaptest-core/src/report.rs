//! Session reports with JSON persistence and Markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExamMetadata;
use crate::scoring::StrategyKind;
use crate::statistics::FinalStatistics;

/// A finished session, ready to archive or render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exam: ExamMetadata,
    pub strategy: StrategyKind,
    /// True ability of a simulated examinee, when the session was simulated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_ability: Option<f64>,
    pub statistics: FinalStatistics,
}

impl SessionReport {
    pub fn new(exam: ExamMetadata, statistics: FinalStatistics) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exam,
            strategy: statistics.strategy,
            simulated_ability: None,
            statistics,
        }
    }

    pub fn with_simulated_ability(mut self, ability: f64) -> Self {
        self.simulated_ability = Some(ability);
        self
    }

    /// Default file name: `session-<id>.json`.
    pub fn file_name(&self) -> String {
        format!("session-{}.json", self.id)
    }

    /// Save the report as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn to_markdown(&self) -> String {
        let stats = &self.statistics;
        let mut md = String::new();

        let title = if self.exam.name.is_empty() {
            "Adaptive session"
        } else {
            self.exam.name.as_str()
        };
        md.push_str(&format!("# {title}\n\n"));
        if !self.exam.subject.is_empty() {
            md.push_str(&format!("- **Subject:** {}\n", self.exam.subject));
        }
        if !self.exam.institution.is_empty() {
            md.push_str(&format!("- **Institution:** {}\n", self.exam.institution));
        }
        md.push_str(&format!("- **Session:** {}\n", self.id));
        md.push_str(&format!(
            "- **Date:** {}\n",
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        md.push_str(&format!("- **Scoring:** {}\n", self.strategy));
        if let Some(ability) = self.simulated_ability {
            md.push_str(&format!("- **Simulated ability:** {ability:.2}\n"));
        }
        md.push('\n');

        md.push_str(&format!(
            "**Final score:** {:.2} / 5.00 ({} of {} correct, {:.1}%), ended by {}\n\n",
            stats.final_score,
            stats.correct,
            stats.answered,
            stats.percent_correct,
            stats.termination_reason
        ));

        md.push_str("## Diagnostics\n\n");
        for (name, value) in stats.diagnostics.metrics() {
            md.push_str(&format!("- {name}: {value}\n"));
        }
        md.push('\n');

        md.push_str("## By difficulty\n\n");
        md.push_str("| Level | Answered | Correct | Accuracy |\n");
        md.push_str("|-------|----------|---------|----------|\n");
        for (level, tally) in &stats.by_level {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                level, tally.total, tally.correct, tally.percent_correct
            ));
        }
        md.push('\n');

        if !stats.by_category.is_empty() {
            md.push_str("## By category\n\n");
            md.push_str("| Category | Answered | Correct | Accuracy |\n");
            md.push_str("|----------|----------|---------|----------|\n");
            for (category, tally) in &stats.by_category {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    category, tally.total, tally.correct, tally.percent_correct
                ));
            }
            md.push('\n');
        }

        if !stats.difficulty_progression.is_empty() {
            let path: Vec<String> = stats
                .difficulty_progression
                .iter()
                .map(u8::to_string)
                .collect();
            md.push_str(&format!("**Difficulty path:** {}\n", path.join(" → ")));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bank::QuestionBank;
    use crate::config::EngineConfig;
    use crate::engine::AdaptiveEngine;
    use crate::model::fixtures::items_per_level;
    use crate::session::{administer, NoopReporter, ScriptedResponder};

    fn sample_report() -> SessionReport {
        let bank = Arc::new(QuestionBank::from_items(items_per_level(5)).unwrap());
        let mut engine = AdaptiveEngine::seeded(EngineConfig::default(), bank, 3).unwrap();
        let mut responder = ScriptedResponder::new(vec![true, true, false]);
        let stats = administer(&mut engine, &mut responder, &NoopReporter).unwrap();
        let exam = ExamMetadata {
            name: "Rust fundamentals".into(),
            subject: "Programming".into(),
            institution: "Test Academy".into(),
            question_bank: None,
        };
        SessionReport::new(exam, stats)
    }

    #[test]
    fn json_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = dir.path().join("nested").join(report.file_name());
        report.save_json(&path).unwrap();

        let loaded = SessionReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.statistics.item_ids, report.statistics.item_ids);
        assert_eq!(loaded.strategy, StrategyKind::Irt);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionReport::load_json(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }

    #[test]
    fn markdown_has_sections() {
        let report = sample_report().with_simulated_ability(1.25);
        let md = report.to_markdown();
        assert!(md.starts_with("# Rust fundamentals"));
        assert!(md.contains("Test Academy"));
        assert!(md.contains("irt_simplificado"));
        assert!(md.contains("## By difficulty"));
        assert!(md.contains("## By category"));
        assert!(md.contains("theta"));
        assert!(md.contains("Simulated ability:** 1.25"));
        assert!(md.contains("Difficulty path:** 3"));
    }
}
