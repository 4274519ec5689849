//! Config and item-bank file loading.
//!
//! Exam configs are TOML. Item banks are either a JSON array of items or a
//! TOML file with `[[items]]` tables, chosen by file extension.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bank::QuestionBank;
use crate::config::ExamConfig;
use crate::model::ItemRecord;

/// Load and validate an exam config file.
///
/// A relative `exam.question_bank` path is rewritten relative to the config
/// file's directory.
pub fn load_config(path: &Path) -> Result<ExamConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let mut config = parse_config_str(&content, path)?;
    if let Some(bank) = &config.exam.question_bank {
        if bank.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.exam.question_bank = Some(base.join(bank));
        }
    }
    Ok(config)
}

/// Parse and validate a config TOML string (useful for testing).
pub fn parse_config_str(content: &str, source_path: &Path) -> Result<ExamConfig> {
    let config: ExamConfig = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", source_path.display()))?;
    Ok(config)
}

#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    items: Vec<ItemRecord>,
}

/// Supported item-bank encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankFormat {
    Json,
    Toml,
}

impl BankFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(BankFormat::Json),
            "toml" => Some(BankFormat::Toml),
            _ => None,
        }
    }
}

/// Parse raw item records without validating them.
pub fn parse_bank_str(content: &str, format: BankFormat, source_path: &Path) -> Result<Vec<ItemRecord>> {
    let records = match format {
        BankFormat::Json => serde_json::from_str::<Vec<ItemRecord>>(content)
            .with_context(|| format!("failed to parse JSON item bank: {}", source_path.display()))?,
        BankFormat::Toml => {
            toml::from_str::<TomlBankFile>(content)
                .with_context(|| format!("failed to parse TOML item bank: {}", source_path.display()))?
                .items
        }
    };
    Ok(records)
}

fn read_bank_file(path: &Path) -> Result<Vec<ItemRecord>> {
    let format = BankFormat::from_path(path).with_context(|| {
        format!(
            "unsupported item bank extension (expected .json or .toml): {}",
            path.display()
        )
    })?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank: {}", path.display()))?;
    parse_bank_str(&content, format, path)
}

/// Load a bank from a single file, or from every bank file in a directory.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let records = if path.is_dir() {
        collect_directory(path)?
    } else {
        read_bank_file(path)?
    };

    if records.is_empty() {
        anyhow::bail!("item bank contains no items: {}", path.display());
    }

    let count = records.len();
    let bank = QuestionBank::load(records)
        .with_context(|| format!("invalid item bank: {}", path.display()))?;
    tracing::debug!(items = count, path = %path.display(), "item bank loaded");
    Ok(bank)
}

/// Recursively gather item records from `.json` and `.toml` files, in
/// file-name order.
fn collect_directory(dir: &Path) -> Result<Vec<ItemRecord>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        if path.is_dir() {
            records.extend(collect_directory(&path)?);
        } else if BankFormat::from_path(&path).is_some() {
            records.extend(read_bank_file(&path)?);
        } else {
            tracing::warn!("skipping non-bank file {}", path.display());
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatError;

    const CONFIG_TOML: &str = r#"
[exam]
name = "Adaptive programming exam"
subject = "Programming"
institution = "Example University"
question_bank = "questions.json"

[parameters]
min_questions = 15
max_questions = 30
initial_difficulty = 3
stabilization_threshold = 0.15
stabilization_window = 3

[scoring]
type = "hibrido"

[scoring.parameters]
irt_weight = 0.7
elo_weight = 0.3
"#;

    const BANK_JSON: &str = r#"[
  {
    "id": "q1",
    "difficulty": 1,
    "category": "Variables",
    "prompt": "Which keyword declares an immutable binding?",
    "options": {"a": "let", "b": "mut", "c": "static"},
    "correct_key": "a",
    "explanation": "Bindings are immutable by default."
  },
  {
    "id": "q2",
    "difficulty": 4,
    "category": "Ownership",
    "prompt": "What happens to a String after it is moved?",
    "options": {"a": "It is copied", "b": "The old binding is unusable"},
    "correct_key": "b",
    "explanation": "Moves invalidate the source."
  }
]"#;

    const BANK_TOML: &str = r#"
[[items]]
id = "t1"
difficulty = 2
category = "Loops"
prompt = "Which loop runs forever?"
correct_key = "b"
explanation = ""

[items.options]
a = "for"
b = "loop"
"#;

    #[test]
    fn parse_full_config() {
        let config = parse_config_str(CONFIG_TOML, Path::new("exam.toml")).unwrap();
        assert_eq!(config.exam.subject, "Programming");
        assert_eq!(config.parameters.stabilization_window, 3);
        assert_eq!(config.scoring.kind, "hibrido");
        assert_eq!(config.scoring.parameters.elo_weight, Some(0.3));
        assert_eq!(config.engine_config().parameters.min_questions, 15);
    }

    #[test]
    fn config_without_scoring_defaults_to_irt() {
        let toml = r#"
[parameters]
min_questions = 2
max_questions = 4
initial_difficulty = 1
stabilization_threshold = 0.5
stabilization_window = 2
"#;
        let config = parse_config_str(toml, Path::new("min.toml")).unwrap();
        assert_eq!(config.scoring.kind, "irt_simplificado");
        assert!(config.exam.question_bank.is_none());
    }

    #[test]
    fn invalid_parameters_fail_with_field() {
        let toml = CONFIG_TOML.replace("stabilization_window = 3", "stabilization_window = 1");
        let err = parse_config_str(&toml, Path::new("bad.toml")).unwrap_err();
        let cat = err.downcast_ref::<CatError>().expect("domain error preserved");
        assert_eq!(cat.field(), Some("stabilization_window"));
    }

    #[test]
    fn unknown_strategy_parses_but_is_kept_verbatim() {
        let toml = CONFIG_TOML.replace("\"hibrido\"", "\"bayes\"");
        let config = parse_config_str(&toml, Path::new("exam.toml")).unwrap();
        assert_eq!(config.scoring.kind, "bayes");
    }

    #[test]
    fn malformed_config() {
        assert!(parse_config_str("[parameters\nmin =", Path::new("bad.toml")).is_err());
    }

    #[test]
    fn load_config_resolves_bank_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam.toml");
        std::fs::write(&path, CONFIG_TOML).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.exam.question_bank,
            Some(dir.path().join("questions.json"))
        );
    }

    #[test]
    fn json_and_toml_banks() {
        let json = parse_bank_str(BANK_JSON, BankFormat::Json, Path::new("b.json")).unwrap();
        assert_eq!(json.len(), 2);
        let toml = parse_bank_str(BANK_TOML, BankFormat::Toml, Path::new("b.toml")).unwrap();
        assert_eq!(toml.len(), 1);
        assert_eq!(toml[0].options.as_ref().unwrap()["b"], "loop");
    }

    #[test]
    fn load_bank_from_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), BANK_JSON).unwrap();
        std::fs::create_dir(dir.path().join("more")).unwrap();
        std::fs::write(dir.path().join("more").join("b.toml"), BANK_TOML).unwrap();
        std::fs::write(dir.path().join("README.md"), "not a bank").unwrap();

        let bank = load_bank(dir.path()).unwrap();
        assert_eq!(bank.len(), 3);
        assert!(bank.get("t1").is_some());
    }

    #[test]
    fn load_bank_reports_invalid_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, BANK_JSON.replace("\"difficulty\": 4", "\"difficulty\": 9")).unwrap();

        let err = load_bank(&path).unwrap_err();
        let cat = err.downcast_ref::<CatError>().expect("domain error preserved");
        assert_eq!(cat.field(), Some("difficulty"));
    }

    #[test]
    fn empty_bank_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(load_bank(&path).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.yaml");
        std::fs::write(&path, "- id: x").unwrap();
        assert!(load_bank(&path).is_err());
        assert_eq!(BankFormat::from_path(Path::new("X.JSON")), Some(BankFormat::Json));
    }
}
