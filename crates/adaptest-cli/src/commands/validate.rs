//! The `adaptest validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use adaptest_core::config::ExamParameters;
use adaptest_core::loader;
use adaptest_core::scoring::ScoringStrategy;
use adaptest_core::QuestionBank;

pub fn execute(config_path: Option<PathBuf>, bank_path: Option<PathBuf>) -> Result<()> {
    match (config_path, bank_path) {
        (Some(config_path), _) => validate_config(&config_path),
        (None, Some(bank_path)) => {
            let bank = loader::load_bank(&bank_path)?;
            report_bank(&bank_path, &bank, ExamParameters::default().min_questions);
            Ok(())
        }
        (None, None) => anyhow::bail!("pass --config or --bank"),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    let config = loader::load_config(path)?;
    let strategy = ScoringStrategy::from_config(&config.scoring)
        .with_context(|| format!("invalid scoring section: {}", path.display()))?;

    let params = &config.parameters;
    println!("Config: {}", path.display());
    println!(
        "  questions {}..={}, start at level {}, stable within {} over {} answers",
        params.min_questions,
        params.max_questions,
        params.initial_difficulty,
        params.stabilization_threshold,
        params.stabilization_window
    );
    println!("  scoring: {}", strategy.kind());

    match &config.exam.question_bank {
        Some(bank_path) => {
            let bank = loader::load_bank(bank_path)?;
            report_bank(bank_path, &bank, params.min_questions);
        }
        None => println!("  no question_bank configured"),
    }

    println!("Configuration valid.");
    Ok(())
}

fn report_bank(path: &Path, bank: &QuestionBank, min_questions: u32) {
    let summary = bank.summary();
    println!(
        "Item bank: {} ({} items, {} categories)",
        path.display(),
        summary.total_items,
        summary.per_category.len()
    );

    let mut table = Table::new();
    table.set_header(vec!["Level", "Items"]);
    for (level, count) in &summary.per_level {
        table.add_row(vec![Cell::new(level), Cell::new(count)]);
    }
    println!("{table}");

    let coverage = bank.coverage(min_questions);
    for shortfall in &coverage.shortfalls {
        println!(
            "  WARNING: level {} has {} item(s), {} recommended",
            shortfall.level, shortfall.available, shortfall.recommended
        );
    }
    if coverage.is_sufficient {
        println!("Bank coverage sufficient.");
    }
}
