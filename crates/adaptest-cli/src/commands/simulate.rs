//! The `adaptest simulate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use adaptest_core::engine::{AdaptiveEngine, Progress};
use adaptest_core::loader;
use adaptest_core::model::{Item, OptionMap};
use adaptest_core::report::SessionReport;
use adaptest_core::session::{administer, NoopReporter, ProgressReporter, SimulatedExaminee};
use adaptest_core::statistics::FinalStatistics;

/// Prints each exchange to stderr.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_item_presented(&self, progress: &Progress, item: &Item, _: &OptionMap) {
        eprintln!(
            "  Q{:<2} level {} [{}] {}",
            progress.question_number, progress.current_difficulty, item.category, item.id
        );
    }

    fn on_response_recorded(&self, _: &Item, is_correct: bool, progress: &Progress) {
        let verdict = if is_correct { "correct" } else { "wrong" };
        eprintln!(
            "       {verdict}, score {:.2}, next level {}",
            progress.latest_score, progress.current_difficulty
        );
    }

    fn on_session_complete(&self, stats: &FinalStatistics) {
        eprintln!(
            "\nComplete: {} answered, ended by {}",
            stats.answered, stats.termination_reason
        );
    }
}

pub fn execute(
    config_path: PathBuf,
    ability: f64,
    seed: Option<u64>,
    format: String,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    ensure!(
        ability.is_finite(),
        "--ability must be a finite number, got {ability}"
    );
    let config = loader::load_config(&config_path)?;
    let bank_path = config.exam.question_bank.as_ref().with_context(|| {
        format!(
            "config has no exam.question_bank: {}",
            config_path.display()
        )
    })?;
    let bank = Arc::new(loader::load_bank(bank_path)?);

    let (engine_rng, examinee_rng) = match seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };

    let mut engine = AdaptiveEngine::with_rng(config.engine_config(), bank, engine_rng)?;
    let mut examinee = SimulatedExaminee::new(ability, examinee_rng);

    tracing::info!(
        exam = %config.exam.name,
        ability,
        seed = ?seed,
        "starting simulated session"
    );

    let stats = if verbose {
        administer(&mut engine, &mut examinee, &ConsoleReporter)?
    } else {
        administer(&mut engine, &mut examinee, &NoopReporter)?
    };
    let report = SessionReport::new(config.exam.clone(), stats).with_simulated_ability(ability);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => super::print_summary(&report),
    }

    if let Some(dir) = output {
        let path = dir.join(report.file_name());
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
