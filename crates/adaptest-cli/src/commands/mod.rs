pub mod init;
pub mod report;
pub mod simulate;
pub mod validate;

use comfy_table::{Cell, Table};

use adaptest_core::report::SessionReport;

/// Human-readable session summary on stdout.
pub(crate) fn print_summary(report: &SessionReport) {
    let stats = &report.statistics;

    if !report.exam.name.is_empty() {
        println!("Exam: {}", report.exam.name);
    }
    println!("Session: {}", report.id);

    let mut overview = Table::new();
    overview.set_header(vec!["Metric", "Value"]);
    overview.add_row(vec![Cell::new("Scoring"), Cell::new(report.strategy)]);
    if let Some(ability) = report.simulated_ability {
        overview.add_row(vec![Cell::new("Simulated θ"), Cell::new(format!("{ability:.2}"))]);
    }
    overview.add_row(vec![
        Cell::new("Answered"),
        Cell::new(format!(
            "{} ({} correct, {:.1}%)",
            stats.answered, stats.correct, stats.percent_correct
        )),
    ]);
    overview.add_row(vec![
        Cell::new("Final score"),
        Cell::new(format!("{:.2} / 5.00", stats.final_score)),
    ]);
    overview.add_row(vec![
        Cell::new("Final difficulty"),
        Cell::new(stats.final_difficulty),
    ]);
    overview.add_row(vec![
        Cell::new("Ended by"),
        Cell::new(stats.termination_reason),
    ]);
    for (name, value) in stats.diagnostics.metrics() {
        overview.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("{overview}");

    let mut levels = Table::new();
    levels.set_header(vec!["Level", "Answered", "Correct", "Accuracy"]);
    for (level, tally) in &stats.by_level {
        levels.add_row(vec![
            Cell::new(level),
            Cell::new(tally.total),
            Cell::new(tally.correct),
            Cell::new(format!("{:.1}%", tally.percent_correct)),
        ]);
    }
    println!("{levels}");
}
