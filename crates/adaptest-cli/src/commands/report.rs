//! The `adaptest report` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::report::SessionReport;

pub fn execute(path: PathBuf, format: String) -> Result<()> {
    let report = SessionReport::load_json(&path)?;

    match format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => super::print_summary(&report),
    }

    Ok(())
}
