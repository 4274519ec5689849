//! The `adaptest init` command.

use std::path::Path;

use anyhow::{Context, Result};

const SAMPLE_CONFIG: &str = include_str!("../../templates/adaptest.toml");
const SAMPLE_BANK: &str = include_str!("../../templates/questions.json");

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("adaptest.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("questions.json"), SAMPLE_BANK)?;

    println!("\nNext steps:");
    println!("  1. Edit questions.json with your own items");
    println!("  2. Run: adaptest validate --config adaptest.toml");
    println!("  3. Run: adaptest simulate --config adaptest.toml --ability 0.5");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}
