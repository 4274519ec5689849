//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter exam config and item bank in the current directory
    Init,

    /// Validate an exam config or an item bank
    Validate {
        /// Exam config TOML (also validates the bank it names)
        #[arg(long, conflicts_with = "bank", required_unless_present = "bank")]
        config: Option<PathBuf>,

        /// Item bank file (.json / .toml) or directory
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Run a session against a simulated examinee
    Simulate {
        /// Exam config TOML
        #[arg(long)]
        config: PathBuf,

        /// True ability θ of the simulated examinee
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        ability: f64,

        /// RNG seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to save the JSON session report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print each item and answer as the session runs
        #[arg(long)]
        verbose: bool,
    },

    /// Render a saved session report
    Report {
        /// Session report JSON
        #[arg(long)]
        path: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adaptest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { config, bank } => commands::validate::execute(config, bank),
        Commands::Simulate {
            config,
            ability,
            seed,
            format,
            output,
            verbose,
        } => commands::simulate::execute(config, ability, seed, format, output, verbose),
        Commands::Report { path, format } => commands::report::execute(path, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
