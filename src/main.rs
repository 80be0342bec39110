use std::path::PathBuf;

use clap::Parser;
use transfer_puzzles::{
    config::GeneratorConfig, error::GeneratorError, pipeline, selector::Shuffler,
};

/// Generates the daily transfer puzzles for each service pattern.
#[derive(Parser, Debug)]
#[command(version, about)]
struct GeneratorApp {
    /// Directory holding `common/` and one directory per service pattern.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Where `<pattern>/answers.json` and `<pattern>/solutions.json` are written.
    #[arg(long, default_value = "../src/data")]
    output_dir: PathBuf,
    /// TOML file overriding the patterns and quality thresholds.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only generate these patterns. Repeatable.
    #[arg(long = "pattern")]
    patterns: Vec<String>,
    /// Seed for the shuffles, for reproducible output.
    #[arg(long, conflicts_with = "no_shuffle")]
    seed: Option<u64>,
    /// Keep every order as computed.
    #[arg(long)]
    no_shuffle: bool,
    /// Keep at most this many candidates per route combo.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_candidates_per_combo: Option<u64>,
}

impl GeneratorApp {
    fn shuffler(&self) -> Shuffler {
        match (self.no_shuffle, self.seed) {
            (true, _) => Shuffler::Disabled,
            (false, Some(seed)) => Shuffler::seeded(seed),
            (false, None) => Shuffler::from_os_rng(),
        }
    }

    fn run(&self) -> Result<(), GeneratorError> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(cap) = self.max_candidates_per_combo {
            config.max_candidates_per_combo = Some(cap as usize);
        }

        let mut shuffler = self.shuffler();
        for pattern in config.select_patterns(&self.patterns)? {
            let report = pipeline::run_pattern(
                &self.data_dir,
                &self.output_dir,
                pattern,
                &config,
                &mut shuffler,
            )?;
            log::info!("{report:?}");
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();
    let app = GeneratorApp::parse();
    if let Err(e) = app.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
