use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::DEFAULT_PIPELINE_DEPTH;

struct DefaultArgs;

impl DefaultArgs {
    pub const ADDR: &'static str = "127.0.0.1:9966";
}

/// Pipelined autotuner driving a remote evaluator.
#[derive(Clone, Parser)]
#[command(name = "tunepipe")]
#[command(about = "Tune a program against a remote evaluator, keeping a bounded window of configurations in flight.")]
pub struct Cli {
    /// Parameter space definition: JSON file with a `params` array.
    #[arg(value_name = "SPACE")]
    pub space: PathBuf,

    /// Evaluator address, host:port.
    #[arg(long, short = 'a', default_value = DefaultArgs::ADDR)]
    pub addr: String,

    /// Bind the address and wait for the evaluator to dial in, instead of
    /// connecting out.
    #[arg(long)]
    pub listen: bool,

    /// Evaluation budget: how many configurations to try.
    #[arg(long, short = 't', default_value_t = 100)]
    pub trials: u64,

    /// In-flight window (pipeline depth).
    #[arg(long, short = 'p', default_value_t = DEFAULT_PIPELINE_DEPTH)]
    pub depth: usize,

    /// Run database path. Default: `<program>.db` beside the space file.
    #[arg(long, short)]
    pub db: Option<PathBuf>,

    /// Program name recorded with the run. Default: the space file stem.
    #[arg(long)]
    pub program: Option<String>,

    /// Candidate-generation seed, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Program name for run records: the explicit flag, or the space file
    /// stem.
    pub fn program_name(&self) -> String {
        self.program.clone().unwrap_or_else(|| {
            self.space
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "tuning-run".to_string())
        })
    }

    /// Run database path, defaulting to `<program>.db` next to the space
    /// file.
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| self.space.with_file_name(format!("{}.db", self.program_name())))
    }
}
