use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use truthtree::prover::Options;

/// Semantic tableau prover for propositional and many-sorted first-order logic
///
/// The problem file contains S-expression sections
/// `(declarations ...)`, `(premises ...)`, and `(goal ...)`.
/// The prover reports whether the goal follows from the premises,
/// printing either a proof log or a countermodel.
///
/// Set the environment variable "LOG" to "info", "debug", or "trace"
/// to obtain an increasingly detailed log.
#[derive(Parser)]
pub struct Cli {
    /// Report every inference at log level "info"
    #[arg(long)]
    pub verbose: bool,

    /// Give up after the given number of seconds
    #[arg(long, value_name = "SECONDS")]
    pub max_runtime: Option<f64>,

    /// Write SZS output (such as proofs and error details) to given file
    #[arg(short)]
    pub output: Option<PathBuf>,

    /// Write proof search statistics in JSON format to given file
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Path of the problem file
    pub file: PathBuf,
}

impl Cli {
    pub fn options(&self) -> Options {
        let secs = self.max_runtime.filter(|s| s.is_finite() && *s >= 0.0);
        Options {
            verbose: self.verbose,
            max_runtime: secs.map(Duration::from_secs_f64),
        }
    }

    pub fn output(&self, out: impl std::fmt::Display) -> Result<(), std::io::Error> {
        use std::io::Write;
        match &self.output {
            Some(o) => std::fs::write(o, out.to_string()),
            None => write!(std::io::stdout(), "{}", truthtree::szs::Output(out)),
        }
    }
}
