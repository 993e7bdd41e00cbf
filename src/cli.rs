use std::path::PathBuf;

use clap::Parser;

/// Fetch your cuLearn grades from the command line.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Show every grade item without asking
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show a one-line summary per course without asking
    #[arg(short, long)]
    pub quiet: bool,

    /// Save the results to this JSON file (".json" is appended if missing)
    #[arg(short, long, conflicts_with = "no_save")]
    pub output: Option<String>,

    /// Never offer to save the results
    #[arg(long)]
    pub no_save: bool,

    /// Report grades that are new or changed compared to a previous export
    #[arg(long, value_name = "FILE")]
    pub compare: Option<PathBuf>,

    /// Stop at the first course that cannot be fetched or parsed
    #[arg(long)]
    pub abort_on_error: bool,

    /// Take credentials from CULEARN_USERNAME / CULEARN_PASSWORD and never prompt
    #[arg(long)]
    pub non_interactive: bool,

    /// Login timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
