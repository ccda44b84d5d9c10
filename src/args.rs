use clap::Parser;

const CMD_NAME: &str = "pf";
const DEFAULT_CONFIG: &str = "pipeline.toml";
const DEFAULT_OUTPUT: &str = "output";
const DEFAULT_INTERVAL_MS: &str = "100";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Pipeline manifest
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    #[arg(env = "PARAMFLOW_CONFIG")]
    pub config: String,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    #[arg(env = "PARAMFLOW_OUTPUT")]
    pub output: String,

    /// Name of step to run (default: all steps, in manifest order)
    #[arg(short, long = "step", value_name = "STEP")]
    pub steps: Vec<String>,

    /// Override an input value
    #[arg(short = 'D', long = "set", value_name = "ID=VALUE")]
    pub overrides: Vec<String>,

    /// Write outputs directly into the step directory instead of one subdirectory per output
    #[arg(short, long)]
    pub flat: bool,

    /// Bypass user confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print additional info (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dry run; stage inputs and print them, but don't run or write anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Progress polling interval
    #[arg(short, long, value_name = "MS", default_value = DEFAULT_INTERVAL_MS)]
    pub interval: u64,
}
