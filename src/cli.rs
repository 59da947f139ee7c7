use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use controltower::ChunkStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guardrails")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Plan AWS Control Tower guardrails under the API concurrency limit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "GUARDRAILS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that override the configuration file
#[derive(Parser, Debug, Default)]
pub struct OverrideArgs {
    /// Role to assume in the management account (empty for ambient credentials)
    #[arg(long, global = true, env = "GUARDRAILS_ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Control Tower home region
    #[arg(long, global = true, env = "GUARDRAILS_HOME_REGION")]
    pub region: Option<String>,

    /// Maximum concurrent enable operations
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// How operations are cut into chains
    #[arg(long, global = true, value_enum)]
    pub strategy: Option<StrategyArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Runs of ceil(n/limit); the last chain takes the remainder
    Stride,
    /// Same number of chains, lengths differ by at most one
    Balanced,
}

impl From<StrategyArg> for ChunkStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Stride => Self::Stride,
            StrategyArg::Balanced => Self::Balanced,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the configuration without calling AWS
    Validate,

    /// Resolve OUs and show the deployment chains
    Plan(PlanArgs),

    /// Write the CloudFormation template
    Synth(SynthArgs),

    /// Compare the plan with a previously written template
    Diff(DiffArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct SynthArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the output file without asking
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Template written by an earlier `synth`
    #[arg(short, long)]
    pub previous: PathBuf,

    /// Exit with status 2 when there are changes
    #[arg(long)]
    pub exit_code: bool,
}
