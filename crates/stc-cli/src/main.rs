use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod commands;

use commands::completions::run_completions;
use commands::run::run_pipeline;

#[derive(Parser)]
#[command(name = "stc")]
#[command(about = "Retrieval-augmented Structured Text generation and self-repair pipeline", long_about = None)]
struct Cli {
    /// Emit machine-readable JSON instead of a human-readable summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the retrieve/plan/generate/repair/evaluate pipeline over a set of projects.
    Run(RunArgs),
    /// Generate shell completion scripts.
    Completions(CompletionsArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Root directory containing one subdirectory per project's `.st` sources.
    #[arg(long, value_name = "DIR")]
    project_root: PathBuf,

    /// Directory under which `output/{result_dir}/...` artifacts are written.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Root of the ground-truth corpus used for CodeBLEU evaluation.
    #[arg(long, value_name = "DIR")]
    ground_truth: Option<PathBuf>,

    /// Evaluate against `{ground_truth}/{project}/FUN/*.st` instead of
    /// `{ground_truth}/{project}/*.st`.
    #[arg(long)]
    use_project_code: bool,

    /// Reuse an existing result directory name instead of a fresh timestamp;
    /// required for `--skip_retrieve`.
    #[arg(long)]
    result_dir: Option<String>,

    /// Restrict the run to these project subdirectories (repeatable).
    #[arg(long = "project")]
    project: Vec<String>,

    #[arg(long)]
    skip_retrieve: bool,

    #[arg(long)]
    skip_generation: bool,

    #[arg(long)]
    skip_fix: bool,

    #[arg(long)]
    skip_plan: bool,

    /// Absolute path to the CODESYS `.project` file the compile service targets.
    #[arg(long)]
    compiler_project_path: String,

    /// Directory of library reference documents for the recommender (§4.8).
    #[arg(long)]
    infos_dir: Option<PathBuf>,

    /// Override the TOML config file path (default `./stc.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    max_verify_count: Option<u32>,

    #[arg(long)]
    codesys_endpoint: Option<String>,
}

#[derive(clap::Args)]
struct CompletionsArgs {
    #[arg(value_enum)]
    shell: Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Run(args) => run_pipeline(args, cli.json)?,
        Command::Completions(args) => {
            run_completions(args.shell)?;
            0
        }
    };

    std::process::exit(exit_code);
}
