use crate::runner;
use clap::{Args, Parser, Subcommand};
use deposit_archive::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Deposit Archive Worker",
    about = "Archive listing deposits whose paid visibility window has lapsed",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daily scheduler until interrupted (default command)
    Run,
    /// Perform a single reconciliation run immediately and print the report
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Run even if the job already completed today
    #[arg(long)]
    pub(crate) force: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => runner::run_scheduler().await,
        Command::Sweep(args) => runner::run_sweep(args).await,
    }
}
