use crate::audit::{run_audit, run_report, ReportArgs, RunArgs};
use clap::{Parser, Subcommand};
use credwatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "credwatch",
    about = "Audit application registrations for expiring credentials and notify their owners",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the directory and mail owners of credentials at the alert point (default command)
    Run(RunArgs),
    /// Scan the directory and list every credential inside the look-ahead window
    Report(ReportArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => run_audit(args),
        Command::Report(args) => run_report(args),
    }
}
