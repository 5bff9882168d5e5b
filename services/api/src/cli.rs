use crate::catalogue::{run_eligible, run_list, EligibleArgs, ListArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use corpus_maria::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Corpus Maria",
    about = "Run the Corpus Maria enrollment service or inspect its class schedule",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the class schedule and age eligibility
    Classes {
        #[command(subcommand)]
        command: ClassesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ClassesCommand {
    /// Print every session in the schedule
    List(ListArgs),
    /// Show the sessions open to a student born on the given date
    Eligible(EligibleArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Replace the built-in timetable with a CSV export
    #[arg(long)]
    pub(crate) schedule_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Classes {
            command: ClassesCommand::List(args),
        } => run_list(args),
        Command::Classes {
            command: ClassesCommand::Eligible(args),
        } => run_eligible(args),
    }
}
