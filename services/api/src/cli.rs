use crate::apply::{run_apply, ApplyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use waitlist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "waitlist",
    about = "Run the waitlist intake service or submit an application from the command line",
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
    /// Walk a draft application through the wizard and submit it
    Apply(ApplyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Apply(args) => run_apply(args).await,
    }
}
