use clap::Parser;
use edgefinder::cli::{check, run, Cli, Commands};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => run::execute(&cli.config, args, cli.log_level.as_deref()).await,
        Commands::Check(args) => check::execute(&cli.config, args),
    };

    if let Err(err) = result {
        error!(error = %err, "fatal error");
        std::process::exit(1);
    }
}
