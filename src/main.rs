// main.rs
mod cli;

use clap::Parser;
use cli::{Args, Commands, RunOptions};
use tracing::Level;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let opts = RunOptions::from_args(&args);

    match args.command {
        Commands::Status => cli::handle_status(&opts).await,
        Commands::Interact { action } => cli::handle_interact(&opts, action).await,
        Commands::Chat { message } => cli::handle_chat(&opts, &message).await,
        Commands::Repl => cli::handle_repl(&opts).await,
        Commands::Config { command } => cli::handle_config(&opts, command).await,
    }
}
