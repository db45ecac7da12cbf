use std::path::PathBuf;

use clap::{Parser, Subcommand};
use maple::InteractionAction;

#[derive(Parser, Debug)]
#[command(name = "maple", author, version, about = "Maple, your AI companion, in the terminal")]
pub struct Args {
    /// Directory holding config.json (defaults to the user config dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seed for the reply generator, overrides the config
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Skip the simulated delays instead of waiting them out
    #[arg(long, global = true)]
    pub instant: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the companion's status card
    Status,
    /// Play, feed, chat with or rest the companion
    Interact {
        /// play | feed | chat | rest
        action: InteractionAction,
    },
    /// Send one message and wait for the reply
    Chat {
        message: String,
    },
    /// Interactive session
    Repl,
    /// Manage config.json
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}
