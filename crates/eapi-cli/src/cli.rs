use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "eapi",
    version,
    about = "Run CLI commands against eAPI-enabled devices"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device address: [scheme://]hostname[:port]
    pub target: String,

    /// Username (default: admin)
    #[arg(short, long, default_value = "admin")]
    pub username: String,

    /// Password (default: blank)
    #[arg(short, long, default_value = "")]
    pub password: String,

    /// Prompt for the password instead of passing it on the command line
    #[arg(long, conflicts_with = "password")]
    pub prompt: bool,

    /// Client certificate + key PEM file (forces https, skips login)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Execute timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send commands in order and print the per-command results
    Execute(ExecuteArgs),
}

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    /// Commands to run, in order
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// Output encoding: json or text
    #[arg(short, long, default_value = "json")]
    pub encoding: eapi::Encoding,

    /// Enable-mode secret; prepends an `enable` command
    #[arg(long)]
    pub enable: Option<String>,

    /// Print the response as JSON instead of the block rendering
    #[arg(long)]
    pub json: bool,
}
