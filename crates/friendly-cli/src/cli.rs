use std::path::PathBuf;

use clap::Parser;

/// Friendly Agent: chat with a hosted language model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "friendly", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// System prompt override.
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Reply with "You said: ..." instead of calling the completion service.
    #[arg(long)]
    pub echo: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
