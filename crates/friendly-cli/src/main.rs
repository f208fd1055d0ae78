//! friendly: single-user terminal chat with the friendly agent.

mod cli;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use friendly_ai::{CompletionGateway, EchoGateway};
use tracing_subscriber::EnvFilter;

use crate::repl::Repl;

/// Default filter when neither RUST_LOG nor --log-level is given. Keeps the
/// conversation on stdout free of log noise.
const DEFAULT_LOG_DIRECTIVE: &str = "warn";

fn init_logging(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = log_level.unwrap_or(DEFAULT_LOG_DIRECTIVE);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    let mut config = match friendly_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error starting the agent: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(prompt) = args.system_prompt {
        config.agent.system_prompt = prompt;
    }

    let gateway: Arc<dyn CompletionGateway> = if args.echo {
        tracing::info!("echo mode, completion service disabled");
        Arc::new(EchoGateway)
    } else {
        match friendly_ai::gateway_from_config(&config.gateway) {
            Ok(gateway) => gateway,
            Err(e) => {
                eprintln!("Error starting the agent: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let mut repl = Repl::new(gateway, config.agent);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    let result = tokio::select! {
        result = repl.run(input, &mut output) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nExiting gracefully...");
            Ok(())
        }
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("An error occurred: {e}");
            1
        }
    };
    // The stdin reader thread may still be blocked on a read; exit without
    // waiting for it.
    std::process::exit(code)
}
