//! friendly-web: WebSocket chat server for the friendly agent.
//!
//! Every connection gets its own conversation in a shared session registry.
//! Sessions end when the connection closes, or when they sit idle past the
//! configured timeout.

mod connection;
mod handler;
mod protocol;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use friendly_ai::{CompletionGateway, EchoGateway, GatewayFactory, SessionRegistry};
use friendly_config::{AgentConfig, GatewayConfig};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::connection::handle_connection;

#[derive(Parser)]
#[command(name = "friendly-web", about = "WebSocket chat server for the friendly agent")]
struct Args {
    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides `web.port`).
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Reply with "You said: ..." instead of calling the completion service.
    #[arg(long)]
    echo: bool,
}

/// Filter used until the config file says otherwise.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Install the subscriber before the config is read, so config loading is
/// logged too.
///
/// Returns a handle for applying `logging.level` later, or `None` when
/// RUST_LOG or `--log-level` already fixed the filter.
fn init_logging(log_level: Option<&str>) -> Option<reload::Handle<EnvFilter, Registry>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let explicit = explicit_filter(rust_log.as_deref(), log_level);
    let pinned = explicit.is_some();

    let (filter, handle) =
        reload::Layer::new(explicit.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    (!pinned).then_some(handle)
}

/// The filter fixed from outside the config file: RUST_LOG first, then
/// `--log-level`. Blank or unparsable values are skipped.
fn explicit_filter(rust_log: Option<&str>, log_level: Option<&str>) -> Option<EnvFilter> {
    [rust_log, log_level]
        .into_iter()
        .flatten()
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
}

/// Build the gateway once and share it. If the configuration is unusable the
/// server still starts, and every new session reports the error.
fn gateway_factory(config: &GatewayConfig, echo: bool) -> GatewayFactory {
    if echo {
        tracing::info!("echo mode, completion service disabled");
        let gateway: Arc<dyn CompletionGateway> = Arc::new(EchoGateway);
        return Box::new(move || Ok(gateway.clone()));
    }

    match friendly_ai::gateway_from_config(config) {
        Ok(gateway) => {
            tracing::info!(gateway = gateway.name(), "completion gateway ready");
            Box::new(move || Ok(gateway.clone()))
        }
        Err(e) => {
            tracing::error!(error = %e, "completion gateway unavailable");
            let config = config.clone();
            Box::new(move || friendly_ai::gateway_from_config(&config))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_reload = init_logging(args.log_level.as_deref());

    let config: AgentConfig = match friendly_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            eprintln!("Error starting the agent: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(handle) = log_reload {
        let directive = config.logging.level.as_directive();
        if let Err(e) = handle.reload(EnvFilter::new(directive)) {
            tracing::warn!(error = %e, "could not apply logging.level");
        }
    }
    tracing::debug!(
        config = %friendly_config::config_to_json(&config),
        "effective configuration"
    );

    let registry = SessionRegistry::new(gateway_factory(&config.gateway, args.echo))
        .with_context_window(config.agent.context_window as usize);
    let persona = Arc::new(config.agent.clone());

    let addr = match args.port {
        Some(port) => format!("{}:{port}", config.web.host),
        None => config.web.bind_addr(),
    };
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("friendly-web listening on {}", addr);

    // Spawn idle session reaper.
    let reaper_registry = registry.clone();
    let idle_timeout = Duration::from_secs(u64::from(config.web.idle_timeout));
    let reap_interval = Duration::from_secs(u64::from(config.web.reap_interval));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(reap_interval).await;
            let reaped = reaper_registry.reap_idle(idle_timeout).await;
            let count = reaper_registry.count().await;
            tracing::debug!(reaped, sessions = count, "Reaper tick");
        }
    });

    // Accept loop.
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let registry = registry.clone();
                let persona = persona.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, registry, persona).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    fn level(filter: Option<EnvFilter>) -> Option<LevelFilter> {
        filter.and_then(|f| f.max_level_hint())
    }

    #[test]
    fn rust_log_wins_over_flag() {
        let filter = explicit_filter(Some("debug"), Some("error"));
        assert_eq!(level(filter), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn flag_applies_without_rust_log() {
        let filter = explicit_filter(None, Some("warn"));
        assert_eq!(level(filter), Some(LevelFilter::WARN));

        let filter = explicit_filter(Some("  "), Some("error"));
        assert_eq!(level(filter), Some(LevelFilter::ERROR));
    }

    #[test]
    fn config_level_applies_when_nothing_is_pinned() {
        assert!(explicit_filter(None, None).is_none());
        assert!(explicit_filter(Some(""), None).is_none());
    }
}
