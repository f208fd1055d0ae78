use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("missing endpoint: {0}")]
    MissingEndpoint(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("usage error: {0}")]
    Usage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("web.port = 0 is out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: web.port = 0 is out of range"
        );

        let err = ConfigError::MissingCredential("AZURE_OPENAI_API_KEY".into());
        assert_eq!(err.to_string(), "missing credential: AZURE_OPENAI_API_KEY");

        let err = ConfigError::MissingEndpoint("AZURE_OPENAI_ENDPOINT".into());
        assert_eq!(err.to_string(), "missing endpoint: AZURE_OPENAI_ENDPOINT");
    }

    #[test]
    fn agent_error_from_config() {
        let config_err = ConfigError::MissingCredential("api key".into());
        let err: AgentError = config_err.into();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(err.to_string().contains("api key"));
    }

    #[test]
    fn agent_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: AgentError = io_err.into();
        assert!(matches!(err, AgentError::Io(_)));
        assert!(err.to_string().contains("stdout closed"));
    }

    #[test]
    fn agent_error_gateway_and_usage() {
        let err = AgentError::Gateway("timeout".into());
        assert_eq!(err.to_string(), "gateway error: timeout");

        let err = AgentError::Usage("session closed".into());
        assert_eq!(err.to_string(), "usage error: session closed");
    }
}
