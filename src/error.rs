//! Crate-level error type.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Everything that can go wrong on this side of the wire. Gateway failures
/// pass through untouched so callers can still classify them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("config file {path}: {detail}")]
    Config { path: String, detail: String },

    #[error("invalid {field}: {detail}")]
    Validation {
        field: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_passes_through_display() {
        let err: ClientError = GatewayError::Connect {
            url: "http://x".to_string(),
            detail: "refused".to_string(),
        }
        .into();
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ClientError::Config {
            path: "mentor.toml".to_string(),
            detail: "expected a table".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("mentor.toml"));
        assert!(s.contains("expected a table"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ClientError::Validation {
            field: "temperature",
            detail: "2.5 fora do intervalo [0, 2]".to_string(),
        };
        assert!(err.to_string().contains("temperature"));
    }
}
