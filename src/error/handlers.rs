//! Standardized HTTP and network error classification

use crate::error::PurgeError;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Standard error handler for registry HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Build a registry error from a non-success response body.
    ///
    /// Registries answer with `{"errors":[{"code":..,"message":..}]}`; only the
    /// first entry is reported. Bodies that are not in that shape are passed
    /// through verbatim with a code derived from the status.
    pub fn registry_error(status: StatusCode, body: &str, operation: &str) -> PurgeError {
        let first = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.errors.into_iter().next());

        let (code, message) = match first {
            Some(detail) => (detail.code, detail.message),
            None => (Self::status_code_name(status), body.trim().to_string()),
        };

        PurgeError::Registry {
            status: status.as_u16(),
            code,
            message: format!("{} failed: {}", operation, message),
        }
    }

    fn status_code_name(status: StatusCode) -> String {
        match status.as_u16() {
            400 => "BAD_REQUEST",
            401 => "UNAUTHORIZED",
            403 => "DENIED",
            404 => "NOT_FOUND",
            405 => "UNSUPPORTED",
            429 => "TOOMANYREQUESTS",
            500..=599 => "SERVER_ERROR",
            _ => "UNKNOWN",
        }
        .to_string()
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> PurgeError {
        if error.is_timeout() {
            PurgeError::Transport(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            PurgeError::Transport(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            PurgeError::Transport(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            PurgeError::Transport(format!("{} network error: {}", context, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_error_envelope() {
        let body = r#"{"errors":[{"code":"TAG_UNKNOWN","message":"tag is not found"},{"code":"X","message":"y"}]}"#;
        match HttpErrorHandler::registry_error(StatusCode::NOT_FOUND, body, "delete tag") {
            PurgeError::Registry {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "TAG_UNKNOWN");
                assert_eq!(message, "delete tag failed: tag is not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        let err = HttpErrorHandler::registry_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "upstream down\n",
            "list tags",
        );
        match err {
            PurgeError::Registry { code, message, .. } => {
                assert_eq!(code, "SERVER_ERROR");
                assert_eq!(message, "list tags failed: upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
