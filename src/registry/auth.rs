//! Authentication and addressing for registry access

use crate::cli::config::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Domain appended to bare registry names
pub const DEFAULT_REGISTRY_DOMAIN: &str = ".azurecr.io";

/// Resolve a registry name to its login server.
///
/// A name without a dot is a short registry name and gets the default domain;
/// anything else is taken as a fully qualified host. A scheme, if present, is kept.
pub fn login_url(registry: &str) -> String {
    let registry = registry.trim().trim_end_matches('/');
    let host = registry
        .strip_prefix("https://")
        .or_else(|| registry.strip_prefix("http://"))
        .unwrap_or(registry);

    if host.contains('.') || host.contains(':') || host == "localhost" {
        registry.to_string()
    } else {
        format!("{}{}", registry, DEFAULT_REGISTRY_DOMAIN)
    }
}

/// Base address for HTTP calls: the login server with a scheme
pub fn registry_address(login_url: &str) -> String {
    if login_url.starts_with("http://") || login_url.starts_with("https://") {
        login_url.to_string()
    } else {
        format!("https://{}", login_url)
    }
}

/// Host part of the login server, used to prefix audit lines
pub fn display_host(login_url: &str) -> &str {
    login_url
        .strip_prefix("https://")
        .or_else(|| login_url.strip_prefix("http://"))
        .unwrap_or(login_url)
}

/// Encoded `Authorization` header value
#[derive(Debug, Clone, Default)]
pub struct Auth {
    header: Option<String>,
}

impl Auth {
    pub fn anonymous() -> Self {
        Self { header: None }
    }

    /// HTTP Basic credentials
    pub fn basic(username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        Self {
            header: Some(format!("Basic {}", encoded)),
        }
    }

    /// Pre-issued bearer token
    pub fn bearer(token: &str) -> Self {
        Self {
            header: Some(format!("Bearer {}", token)),
        }
    }

    pub fn from_config(config: Option<&AuthConfig>) -> Self {
        match config {
            Some(AuthConfig::Basic { username, password }) => Self::basic(username, password),
            Some(AuthConfig::Token(token)) => Self::bearer(token),
            None => Self::anonymous(),
        }
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.header {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_get_default_domain() {
        assert_eq!(login_url("myregistry"), "myregistry.azurecr.io");
        assert_eq!(login_url("myregistry.example.com"), "myregistry.example.com");
        assert_eq!(login_url("localhost:5000"), "localhost:5000");
        assert_eq!(login_url("http://localhost:5000/"), "http://localhost:5000");
    }

    #[test]
    fn address_defaults_to_https() {
        assert_eq!(
            registry_address("myregistry.azurecr.io"),
            "https://myregistry.azurecr.io"
        );
        assert_eq!(registry_address("http://localhost:5000"), "http://localhost:5000");
        assert_eq!(display_host("http://localhost:5000"), "localhost:5000");
    }

    #[test]
    fn basic_header_is_base64_of_user_and_password() {
        let auth = Auth::basic("user", "pass");
        assert_eq!(auth.header(), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(Auth::anonymous().header(), None);
    }

    #[test]
    fn token_config_becomes_bearer_header() {
        let config = AuthConfig::Token("abc".to_string());
        assert_eq!(Auth::from_config(Some(&config)).header(), Some("Bearer abc"));
    }
}
