//! Shared-secret gate for the public read endpoint.

use axum::http::{HeaderMap, HeaderName};

use crate::config::AccessConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("access secret header missing")]
    MissingHeader,

    #[error("access secret mismatch")]
    Mismatch,

    #[error("no access secret configured")]
    NotConfigured,
}

/// Compares a request header with the configured secret.
///
/// An empty configured secret admits nobody, not even an empty header.
#[derive(Debug, Clone)]
pub struct AccessGate {
    enabled: bool,
    header: HeaderName,
    secret: String,
}

impl AccessGate {
    pub fn new(header: HeaderName, secret: impl Into<String>) -> Self {
        Self {
            enabled: true,
            header,
            secret: secret.into(),
        }
    }

    /// A gate that admits every request.
    pub fn open() -> Self {
        Self {
            enabled: false,
            header: HeaderName::from_static("x-rapidapi-proxy-secret"),
            secret: String::new(),
        }
    }

    pub fn from_config(config: &AccessConfig) -> Result<Self, String> {
        if !config.enabled {
            return Ok(Self::open());
        }
        let header = HeaderName::from_bytes(config.header.as_bytes())
            .map_err(|e| format!("invalid access.header: {e}"))?;
        Ok(Self::new(header, config.secret.clone()))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if !self.enabled {
            return Ok(());
        }
        let supplied = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        self.check(supplied)
    }

    fn check(&self, supplied: &str) -> Result<(), AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::NotConfigured);
        }
        if supplied.is_empty() {
            return Err(AuthError::MissingHeader);
        }
        if supplied != self.secret {
            return Err(AuthError::Mismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            "x-rapidapi-proxy-secret",
            HeaderValue::from_str(value).unwrap(),
        );
        map
    }

    fn gate(secret: &str) -> AccessGate {
        AccessGate::from_config(&AccessConfig {
            secret: secret.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_secret_rejects_everything() {
        let gate = gate("");
        assert_eq!(gate.authorize(&HeaderMap::new()), Err(AuthError::NotConfigured));
        assert_eq!(gate.authorize(&headers("")), Err(AuthError::NotConfigured));
        assert_eq!(gate.authorize(&headers("anything")), Err(AuthError::NotConfigured));
    }

    #[test]
    fn matching_secret_passes() {
        let gate = gate("s3cret");
        assert_eq!(gate.authorize(&headers("s3cret")), Ok(()));
        assert_eq!(gate.authorize(&headers("S3CRET")), Err(AuthError::Mismatch));
        assert_eq!(gate.authorize(&HeaderMap::new()), Err(AuthError::MissingHeader));
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let gate = gate("s3cret");
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static("x-rapidapi-proxy-secret"),
            HeaderValue::from_static("s3cret"),
        );
        assert!(gate.authorize(&map).is_ok());
        assert_eq!(gate.header().as_str(), "x-rapidapi-proxy-secret");
    }

    #[test]
    fn disabled_gate_admits_all() {
        let gate = AccessGate::from_config(&AccessConfig {
            enabled: false,
            ..Default::default()
        })
        .unwrap();
        assert!(!gate.is_enabled());
        assert!(gate.authorize(&HeaderMap::new()).is_ok());
    }
}
