//! HTTP transport seam
//!
//! The catalog only ever issues authenticated GETs and reads the status and
//! body text, so that is all [`Transport`] exposes. [`HttpTransport`] is the
//! production implementation over a blocking `reqwest` client; tests script
//! their own.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConnectionConfig;

/// Network-level failure (the request never produced an HTTP response).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Status code and body text of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can perform a blocking GET against the monitoring service.
pub trait Transport {
    /// Issue a GET for `url`.
    ///
    /// Non-2xx statuses are returned as replies, not errors.
    fn get(&self, url: &str) -> Result<HttpReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        (**self).get(url)
    }
}

/// Blocking `reqwest` transport with basic auth.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    user: String,
    password: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client honouring the configured timeout and TLS verification.
    pub fn new(config: &ConnectionConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        if !config.verify_tls {
            tracing::warn!("TLS certificate verification disabled");
        }

        Ok(Self {
            http,
            user: config.user.clone(),
            password: config.password.clone(),
            timeout,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.user, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Http(e)
                }
            })?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        let ok = HttpReply { status: 200, body: String::new() };
        let created = HttpReply { status: 204, body: String::new() };
        let missing = HttpReply { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(created.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_transport_builds_from_config() {
        let config = ConnectionConfig {
            host: "https://t8.example.com/rest".to_string(),
            user: "operator".to_string(),
            password: "secret".to_string(),
            timeout_secs: 3,
            verify_tls: false,
        };
        let transport = HttpTransport::new(&config).expect("client should build");
        assert_eq!(transport.timeout, Duration::from_secs(3));
    }
}
