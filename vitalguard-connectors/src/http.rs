//! HTTP/HTTPS Delivery for VitalGuard
//!
//! ## Overview
//!
//! `HttpSink` posts each anomaly event as a JSON document to a collector
//! endpoint using the blocking `ureq` client. The agent pipeline is
//! synchronous, so a blocking client with a hard timeout is the natural
//! fit: a stalled collector can delay the next reading by at most one
//! timeout, never indefinitely.
//!
//! ## Wire Format
//!
//! ```text
//! POST /alert HTTP/1.1
//! Content-Type: application/json
//!
//! {"eventId":"…","deviceId":"dev_01","patientId":"patient_100",
//!  "sensorType":"ECG","measuredValue":2.4,"deviationScore":1.87,
//!  "timestamp":"2024-03-01T12:00:00Z"}
//! ```
//!
//! ## Acceptance
//!
//! Only `200` and `201` are success. Every other status, including other
//! 2xx codes, is reported as [`DeliveryError::Rejected`] so the agent
//! buffers the event and replays it later.
//!
//! ## Example Usage
//!
//! ```rust
//! use vitalguard_connectors::http::{HttpConfig, HttpSink};
//!
//! let config = HttpConfig::new("https://collector.example.com/alert")
//!     .api_key("X-Device-Key", "secret")
//!     .timeout_ms(1500)
//!     .header("X-Site", "ward-3");
//!
//! let sink = HttpSink::new(config)?;
//! assert_eq!(sink.stats().attempts(), 0);
//! # Ok::<(), vitalguard_connectors::ConnectorError>(())
//! ```

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use base64::Engine;
use log::{debug, warn};
use vitalguard_core::config::DEFAULT_DELIVERY_TIMEOUT;
use vitalguard_core::{AgentConfig, AnomalyEvent, DeliveryError, DeliverySink};

use crate::{ConnectionStats, ConnectorError};

/// HTTP configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Collector endpoint events are posted to
    pub endpoint: String,
    /// Upper bound on one request, connect included
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// API key in header
    ApiKey {
        /// Header name
        header: String,
        /// Key value
        value: String,
    },
}

impl HttpConfig {
    /// Create new configuration for a collector endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_DELIVERY_TIMEOUT,
            auth: AuthMethod::None,
            headers: HashMap::new(),
            user_agent: format!("VitalGuard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create configuration bounded by the agent's delivery timeout
    pub fn for_agent(endpoint: impl Into<String>, agent: &AgentConfig) -> Self {
        Self::new(endpoint).timeout(agent.delivery_timeout)
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set request timeout in milliseconds
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Override the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    fn validate(&self) -> Result<(), ConnectorError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConnectorError::Config(
                "Endpoint must start with http:// or https://".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConnectorError::Config("Timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Delivery sink posting events to an HTTP collector
pub struct HttpSink {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: ConnectionStats,
}

impl HttpSink {
    /// Create new HTTP sink
    pub fn new(config: HttpConfig) -> Result<Self, ConnectorError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: ConnectionStats::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Build request with authentication and headers
    fn build_request(&self) -> ureq::Request {
        let mut request = self.agent.post(&self.config.endpoint);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
    }

    fn post(&self, body: &str) -> Result<u16, DeliveryError> {
        match self.build_request().send_string(body) {
            Ok(response) => match response.status() {
                status @ (200 | 201) => Ok(status),
                status => Err(DeliveryError::Rejected { status }),
            },
            Err(ureq::Error::Status(status, _)) => Err(DeliveryError::Rejected { status }),
            Err(ureq::Error::Transport(err)) => Err(classify_transport(&err)),
        }
    }
}

impl DeliverySink for HttpSink {
    fn send(&mut self, event: &AnomalyEvent) -> Result<(), DeliveryError> {
        let body = event.to_json()?;

        match self.post(&body) {
            Ok(status) => {
                debug!("POST {} -> {}", self.config.endpoint, status);
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += body.len() as u64;
                self.stats.last_status = Some(status);
                self.stats.last_error = None;
                Ok(())
            }
            Err(err) => {
                warn!("POST {} failed: {}", self.config.endpoint, err);
                self.stats.messages_failed += 1;
                self.stats.last_status = match err {
                    DeliveryError::Rejected { status } => Some(status),
                    _ => None,
                };
                self.stats.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.config.endpoint)
            .field("timeout", &self.config.timeout)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Map a ureq transport failure onto the delivery taxonomy
fn classify_transport(err: &ureq::Transport) -> DeliveryError {
    let timed_out = std::error::Error::source(err)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map_or(false, |io_err| {
            matches!(
                io_err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            )
        });

    if timed_out {
        DeliveryError::Timeout
    } else {
        DeliveryError::Transport(err.to_string())
    }
}
