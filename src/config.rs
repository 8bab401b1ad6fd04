// config.rs
// Portal configuration read from the environment (after dotenvy loads .env).

use std::{env, net::SocketAddr, time::Duration};

use tracing::warn;

/// Runtime settings for the portal.
///
/// `PAYPORTAL_API_URL`, `PAYPORTAL_BIND`, `PAYPORTAL_API_TIMEOUT_SECS` and
/// `PAYPORTAL_SESSION_TTL_SECS` override the defaults below.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the payment backend, without trailing slash.
    pub api_url: String,
    pub bind_addr: SocketAddr,
    pub api_timeout: Duration,
    pub session_ttl: Duration,
}

impl PortalConfig {
    pub const DEFAULT_API_URL: &str = "http://localhost:3000";
    pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24; // 1 day

    pub fn from_env() -> Self {
        let api_url = env::var("PAYPORTAL_API_URL").unwrap_or_else(|_| Self::DEFAULT_API_URL.to_owned());

        let bind_addr = match env::var("PAYPORTAL_BIND") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PAYPORTAL_BIND, using default");
                default_bind()
            }),
            Err(_) => default_bind(),
        };

        let api_timeout = Duration::from_secs(env_secs(
            "PAYPORTAL_API_TIMEOUT_SECS",
            Self::DEFAULT_API_TIMEOUT_SECS,
        ));
        let session_ttl = Duration::from_secs(env_secs(
            "PAYPORTAL_SESSION_TTL_SECS",
            Self::DEFAULT_SESSION_TTL_SECS,
        ));

        Self::new(api_url).with_bind(bind_addr).with_timeouts(api_timeout, session_ttl)
    }

    /// Explicit config pointing at `api_url` with default timings (tests).
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            bind_addr: default_bind(),
            api_timeout: Duration::from_secs(Self::DEFAULT_API_TIMEOUT_SECS),
            session_ttl: Duration::from_secs(Self::DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_bind(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_timeouts(mut self, api_timeout: Duration, session_ttl: Duration) -> Self {
        self.api_timeout = api_timeout;
        self.session_ttl = session_ttl;
        self
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_API_URL)
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn env_secs(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "not a number of seconds, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slash() {
        let cfg = PortalConfig::new("http://backend:3000/");
        assert_eq!(cfg.api_url, "http://backend:3000");
        assert_eq!(cfg.api_timeout, Duration::from_secs(10));
        assert_eq!(cfg.session_ttl, Duration::from_secs(86_400));
    }
}
