//! Listener configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ServerError;

/// Port the share is published on unless configured otherwise
pub const DEFAULT_PORT: u16 = 8080;

/// Listen on every interface so other devices on the LAN can connect
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable overriding the listen host
pub const HOST_ENV: &str = "LANSHARE_HOST";

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "LANSHARE_PORT";

/// Where the file server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Read `LANSHARE_HOST` / `LANSHARE_PORT`, falling back to defaults
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup(PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(e) => tracing::warn!(
                    "Ignoring invalid {}='{}': {}. Using port {}",
                    PORT_ENV,
                    port,
                    e,
                    DEFAULT_PORT
                ),
            }
        }

        config
    }

    /// Resolve host and port into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if host == "localhost" {
            return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port));
        }

        host.parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.port))
            .map_err(|_| ServerError::InvalidAddress {
                addr: format!("{}:{}", self.host, self.port),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9090"),
        ]));
        assert_eq!(config, ServerConfig::new("127.0.0.1", 9090));
    }

    #[test]
    fn test_from_lookup_invalid_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[(PORT_ENV, "eighty")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_from_lookup_blank_host_ignored() {
        let config = ServerConfig::from_lookup(lookup_from(&[(HOST_ENV, "  ")]));
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_socket_addr() {
        let addr = ServerConfig::new("127.0.0.1", 8080).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");

        let addr = ServerConfig::new("localhost", 1).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:1");

        let addr = ServerConfig::new("[::1]", 8080).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "[::1]:8080");
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let err = ServerConfig::new("not a host", 8080).socket_addr().unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }
}
