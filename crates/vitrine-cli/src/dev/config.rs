//! Development server configuration.
//!
//! Resolves the loaded [`VitrineConfig`] into what the server needs at
//! runtime: a bindable address and the directories to serve and watch.

use crate::config::{VitrineConfig, WatchConfig};
use crate::error::{ConfigError, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Server socket address (IP + port)
    pub addr: SocketAddr,

    /// Open browser automatically on start
    pub open: bool,

    /// Component directory (first root)
    pub project_dir: PathBuf,

    /// Built-in directory (last root)
    pub builtin_dir: PathBuf,

    /// File watching settings
    pub watch: WatchConfig,

    /// Watch files at all
    pub watch_enabled: bool,
}

impl DevConfig {
    /// Build the runtime configuration, picking a free port.
    pub fn new(
        config: &VitrineConfig,
        project_dir: PathBuf,
        builtin_dir: PathBuf,
        watch_enabled: bool,
    ) -> Result<Self> {
        let ip: IpAddr = config.host.parse().map_err(|_| ConfigError::InvalidValue {
            field: "host".to_string(),
            value: config.host.clone(),
            hint: "Use an IP address such as 127.0.0.1 or 0.0.0.0".to_string(),
        })?;

        Ok(Self {
            addr: Self::find_available_port(ip, config.port)?,
            open: config.open,
            project_dir,
            builtin_dir,
            watch: config.watch.clone(),
            watch_enabled,
        })
    }

    /// Find an available port starting from the requested port.
    ///
    /// Tries the requested port first, then the next 10.
    fn find_available_port(ip: IpAddr, requested_port: u16) -> Result<SocketAddr> {
        use std::net::TcpListener;

        if requested_port < 1024 {
            crate::ui::warning(&format!(
                "Port {} is in privileged range, may require root access",
                requested_port
            ));
        }

        let addr = SocketAddr::new(ip, requested_port);
        if TcpListener::bind(addr).is_ok() {
            return Ok(addr);
        }

        for offset in 1..=10 {
            let port = requested_port.saturating_add(offset);
            let addr = SocketAddr::new(ip, port);
            if TcpListener::bind(addr).is_ok() {
                crate::ui::warning(&format!(
                    "Port {} is busy, using port {} instead",
                    requested_port, port
                ));
                return Ok(addr);
            }
        }

        Err(ConfigError::InvalidValue {
            field: "port".to_string(),
            value: requested_port.to_string(),
            hint: format!(
                "Ports {}-{} are all in use. Try a different port range.",
                requested_port,
                requested_port.saturating_add(10)
            ),
        }
        .into())
    }

    /// Directories watched for changes.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        vec![self.project_dir.clone(), self.builtin_dir.clone()]
    }

    /// Get the server URL as a string.
    pub fn server_url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}", host, self.addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn test_find_available_port_success() {
        let listener = match TcpListener::bind(("127.0.0.1", 0)) {
            Ok(listener) => listener,
            Err(err) => {
                eprintln!("Skipping test_find_available_port_success: unable to bind socket ({err})");
                return;
            }
        };
        let start_port = listener.local_addr().unwrap().port();
        drop(listener);

        let addr = DevConfig::find_available_port(localhost(), start_port).expect("should find port");
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert!(addr.port() >= start_port);
    }

    #[test]
    fn test_busy_port_falls_forward() {
        let listener = match TcpListener::bind(("127.0.0.1", 0)) {
            Ok(listener) => listener,
            Err(_) => return,
        };
        let busy = listener.local_addr().unwrap().port();
        if busy > u16::MAX - 10 {
            return;
        }

        let addr = DevConfig::find_available_port(localhost(), busy).expect("should find port");
        assert_ne!(addr.port(), busy);
        assert!(addr.port() <= busy + 10);
    }

    #[test]
    fn test_invalid_host() {
        let config = VitrineConfig {
            host: "not an ip".to_string(),
            ..VitrineConfig::default()
        };
        let err = DevConfig::new(&config, PathBuf::from("."), PathBuf::from("."), true).unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_server_url() {
        let config = DevConfig {
            addr: "0.0.0.0:3000".parse().unwrap(),
            open: false,
            project_dir: PathBuf::from("/p"),
            builtin_dir: PathBuf::from("/b"),
            watch: WatchConfig::default(),
            watch_enabled: true,
        };
        assert_eq!(config.server_url(), "http://localhost:3000");
        assert_eq!(config.watch_roots(), vec![PathBuf::from("/p"), PathBuf::from("/b")]);
    }
}
