//! HTTP server bind/shutdown configuration, grounded on
//! `nvisy_cli::config::server::ServerConfig` (trimmed: no TLS, no CORS —
//! those belong to the out-of-scope HTTP transport layer, §1).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind the Control API to.
    #[arg(long, env = "FORGE_HOST", default_value = "127.0.0.1")]
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// TCP port for the Control API.
    #[arg(short = 'p', long, env = "FORGE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// How long `Shutdown` waits for in-flight jobs to drain before
    /// force-terminating survivors (§4.8 `Shutdown(deadline)`).
    #[arg(long, env = "FORGE_SHUTDOWN_DEADLINE_SECS", default_value_t = 30)]
    pub shutdown_deadline_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: 8080, shutdown_deadline_secs: 30 }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be nonzero");
        }
        Ok(())
    }

    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub const fn shutdown_deadline(&self) -> Duration {
        Duration::from_secs(self.shutdown_deadline_secs)
    }

    pub const fn binds_to_all_interfaces(&self) -> bool {
        match self.host {
            IpAddr::V4(addr) => addr.is_unspecified(),
            IpAddr::V6(addr) => addr.is_unspecified(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_to_loopback() {
        let config = ServerConfig::default();
        assert!(!config.binds_to_all_interfaces());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_zero_port() {
        let config = ServerConfig { port: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
