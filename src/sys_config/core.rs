//! Startup configuration read from the environment.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_DIR: &str = "./data/uploads";
/// Whole-request cap for `/upload`.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 300 << 20;

const ENV_HOST: &str = "DROPGO_HOST";
const ENV_PORT: &str = "DROPGO_PORT";
const ENV_UPLOAD_DIR: &str = "DROPGO_UPLOAD_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface the listener binds to.
    pub host: IpAddr,
    /// Listen port, also used in the shared LAN URL.
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Build the config from `DROPGO_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_HOST) {
            match raw.trim().parse::<IpAddr>() {
                Ok(host) => config.host = host,
                Err(e) => warn!("ignoring {ENV_HOST}={raw:?}: {e}"),
            }
        }

        if let Some(raw) = lookup(ENV_PORT) {
            match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => config.port = port,
                Ok(_) => warn!("ignoring {ENV_PORT}=0"),
                Err(e) => warn!("ignoring {ENV_PORT}={raw:?}: {e}"),
            }
        }

        if let Some(raw) = lookup(ENV_UPLOAD_DIR) {
            if raw.trim().is_empty() {
                warn!("ignoring empty {ENV_UPLOAD_DIR}");
            } else {
                config.upload_dir = PathBuf::from(raw);
            }
        }

        config
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// try both upper- and lower-case names
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .or_else(|_| env::var(name.to_lowercase()))
        .ok()
}
