use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4221;

/// Smallest head buffer we accept; a request line plus a short header fits.
pub const MIN_REQUEST_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings shared read-only by every connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Set `SO_REUSEADDR` so a restarted server can rebind right away.
    pub reuse_address: bool,
    /// Directory served under `/files/`.
    pub file_root: PathBuf,
    /// Upper bound on connections being handled at once.
    pub max_connections: usize,
    /// Deadline for receiving the whole request head.
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reuse_address: true,
            file_root: PathBuf::from("."),
            max_connections: 1024,
            read_timeout_ms: 10_000,
            write_timeout_ms: 10_000,
            max_request_bytes: 8192,
        }
    }
}

/// Command line flags. Every flag can also come from the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "minihttpd", version, about = "Minimal concurrent HTTP/1.1 server")]
pub struct CliArgs {
    /// YAML file with server settings
    #[arg(short, long, env = "MINIHTTPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host or IP to bind
    #[arg(long, env = "MINIHTTPD_HOST")]
    pub host: Option<String>,

    /// TCP port to bind
    #[arg(short, long, env = "MINIHTTPD_PORT")]
    pub port: Option<u16>,

    /// Directory served under /files/
    #[arg(short, long, env = "MINIHTTPD_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Do not set SO_REUSEADDR on the listening socket
    #[arg(long)]
    pub no_reuse_address: bool,

    #[arg(long, env = "MINIHTTPD_MAX_CONNECTIONS")]
    pub max_connections: Option<usize>,

    #[arg(long, env = "MINIHTTPD_READ_TIMEOUT_MS")]
    pub read_timeout_ms: Option<u64>,

    #[arg(long, env = "MINIHTTPD_WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: Option<u64>,

    #[arg(long, env = "MINIHTTPD_MAX_REQUEST_BYTES")]
    pub max_request_bytes: Option<usize>,
}

impl ServerConfig {
    /// Parses the command line and builds the effective configuration.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Defaults, then the YAML file named by `--config`, then flags.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_args(args);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_args(&mut self, args: CliArgs) {
        if let Some(host) = args.host {
            self.host = host;
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(dir) = args.directory {
            self.file_root = dir;
        }
        if args.no_reuse_address {
            self.reuse_address = false;
        }
        if let Some(n) = args.max_connections {
            self.max_connections = n;
        }
        if let Some(ms) = args.read_timeout_ms {
            self.read_timeout_ms = ms;
        }
        if let Some(ms) = args.write_timeout_ms {
            self.write_timeout_ms = ms;
        }
        if let Some(n) = args.max_request_bytes {
            self.max_request_bytes = n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be >= 1".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be > 0".into()));
        }
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("write_timeout_ms must be > 0".into()));
        }
        if self.max_request_bytes < MIN_REQUEST_BYTES {
            return Err(ConfigError::Invalid(format!(
                "max_request_bytes must be >= {MIN_REQUEST_BYTES}"
            )));
        }
        Ok(())
    }

    /// `host:port` as handed to the resolver.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
