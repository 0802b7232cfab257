// crates/chitfund-daemon/src/config.rs
//
// Runtime configuration for the chit fund daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hex-encoded 32-byte key for signing session tokens.
    /// When absent a random key is generated and sessions do not survive
    /// a restart.
    #[serde(default)]
    pub session_secret: Option<String>,

    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Three uppercase letters prepended to every generated member ID.
    #[serde(default = "default_member_id_prefix")]
    pub member_id_prefix: String,

    /// Keep all data in memory (nothing written to `data_dir`).
    #[serde(default)]
    pub in_memory: bool,
}

fn default_data_dir() -> String {
    "~/.chitfund/data".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50051
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_hours() -> i64 {
    chitfund_rpc::session::DEFAULT_SESSION_TTL_HOURS
}

fn default_member_id_prefix() -> String {
    chitfund_core::member_id::DEFAULT_PREFIX.to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            session_secret: None,
            session_ttl_hours: default_session_ttl_hours(),
            member_id_prefix: default_member_id_prefix(),
            in_memory: false,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Path of the RocksDB directory inside `data_dir`.
    pub fn rocksdb_path(&self) -> String {
        format!("{}/rocksdb", expand_tilde(&self.data_dir))
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
