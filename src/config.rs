use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::{ Path, PathBuf };
use std::str::FromStr;
use std::time::Duration;
use log::{ info, warn };
use crate::models::server::ServerConfig;

pub const DEFAULT_GAME_PORT: u16 = 25565;

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Parse(String),
    Empty,
    DuplicateId(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            Self::Parse(e) => write!(f, "Invalid server list: {}", e),
            Self::Empty => write!(f, "Server list is empty"),
            Self::DuplicateId(id) => write!(f, "Duplicate server id: {}", id),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for std::io::Error {
    fn from(e: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,

    // Status provider
    pub provider_base_url: String,
    pub provider_timeout_secs: u64,
    pub default_game_port: u16,

    /// Cap on records surfaced by `/status`. Zero disables the cap.
    pub max_servers_returned: usize,

    pub servers_file: PathBuf,
    pub servers_json: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            provider_base_url: "https://api.mcsrvstat.us/3".to_string(),
            provider_timeout_secs: 10,
            default_game_port: DEFAULT_GAME_PORT,
            max_servers_returned: 1,
            servers_file: PathBuf::from("servers.json"),
            servers_json: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: env_or("PORT", defaults.port),
            provider_base_url: env::var("PROVIDER_BASE_URL").unwrap_or(defaults.provider_base_url),
            provider_timeout_secs: env_or("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout_secs),
            default_game_port: env_or("DEFAULT_GAME_PORT", defaults.default_game_port),
            max_servers_returned: env_or("MAX_SERVERS_RETURNED", defaults.max_servers_returned),
            servers_file: env::var("SERVERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.servers_file),
            servers_json: env::var("SERVERS_JSON").ok(),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Resolves the configured server list: inline JSON first, then the
    /// servers file, then the built-in entry.
    pub fn load_servers(&self) -> Result<Vec<ServerConfig>, ConfigError> {
        if let Some(json) = &self.servers_json {
            info!("Loading server list from SERVERS_JSON");
            return parse_servers(json);
        }
        if self.servers_file.exists() {
            info!("Loading server list from {}", self.servers_file.display());
            return read_servers_file(&self.servers_file);
        }
        warn!(
            "No server list found at {}, using built-in server",
            self.servers_file.display()
        );
        Ok(vec![builtin_server()])
    }

    /// Applies `max_servers_returned` to an aggregated batch.
    pub fn truncate_for_response<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.max_servers_returned > 0 {
            items.truncate(self.max_servers_returned);
        }
        items
    }
}

fn builtin_server() -> ServerConfig {
    ServerConfig {
        id: "minecraft-1".to_string(),
        name: "Minecraft".to_string(),
        image: "/minecraft-server-landscape.png".to_string(),
        host: "mc2.pipatzo.com".to_string(),
    }
}

fn read_servers_file(path: &Path) -> Result<Vec<ServerConfig>, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    parse_servers(&text)
}

pub fn parse_servers(json: &str) -> Result<Vec<ServerConfig>, ConfigError> {
    let servers: Vec<ServerConfig> = serde_json::from_str(json)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    if servers.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut seen = HashSet::new();
    for server in &servers {
        if !seen.insert(server.id.as_str()) {
            return Err(ConfigError::DuplicateId(server.id.clone()));
        }
    }

    Ok(servers)
}

/// Settings for the terminal dashboard that polls `/status`.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub status_url: String,
    pub poll_interval_secs: u64,
    pub copied_flag_millis: u64,
    pub fetch_timeout_secs: u64,
    /// Fixed address to copy regardless of which server was picked.
    pub copy_address: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            status_url: "http://127.0.0.1:8080/status".to_string(),
            poll_interval_secs: 30,
            copied_flag_millis: 2000,
            fetch_timeout_secs: 10,
            copy_address: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            status_url: env::var("STATUS_URL").unwrap_or(defaults.status_url),
            poll_interval_secs: env_or("POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            copied_flag_millis: env_or("COPIED_FLAG_MILLIS", defaults.copied_flag_millis),
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            copy_address: env::var("COPY_ADDRESS").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn copied_flag_duration(&self) -> Duration {
        Duration::from_millis(self.copied_flag_millis)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
