// src/aggregator.rs
use std::sync::Arc;
use log::{ debug, error, info };
use serde_json::Value;
use crate::models::server::{ ServerConfig, ServerStatus };
use crate::provider::StatusProvider;
use crate::utils::format_address;

/// Label shown while a server answers. The provider has no uptime signal.
pub const ONLINE_LABEL: &str = "Online";

/// Fans out one provider lookup per configured server and collects the
/// normalized results in configuration order.
#[derive(Clone)]
pub struct Aggregator {
    provider: Arc<dyn StatusProvider>,
    servers: Arc<Vec<ServerConfig>>,
    default_port: u16,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn StatusProvider>, servers: Vec<ServerConfig>, default_port: u16) -> Self {
        Self {
            provider,
            servers: Arc::new(servers),
            default_port,
        }
    }

    /// Returns exactly one record per configured server, same order. A lookup
    /// that fails or panics yields a degraded record for that server only.
    pub async fn collect(&self) -> Vec<ServerStatus> {
        let handles: Vec<_> = self.servers
            .iter()
            .cloned()
            .map(|config| {
                let provider = Arc::clone(&self.provider);
                let default_port = self.default_port;
                tokio::spawn(async move { fetch_one(provider.as_ref(), &config, default_port).await })
            })
            .collect();

        let mut statuses = Vec::with_capacity(handles.len());
        for (config, handle) in self.servers.iter().zip(handles) {
            match handle.await {
                Ok(status) => statuses.push(status),
                Err(e) => {
                    error!("Status lookup task for {} aborted: {}", config.host, e);
                    statuses.push(ServerStatus::degraded(config, self.default_port));
                }
            }
        }
        statuses
    }

    pub fn degraded_all(&self) -> Vec<ServerStatus> {
        self.servers
            .iter()
            .map(|config| ServerStatus::degraded(config, self.default_port))
            .collect()
    }
}

async fn fetch_one(provider: &dyn StatusProvider, config: &ServerConfig, default_port: u16) -> ServerStatus {
    match provider.lookup(&config.host).await {
        Ok(payload) => {
            debug!("Server {} data: {}", config.host, payload);
            let status = normalize(config, &payload, default_port);
            info!(
                "Server {} - Online: {}, Players: {}/{}, List: {} players",
                config.host,
                status.online,
                status.players,
                status.max_players,
                status.player_list.len()
            );
            status
        }
        Err(e) => {
            error!("Failed to fetch status for {}: {}", config.host, e);
            ServerStatus::degraded(config, default_port)
        }
    }
}

/// Maps a provider document onto `ServerStatus`. Each field defaults on its
/// own when absent or of the wrong type.
pub fn normalize(config: &ServerConfig, payload: &Value, default_port: u16) -> ServerStatus {
    let online = payload.get("online").and_then(Value::as_bool).unwrap_or(false);
    let players = payload.get("players");

    let player_list = players
        .and_then(|p| p.get("list"))
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(player_name).collect())
        .unwrap_or_default();

    ServerStatus {
        id: config.id.clone(),
        name: config.name.clone(),
        image: config.image.clone(),
        ip: display_address(config, payload, default_port),
        online,
        players: count(players.and_then(|p| p.get("online"))),
        max_players: count(players.and_then(|p| p.get("max"))),
        player_list,
        motd: motd_lines(payload.get("motd")),
        icon: non_empty_str(payload.get("icon")),
        version: non_empty_str(payload.get("version")),
        uptime: online.then(|| ONLINE_LABEL.to_string()),
    }
}

fn count(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(0)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Entries are either bare names or `{ "name": ..., "uuid": ... }` objects.
fn player_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(name) => Some(name.clone()),
        Value::Object(fields) => fields.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn motd_lines(motd: Option<&Value>) -> Vec<String> {
    let Some(motd) = motd else {
        return Vec::new();
    };

    // Only `clean`/`raw` are read; a blank `clean` falls through to `raw`.
    let chosen = match motd {
        Value::Object(fields) => fields
            .get("clean")
            .filter(|v| is_present(v))
            .or_else(|| fields.get("raw").filter(|v| is_present(v))),
        _ => None,
    };

    match chosen {
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(|line| line.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(line)) if !line.is_empty() => vec![line.clone()],
        _ => Vec::new(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn display_address(config: &ServerConfig, payload: &Value, default_port: u16) -> String {
    let port = payload
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .unwrap_or(default_port);

    if let Some(hostname) = non_empty_str(payload.get("hostname")) {
        return format_address(&hostname, port);
    }
    if let Some(ip) = non_empty_str(payload.get("ip")) {
        return format_address(&ip, port);
    }
    format_address(&config.host, default_port)
}
