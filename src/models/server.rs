// src/models/server.rs
use serde::{Deserialize, Serialize};

/// One configured game server. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub id: String,
    pub name: String,
    pub image: String,
    pub host: String,
}

/// Normalized status of one configured server for a single fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub id: String,
    pub name: String,
    pub image: String,
    pub ip: String,
    pub online: bool,
    pub players: u64,
    pub max_players: u64,
    #[serde(default)]
    pub player_list: Vec<String>,
    #[serde(default)]
    pub motd: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

impl ServerStatus {
    /// Record used whenever a server cannot be reached or its lookup fails.
    pub fn degraded(config: &ServerConfig, default_port: u16) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            image: config.image.clone(),
            ip: format!("{}:{}", config.host, default_port),
            online: false,
            players: 0,
            max_players: 0,
            player_list: Vec::new(),
            motd: Vec::new(),
            icon: None,
            version: None,
            uptime: None,
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub servers: Vec<ServerStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            id: "survival".to_string(),
            name: "Survival".to_string(),
            image: "/survival.png".to_string(),
            host: "play.example.net".to_string(),
        }
    }

    #[test]
    fn degraded_record_is_offline_and_empty() {
        let status = ServerStatus::degraded(&config(), 25565);
        assert_eq!(status.id, "survival");
        assert_eq!(status.ip, "play.example.net:25565");
        assert!(!status.online);
        assert_eq!(status.players, 0);
        assert_eq!(status.max_players, 0);
        assert!(status.player_list.is_empty());
        assert!(status.motd.is_empty());
        assert_eq!(status.uptime, None);
    }

    #[test]
    fn serializes_camel_case_and_skips_missing_uptime() {
        let json = serde_json::to_value(ServerStatus::degraded(&config(), 25565)).unwrap();
        assert_eq!(json["maxPlayers"], 0);
        assert_eq!(json["playerList"], serde_json::json!([]));
        assert_eq!(json["motd"], serde_json::json!([]));
        assert!(json["icon"].is_null());
        assert!(json.get("uptime").is_none());
    }
}
