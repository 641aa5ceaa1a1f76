use serde::Deserialize;

use crate::session::mods;

/// One entry of the initial channel list.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Seconds without a heartbeat before the sweep evicts a session.
    pub session_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    /// Account id the resident bot runs under.
    pub bot_user_id: i32,
    /// Mod bits rejected in status updates.
    pub blocked_mods: u32,
    pub channels: Vec<ChannelConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let channels = match std::env::var("BANCHO_CHANNELS_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .unwrap_or_else(|e| panic!("failed to read BANCHO_CHANNELS_FILE {path}: {e}"));
                serde_json::from_str(&raw)
                    .unwrap_or_else(|e| panic!("BANCHO_CHANNELS_FILE is not a channel list: {e}"))
            }
            Err(_) => Self::default_channels(),
        };

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:bancho.db?mode=rwc".to_string()),
            session_timeout_secs: std::env::var("BANCHO_SESSION_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            sweep_interval_secs: std::env::var("BANCHO_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            bot_user_id: std::env::var("BANCHO_BOT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            blocked_mods: std::env::var("BANCHO_BLOCKED_MODS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(mods::DEFAULT_BLOCKED),
            channels,
        }
    }

    pub fn default_channels() -> Vec<ChannelConfig> {
        vec![
            ChannelConfig {
                name: "#osu".to_string(),
                description: "Main channel".to_string(),
                public: true,
            },
            ChannelConfig {
                name: "#lounge".to_string(),
                description: "Administration channel".to_string(),
                public: false,
            },
        ]
    }
}
