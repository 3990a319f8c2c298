use sketch_types::{GameSettings, MAX_PLAYERS_LIMIT};
use std::env;

/// Client configuration, environment-driven with sensible defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub phase_channel_url: String,
    pub drawing_channel_url: String,
    pub default_rounds: u32,
    pub default_round_duration_secs: u64,
    pub default_max_players: u32,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            phase_channel_url: env::var("GAME_WS_URL")
                .unwrap_or_else(|_| "http://localhost/game".to_string()),
            drawing_channel_url: env::var("DRAWING_WS_URL")
                .unwrap_or_else(|_| "http://localhost/drawing".to_string()),
            default_rounds: env::var("DEFAULT_ROUNDS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid DEFAULT_ROUNDS"),
            default_round_duration_secs: env::var("TURN_DURATION_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid TURN_DURATION_SECONDS"),
            default_max_players: env::var("MAX_PLAYERS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid MAX_PLAYERS"),
        }
    }

    /// Initial host-facing settings derived from this configuration. The
    /// player cap is clamped to the room limit.
    pub fn default_settings(&self) -> GameSettings {
        GameSettings {
            rounds: self.default_rounds,
            max_players: self.default_max_players.min(MAX_PLAYERS_LIMIT),
            round_duration: self.default_round_duration_secs,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
