use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Wire-level phase of a round. The client keeps a richer tagged state
/// alongside this; snapshot events carry only the flat tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Waiting,
    WordSelection,
    Drawing,
    RoundEnd,
    GameEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub nickname: String,
    pub is_host: bool,
    pub score: i32,
    #[serde(default)]
    pub joined_at: i64,
}

/// Authoritative view of the room. Replaced wholesale by snapshot events
/// (`room-joined`, `game-started`, `new-round`, ...); only membership is
/// ever patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub users: Vec<Member>,
    #[serde(default)]
    pub created_at: i64,
    pub game_started: bool,
    #[serde(default)]
    pub rounds: u32,
    #[serde(default)]
    pub current_round: u32,
    pub current_drawer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_phase: Option<GamePhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_end_time: Option<i64>,
}

impl RoomSnapshot {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn member_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.member(id).is_some_and(|u| u.is_host)
    }

    pub fn is_drawer(&self, id: &str) -> bool {
        self.current_drawer.as_deref() == Some(id)
    }

    pub fn drawer_nickname(&self) -> Option<&str> {
        let drawer = self.current_drawer.as_deref()?;
        self.member(drawer).map(|u| u.nickname.as_str())
    }
}

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS_LIMIT: u32 = 10;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;
pub const MIN_ROUND_DURATION_SECS: u64 = 15;
pub const MAX_ROUND_DURATION_SECS: u64 = 90;

/// Host-configured settings sent with `start-game`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub rounds: u32,
    pub max_players: u32,
    pub round_duration: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            max_players: 8,
            round_duration: 60,
        }
    }
}

impl GameSettings {
    /// Validate settings against the current room occupancy. Returns the
    /// list of user-facing problems; empty means the game may start.
    pub fn validate(&self, current_players: usize) -> Vec<String> {
        let mut errors = Vec::new();

        if current_players < MIN_PLAYERS {
            errors.push(format!("Need at least {MIN_PLAYERS} players to start"));
        }
        if current_players as u32 > self.max_players {
            errors.push(format!(
                "Too many players for current max ({})",
                self.max_players
            ));
        }
        if self.max_players < MIN_PLAYERS as u32 || self.max_players > MAX_PLAYERS_LIMIT {
            errors.push(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS_LIMIT}"
            ));
        }
        if self.rounds < MIN_ROUNDS || self.rounds > MAX_ROUNDS {
            errors.push(format!(
                "Rounds must be between {MIN_ROUNDS} and {MAX_ROUNDS}"
            ));
        }
        if self.round_duration < MIN_ROUND_DURATION_SECS
            || self.round_duration > MAX_ROUND_DURATION_SECS
        {
            errors.push(format!(
                "Round duration must be between {MIN_ROUND_DURATION_SECS} and {MAX_ROUND_DURATION_SECS} seconds"
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, score: i32) -> Member {
        Member {
            id: id.to_string(),
            nickname: id.to_uppercase(),
            is_host: id == "a",
            score,
            joined_at: 0,
        }
    }

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            users: vec![member("a", 10), member("b", 0)],
            created_at: 0,
            game_started: true,
            rounds: 3,
            current_round: 1,
            current_drawer: Some("a".to_string()),
            max_players: Some(8),
            round_duration: Some(60),
            game_phase: Some(GamePhase::Drawing),
            round_start_time: None,
            round_end_time: None,
        }
    }

    #[test]
    fn test_member_lookup() {
        let room = snapshot();
        assert_eq!(room.member("b").unwrap().nickname, "B");
        assert!(room.member("zzz").is_none());
        assert!(room.is_host("a"));
        assert!(!room.is_host("b"));
        assert!(room.is_drawer("a"));
        assert_eq!(room.drawer_nickname(), Some("A"));
    }

    #[test]
    fn test_phase_wire_spelling() {
        let json = serde_json::to_value(GamePhase::WordSelection).unwrap();
        assert_eq!(json, "word-selection");
        let phase: GamePhase = serde_json::from_str("\"round-end\"").unwrap();
        assert_eq!(phase, GamePhase::RoundEnd);
    }

    #[test]
    fn test_settings_defaults_are_valid() {
        let settings = GameSettings::default();
        assert!(settings.validate(2).is_empty());
        assert!(settings.validate(8).is_empty());
    }

    #[test]
    fn test_settings_rejects_underfull_room() {
        let settings = GameSettings::default();
        let errors = settings.validate(1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least 2 players"));
    }

    #[test]
    fn test_settings_rejects_overfull_room() {
        let settings = GameSettings {
            max_players: 2,
            ..GameSettings::default()
        };
        let errors = settings.validate(3);
        assert!(errors.iter().any(|e| e.contains("Too many players")));
    }

    #[test]
    fn test_settings_range_checks() {
        let settings = GameSettings {
            rounds: 11,
            max_players: 12,
            round_duration: 10,
        };
        let errors = settings.validate(2);
        assert_eq!(errors.len(), 3);
    }
}
