use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DrawPrimitive, GameSettings, RoomSnapshot};

/// Scoreboard entry as broadcast by `game-ended`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub id: String,
    pub nickname: String,
    pub score: i32,
}

/// Winner announcement; the `id` is not on the wire for winners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEntry {
    pub nickname: String,
    pub score: i32,
}

/// Outbound messages on the phase channel. Serialized as
/// `{ "event": "<kebab-case name>", "data": { ... } }` to match the
/// (event, payload) framing of the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PhaseClientMessage {
    JoinRoom { room_code: String, user_id: String },
    StartGame(GameSettings),
    SelectWord { selected_word: String },
    EndRound { reason: String },
    RestartGame,
    LeaveRoom,
}

/// Authoritative inbound events on the phase channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PhaseServerMessage {
    RoomJoined {
        room: RoomSnapshot,
    },
    UserJoined {
        users: Vec<crate::Member>,
    },
    UserLeft {
        users: Vec<crate::Member>,
    },
    GameStarted {
        room: RoomSnapshot,
    },
    /// Drawer only: candidate words for the round.
    WordOptions {
        words: Vec<String>,
    },
    WordSelected {
        room: RoomSnapshot,
        word_display: String,
        round_duration: u64,
        #[serde(default)]
        round_end_time: Option<i64>,
    },
    /// Drawer only: the full word to draw.
    DrawerWord {
        word: String,
    },
    CorrectGuess {
        user_id: String,
        #[serde(default)]
        word: String,
        points: i32,
        total_score: i32,
        #[serde(default)]
        drawer_points: Option<i32>,
        #[serde(default)]
        drawer_score: Option<i32>,
    },
    NewRound {
        room: RoomSnapshot,
    },
    GameEnded {
        room: RoomSnapshot,
        winner: WinnerEntry,
        #[serde(default)]
        winners: Option<Vec<WinnerEntry>>,
        final_scores: Vec<FinalScore>,
    },
    GameRestarted {
        room: RoomSnapshot,
    },
    Error {
        message: String,
    },
}

/// Outbound messages on the drawing channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum DrawClientMessage {
    JoinDrawingRoom {
        room_code: String,
        user_id: String,
        username: String,
    },
    DrawStart {
        x: f64,
        y: f64,
        color: String,
        pen_size: f64,
    },
    DrawMove {
        x: f64,
        y: f64,
        color: String,
        pen_size: f64,
    },
    DrawEnd,
    ClearCanvas,
    ChangeColor {
        color: String,
    },
    ChangePenSize {
        size: f64,
    },
}

/// Inbound events on the drawing channel. Broadcast draw events exclude the
/// sender on the server side; `user_id` identifies the author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum DrawServerMessage {
    /// Catch-up replay sent on join: the full primitive log of the round.
    CanvasState {
        drawings: Vec<DrawPrimitive>,
    },
    CanvasCleared,
    DrawStart {
        x: f64,
        y: f64,
        color: String,
        pen_size: f64,
        user_id: String,
    },
    DrawMove {
        x: f64,
        y: f64,
        color: String,
        pen_size: f64,
        user_id: String,
    },
    DrawEnd {
        user_id: String,
    },
    Error {
        message: String,
    },
}
