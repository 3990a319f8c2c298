use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Fixed canvas-logical pixel space. Every coordinate on the wire is
/// expressed in this space regardless of on-screen CSS size.
pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 450.0;

pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_PEN_SIZE: f64 = 5.0;
pub const MIN_PEN_SIZE: f64 = 1.0;
pub const MAX_PEN_SIZE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    DrawStart,
    DrawMove,
    DrawEnd,
    ClearCanvas,
}

/// One atomic drawing instruction, ordered by arrival. Payloads coming off
/// the wire may be sparse (a `draw-end` carries no coordinates), so every
/// field beyond the kind falls back to a default on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DrawPrimitive {
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_pen_size")]
    pub pen_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_pen_size() -> f64 {
    DEFAULT_PEN_SIZE
}

impl DrawPrimitive {
    pub fn start(x: f64, y: f64, color: &str, pen_size: f64, user_id: &str) -> Self {
        Self {
            kind: PrimitiveKind::DrawStart,
            x,
            y,
            color: color.to_string(),
            pen_size,
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn move_to(x: f64, y: f64, color: &str, pen_size: f64, user_id: &str) -> Self {
        Self {
            kind: PrimitiveKind::DrawMove,
            x,
            y,
            color: color.to_string(),
            pen_size,
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn end(user_id: &str) -> Self {
        Self {
            kind: PrimitiveKind::DrawEnd,
            x: 0.0,
            y: 0.0,
            color: default_color(),
            pen_size: DEFAULT_PEN_SIZE,
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn clear(user_id: &str) -> Self {
        Self {
            kind: PrimitiveKind::ClearCanvas,
            x: 0.0,
            y: 0.0,
            color: default_color(),
            pen_size: DEFAULT_PEN_SIZE,
            user_id: Some(user_id.to_string()),
        }
    }
}
