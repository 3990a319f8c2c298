pub mod canvas;
pub mod config;
pub mod input;
pub mod phase;
pub mod scores;
pub mod session;
pub mod timer;
pub mod transport;

pub use canvas::{CanvasReplicator, Pixmap, RasterSurface};
pub use config::ClientConfig;
pub use input::{BrushSettings, InputCapture};
pub use phase::{PhaseEffect, RoundPhase, RoundStateMachine};
pub use scores::{RankedScore, ScoreLedger};
pub use session::{RoomSession, SessionEvent};
pub use timer::{GRACE_SECS, GraceCountdown, RoundTimer, TimerUpdate, now_ms};
pub use transport::{DrawTransport, EventHub, PhaseTransport, SubscriptionId, TransportError};
