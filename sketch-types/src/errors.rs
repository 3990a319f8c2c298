use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    Phase,
    Drawing,
}

/// Client-side error classification. Connection and protocol errors are
/// surfaced to the UI; malformed streams are recovered silently and state
/// desyncs are resolved by trusting the latest authoritative snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientError {
    ConnectionLost { channel: ChannelKind },
    Protocol { message: String },
    MalformedStream { detail: String },
    StateDesync { detail: String },
}
