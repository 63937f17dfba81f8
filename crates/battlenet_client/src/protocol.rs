//! Wire envelope for the realtime channel protocol.
//!
//! Every websocket text frame carries exactly one JSON envelope. Channel
//! names are server-defined strings; most are supplied at runtime through the
//! game descriptors, while `updateLeaders` and `redirect` are fixed by the
//! protocol.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

/// Fixed channel announcing which game's leaderboard changed. Shared across
/// all games rather than per-descriptor.
pub const UPDATE_LEADERS_CHANNEL: &str = "updateLeaders";

/// Fixed channel carrying a one-shot navigation instruction.
pub const REDIRECT_CHANNEL: &str = "redirect";

/// One message on the wire, in either direction.
///
/// # Example
///
/// ```json
/// {
///   "event": "updateRoomsInfo_snake",
///   "data": [ { "id": "A", "playersCount": 2 } ]
/// }
/// ```
///
/// Commands without a payload omit `data`; it decodes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// The channel this message belongs to.
    pub event: String,

    /// The payload, opaque to the envelope.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl WireMessage {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// A command envelope with no payload.
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, serde_json::Value::Null)
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_envelope_with_payload() {
        let msg = WireMessage::decode(r#"{"event":"countdown_x","data":42}"#).unwrap();
        assert_eq!(msg.event, "countdown_x");
        assert_eq!(msg.data, serde_json::json!(42));
    }

    #[test]
    fn missing_data_decodes_as_null() {
        let msg = WireMessage::decode(r#"{"event":"leaveRoom"}"#).unwrap();
        assert_eq!(msg.event, "leaveRoom");
        assert!(msg.data.is_null());
    }

    #[test]
    fn bare_command_omits_data_on_the_wire() {
        let text = WireMessage::bare("leaveRoom").encode().unwrap();
        assert_eq!(text, r#"{"event":"leaveRoom"}"#);
    }

    #[test]
    fn envelope_round_trips() {
        let msg = WireMessage::new(
            "onJoinBattle",
            serde_json::json!({ "roomId": 3, "battleName": "snake" }),
        );
        let decoded = WireMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn rejects_frames_without_an_event_name() {
        assert!(WireMessage::decode(r#"{"data":1}"#).is_err());
        assert!(WireMessage::decode("not json").is_err());
    }
}
