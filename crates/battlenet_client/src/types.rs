//! Data model shared with the battlenet server.

use serde::{Deserialize, Serialize};

/// Per-game channel naming, supplied by the games-list REST endpoint.
///
/// Channel names are chosen by the server; the client treats them as opaque
/// strings and never synthesizes them. Descriptors are immutable once
/// received and are handed to the subscription coordinator in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDescriptor {
    /// Game identity used in join/leave commands and leaderboard updates.
    pub name: String,

    /// Channel carrying full room snapshots for this game.
    pub update_rooms_info_event_name: String,

    /// Channel carrying countdown ticks for this game.
    pub notify_countdown: String,
}

/// Opaque room payload broadcast on a game's room-update channel.
///
/// The realtime core forwards these untouched; only application code knows
/// their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomInfo(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_decodes_from_server_json() {
        let json = r#"{
            "name": "snake",
            "updateRoomsInfoEventName": "updateRoomsInfo_snake",
            "notifyCountdown": "notifyCountdown_snake"
        }"#;
        let descriptor: GameDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.name, "snake");
        assert_eq!(descriptor.update_rooms_info_event_name, "updateRoomsInfo_snake");
        assert_eq!(descriptor.notify_countdown, "notifyCountdown_snake");
    }

    #[test]
    fn room_info_is_transparent_over_its_payload() {
        let room: RoomInfo =
            serde_json::from_str(r#"{"id":"A","playersCount":2}"#).unwrap();
        assert_eq!(room.0["id"], "A");
        assert_eq!(
            serde_json::to_value(&room).unwrap(),
            serde_json::json!({"id":"A","playersCount":2})
        );
    }
}
