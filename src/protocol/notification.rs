//! Notification message types (bridge-to-client events)
//!
//! Notifications are the bridge events themselves: the `method` tag names the
//! event and `params` carries its payload.

pub use crate::core::events::{
    AccessEvent, BridgeEvent as Notification, ReaderUpdatedParams, SdkStateChangedParams,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::serializer::ReaderPayload, protocol::jsonrpc::JsonRpcNotification};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_access_notification_envelope() {
        let notif = JsonRpcNotification::from(Notification::Access(AccessEvent::Error {
            reader: ReaderPayload {
                id: "R1".to_string(),
                name: "Lobby".to_string(),
            },
            message: "Bluetooth connection lost".to_string(),
        }));

        assert_eq!(
            serde_json::to_value(&notif).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "access",
                "params": {
                    "event": "error",
                    "reader": {"id": "R1", "name": "Lobby"},
                    "message": "Bluetooth connection lost",
                },
            })
        );
    }

    #[test]
    fn test_state_notification_round_trip() {
        let json = r#"{"jsonrpc":"2.0","method":"sdkStateChanged","params":{"isScanning":true,"states":["noNfcFeature"]}}"#;
        let notif: JsonRpcNotification = serde_json::from_str(json).unwrap();
        assert_eq!(
            notif.notification,
            Notification::SdkStateChanged(SdkStateChangedParams {
                is_scanning: true,
                states: vec!["noNfcFeature".to_string()],
            })
        );
    }
}
