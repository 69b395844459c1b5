//! Outbound event channel
//!
//! The SDK reports state, reader and access changes through listener
//! callbacks. [`EventChannel`] is registered as all three listeners and
//! republishes every callback as one tagged [`BridgeEvent`] on a broadcast
//! channel that any number of consumers can subscribe to.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::{
    core::{
        error::SdkError,
        serializer::{
            ReaderAttributesPayload, ReaderPayload, access_mode_name, reader_update_type_name,
            sdk_state_names,
        },
    },
    sdk::{
        access_sdk::{AccessListener, ReaderUpdateListener, SdkStateListener},
        types::{AccessResult, MobileAccessState, Reader, ReaderAttributes, ReaderUpdateType},
    },
};

/// Events emitted by the bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "camelCase")]
pub enum BridgeEvent {
    SdkStateChanged(SdkStateChangedParams),
    ReaderUpdated(ReaderUpdatedParams),
    Access(AccessEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SdkStateChangedParams {
    pub is_scanning: bool,
    pub states: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReaderUpdatedParams {
    pub update_type: String,
    pub reader: ReaderAttributesPayload,
}

/// One step in the lifecycle of an access attempt
///
/// `Error` and `Granted`/`Denied` are mutually exclusive terminal steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AccessEvent {
    ReturnToReaderRequired {
        reader: ReaderPayload,
    },
    ReturnToReaderComplete {
        reader: ReaderPayload,
    },
    Started {
        reader: ReaderPayload,
    },
    Error {
        reader: ReaderPayload,
        message: String,
    },
    Granted {
        reader: ReaderPayload,
        message: String,
        code: i32,
        access_mode: String,
    },
    Denied {
        reader: ReaderPayload,
        message: String,
        code: i32,
        access_mode: String,
    },
}

impl AccessEvent {
    /// Terminal event for a completed access attempt
    ///
    /// Returns `None` when the SDK supplied neither a result nor an error.
    pub fn completed(
        reader: &Reader,
        result: Option<&AccessResult>,
        error: Option<&SdkError>,
    ) -> Option<Self> {
        let reader = ReaderPayload::from(reader);
        match (result, error) {
            (_, Some(error)) => Some(AccessEvent::Error {
                reader,
                message: error.message.clone(),
            }),
            (Some(result), None) => {
                let message = result.decision.description.clone();
                let code = result.decision.code;
                let access_mode = access_mode_name(&result.access_mode);
                Some(if result.is_access_granted() {
                    AccessEvent::Granted {
                        reader,
                        message,
                        code,
                        access_mode,
                    }
                } else {
                    AccessEvent::Denied {
                        reader,
                        message,
                        code,
                        access_mode,
                    }
                })
            }
            (None, None) => None,
        }
    }
}

/// Fan-out of SDK listener callbacks onto a broadcast channel
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<BridgeEvent>,
}

impl EventChannel {
    /// Create a channel buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: BridgeEvent) {
        // No subscribers is not an error; events are fire-and-forget.
        if self.tx.send(event).is_err() {
            debug!("event dropped, no subscribers");
        }
    }
}

impl SdkStateListener for EventChannel {
    fn on_state_changed(&self, is_scanning: bool, states: &[MobileAccessState]) {
        debug!(is_scanning, count = states.len(), "sdk state changed");
        self.publish(BridgeEvent::SdkStateChanged(SdkStateChangedParams {
            is_scanning,
            states: sdk_state_names(states),
        }));
    }
}

impl ReaderUpdateListener for EventChannel {
    fn on_reader_updated(&self, reader: &ReaderAttributes, update_type: ReaderUpdateType) {
        self.publish(BridgeEvent::ReaderUpdated(ReaderUpdatedParams {
            update_type: reader_update_type_name(&update_type),
            reader: ReaderAttributesPayload::from(reader),
        }));
    }
}

impl AccessListener for EventChannel {
    fn on_return_to_reader_required(&self, reader: &Reader) {
        self.publish(BridgeEvent::Access(AccessEvent::ReturnToReaderRequired {
            reader: reader.into(),
        }));
    }

    fn on_returned_to_reader(&self, reader: &Reader) {
        self.publish(BridgeEvent::Access(AccessEvent::ReturnToReaderComplete {
            reader: reader.into(),
        }));
    }

    fn on_access_started(&self, reader: &Reader) {
        self.publish(BridgeEvent::Access(AccessEvent::Started {
            reader: reader.into(),
        }));
    }

    fn on_access_completed(
        &self,
        reader: &Reader,
        result: Option<AccessResult>,
        error: Option<SdkError>,
    ) {
        match AccessEvent::completed(reader, result.as_ref(), error.as_ref()) {
            Some(event) => self.publish(BridgeEvent::Access(event)),
            None => error!(
                reader = %reader.id,
                "SDK contract violation: access completed with neither result nor error"
            ),
        }
    }
}
