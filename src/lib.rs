//! Mobile Access Bridge
//!
//! Exposes a vendor mobile access SDK to a host application:
//! - credential registration, including a two-step second-factor flow
//! - credential listing and deletion
//! - SDK state, reader and access events
//!
//! Commands and events travel as JSON-RPC 2.0 over a Unix domain socket.

pub mod config;
pub mod core;
pub mod protocol;
pub mod sdk;
pub mod transport;

pub use core::{
    bridge::MobileAccessBridge,
    error::{BridgeError, SdkError, TransportError},
    events::{AccessEvent, BridgeEvent},
    registration::RegistrationResponse,
    serializer::CredentialPayload,
};
