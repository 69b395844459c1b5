//! Protocol message definitions

pub mod jsonrpc;
pub mod notification;
pub mod request;
pub mod response;

pub use {
    jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId},
    notification::Notification,
    request::{
        BackgroundScanningModeParams, DeleteCredentialParams, EnabledParams,
        RegisterCredentialContinueParams, RegisterCredentialParams, Request,
        ResolveInvitationUrlParams,
    },
    response::{AckResponse, Response},
};
