//! JSON-RPC 2.0 message envelope

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    core::{error::BridgeError, events::BridgeEvent},
    protocol::{request::Request, response::Response},
};

/// JSON-RPC 2.0 request wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub request: Request,
    pub id: RequestId,
}

/// JSON-RPC 2.0 response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

/// JSON-RPC 2.0 notification wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub notification: BridgeEvent,
}

/// Request ID (number, string, or null when the request id is unreadable)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Bridge error kinds
    pub const NOT_CONFIGURED: i32 = -32001;
    pub const INVALID_CONTINUATION_POINT: i32 = -32002;
    pub const REGISTRATION_FAILED: i32 = -32003;
    pub const DELETE_FAILED: i32 = -32004;

    pub fn parse_error() -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found() -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
            data: None,
        }
    }

    /// Error object for a failed bridge command, tagged with its stable kind
    pub fn from_bridge(error: &BridgeError) -> Self {
        let code = match error {
            BridgeError::NotConfigured => Self::NOT_CONFIGURED,
            BridgeError::InvalidArgument(_) => Self::INVALID_PARAMS,
            BridgeError::InvalidContinuationPoint => Self::INVALID_CONTINUATION_POINT,
            BridgeError::RegistrationFailed(_) => Self::REGISTRATION_FAILED,
            BridgeError::DeleteFailed(_) => Self::DELETE_FAILED,
            BridgeError::ContractViolation(_) => Self::INTERNAL_ERROR,
        };
        Self {
            code,
            message: error.to_string(),
            data: Some(json!({ "kind": error.kind() })),
        }
    }

    /// The stable error kind, if this error came from the bridge
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl JsonRpcRequest {
    pub fn new(request: Request, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            request,
            id,
        }
    }

    /// Parse one line of client input
    ///
    /// On failure returns the error response to send back. The id is echoed
    /// when it can be read and is `null` otherwise.
    pub fn parse(line: &str) -> Result<Self, JsonRpcResponse> {
        let value: Value = serde_json::from_str(line)
            .map_err(|_| JsonRpcResponse::error(JsonRpcError::parse_error(), RequestId::Null))?;

        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok())
            .unwrap_or(RequestId::Null);

        if let Some(method) = value.get("method").and_then(Value::as_str) {
            if !Request::is_known_method(method) {
                return Err(JsonRpcResponse::error(JsonRpcError::method_not_found(), id));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| JsonRpcResponse::error(JsonRpcError::invalid_request(e.to_string()), id))
    }
}

impl JsonRpcResponse {
    pub fn success(result: Response, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

impl JsonRpcNotification {
    pub fn new(notification: BridgeEvent) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            notification,
        }
    }
}

impl From<BridgeEvent> for JsonRpcNotification {
    fn from(event: BridgeEvent) -> Self {
        Self::new(event)
    }
}
