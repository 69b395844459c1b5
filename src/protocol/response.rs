//! Response message types

use serde::{Deserialize, Serialize};

use crate::core::{registration::RegistrationResponse, serializer::CredentialPayload};

/// Successful results returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    /// Acknowledgement of a fire-and-forget command
    Ack(AckResponse),

    /// Registration step result
    Registration(RegistrationResponse),

    /// Single credential, from delete
    Credential(CredentialPayload),

    /// Resolved invitation URL
    Url(String),

    /// Current SDK condition flags
    States(Vec<String>),

    /// Registered credentials
    Credentials(Vec<CredentialPayload>),
}

/// Response for configure and the toggles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

impl Response {
    pub fn ack() -> Self {
        Response::Ack(AckResponse::ok())
    }
}
