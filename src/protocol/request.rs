//! Request message types

use serde::{Deserialize, Serialize};

use crate::core::types::ConfigureParams;

/// Request messages from client to bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "camelCase")]
pub enum Request {
    /// Create the SDK session
    Configure(ConfigureParams),

    SetAutomaticAccessEnabled(EnabledParams),

    SetScanning(EnabledParams),

    SetBackgroundScanningMode(BackgroundScanningModeParams),

    /// Turn an invitation code into a registration URL
    ResolveInvitationUrl(ResolveInvitationUrlParams),

    /// Start registering a credential
    RegisterCredential(RegisterCredentialParams),

    /// Resume a registration waiting for a second factor
    RegisterCredentialContinue(RegisterCredentialContinueParams),

    GetStates,

    GetCredentials,

    DeleteCredential(DeleteCredentialParams),
}

impl Request {
    /// Wire names of every supported method
    pub const METHODS: &'static [&'static str] = &[
        "configure",
        "setAutomaticAccessEnabled",
        "setScanning",
        "setBackgroundScanningMode",
        "resolveInvitationUrl",
        "registerCredential",
        "registerCredentialContinue",
        "getStates",
        "getCredentials",
        "deleteCredential",
    ];

    pub fn is_known_method(method: &str) -> bool {
        Self::METHODS.contains(&method)
    }
}

/// Parameters for the on/off toggles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnabledParams {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackgroundScanningModeParams {
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInvitationUrlParams {
    pub host: String,
    pub invitation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterCredentialParams {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentialContinueParams {
    pub continuation_point: String,
    pub second_factor_selected: bool,
    pub authentication_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCredentialParams {
    pub credential_id: String,
}
