//! Conversion of SDK records into the stable wire shapes
//!
//! Every enum mapping is total. Values this bridge does not know are emitted
//! as `unknown:<raw>` so newer SDK releases degrade instead of failing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::sdk::types::{
    AccessMode, MobileAccessState, MobileCredential, Reader, ReaderAttributes, ReaderDistance,
    ReaderUpdateType,
};

/// Serialized mobile credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    pub id: String,
    pub facility_id: i64,
    pub facility_name: String,
    pub is_revoked: bool,
    pub registered_date: String,
}

/// Serialized reader identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReaderPayload {
    pub id: String,
    pub name: String,
}

/// Serialized reader with its radio attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReaderAttributesPayload {
    pub id: String,
    pub name: String,
    pub measured_path_loss: f64,
    pub distance: String,
    pub auto_connect_path_loss: f64,
    pub manual_connect_path_loss: f64,
    pub is_ble_manual_connect_enabled: bool,
    pub is_ble_auto_connect_enabled: bool,
    pub is_second_factor_required: bool,
    pub is_ble_actions_enabled: bool,
}

fn unknown(raw: &str) -> String {
    format!("unknown:{raw}")
}

pub fn sdk_state_name(state: &MobileAccessState) -> String {
    use MobileAccessState::*;

    let name = match state {
        ErrorDeviceNotSupported => "errorDeviceNotSupported",
        ErrorNoPasscodeSet => "errorNoPasscodeSet",
        ErrorNoCredentials => "errorNoCredentials",
        ErrorUnsupportedOsVersion => "errorUnsupportedOsVersion",
        ErrorNoBleFeature => "errorNoBleFeature",
        BleErrorLocationServiceDisabled => "bleErrorLocationServiceDisabled",
        BleErrorNoLocationPermission => "bleErrorNoLocationPermission",
        BleWarningExtendedBackgroundScanningRequiresLocationServiceEnabled => {
            "bleWarningExtendedBackgroundScanningRequiresLocationServiceEnabled"
        }
        BleWarningExtendedBackgroundScanningRequiresLocationAlwaysPermission => {
            "bleWarningExtendedBackgroundScanningRequiresLocationAlwaysPermission"
        }
        BleErrorDisabled => "bleErrorDisabled",
        BleErrorUnauthorized => "bleErrorUnauthorized",
        NfcErrorDisabled => "nfcErrorDisabled",
        NoNfcFeature => "noNfcFeature",
        CredentialRequiresBiometricsEnrolment => "credentialRequiresBiometricsEnrolment",
        CredentialBiometricsLockedOut => "credentialBiometricsLockedOut",
        BleErrorNoBackgroundLocationPermission => "bleErrorNoBackgroundLocationPermission",
        Unrecognized(raw) => return unknown(raw),
    };
    name.to_string()
}

pub fn sdk_state_names(states: &[MobileAccessState]) -> Vec<String> {
    states.iter().map(sdk_state_name).collect()
}

pub fn access_mode_name(mode: &AccessMode) -> String {
    match mode {
        AccessMode::Evac => "evac".to_string(),
        AccessMode::Access => "access".to_string(),
        AccessMode::Challenge => "challenge".to_string(),
        AccessMode::Search => "search".to_string(),
        AccessMode::Unrecognized(raw) => unknown(raw),
    }
}

pub fn reader_update_type_name(update_type: &ReaderUpdateType) -> String {
    match update_type {
        ReaderUpdateType::AttributesChanged => "attributesChanged".to_string(),
        ReaderUpdateType::ReaderUnavailable => "readerUnavailable".to_string(),
        ReaderUpdateType::Unrecognized(raw) => unknown(raw),
    }
}

pub fn reader_distance_name(distance: &ReaderDistance) -> String {
    match distance {
        ReaderDistance::Far => "far".to_string(),
        ReaderDistance::Medium => "medium".to_string(),
        ReaderDistance::Near => "near".to_string(),
        ReaderDistance::Unrecognized(raw) => unknown(raw),
    }
}

/// RFC 3339, UTC, second precision
pub fn credential_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&MobileCredential> for CredentialPayload {
    fn from(credential: &MobileCredential) -> Self {
        Self {
            id: credential.id.clone(),
            facility_id: credential.facility_id,
            facility_name: credential.facility_name.clone(),
            is_revoked: credential.is_revoked,
            registered_date: credential_date(&credential.registered_date),
        }
    }
}

impl From<&Reader> for ReaderPayload {
    fn from(reader: &Reader) -> Self {
        Self {
            id: reader.id.clone(),
            name: reader.name.clone(),
        }
    }
}

impl From<&ReaderAttributes> for ReaderAttributesPayload {
    fn from(reader: &ReaderAttributes) -> Self {
        Self {
            id: reader.id.clone(),
            name: reader.name.clone(),
            measured_path_loss: reader.measured_path_loss,
            distance: reader_distance_name(&reader.distance),
            auto_connect_path_loss: reader.auto_connect_path_loss,
            manual_connect_path_loss: reader.manual_connect_path_loss,
            is_ble_manual_connect_enabled: reader.is_ble_manual_connect_enabled,
            is_ble_auto_connect_enabled: reader.is_ble_auto_connect_enabled,
            is_second_factor_required: reader.is_second_factor_required,
            is_ble_actions_enabled: reader.is_ble_actions_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_names() {
        let names = sdk_state_names(&[
            MobileAccessState::ErrorNoCredentials,
            MobileAccessState::BleWarningExtendedBackgroundScanningRequiresLocationServiceEnabled,
            MobileAccessState::CredentialBiometricsLockedOut,
        ]);
        assert_eq!(
            names,
            vec![
                "errorNoCredentials",
                "bleWarningExtendedBackgroundScanningRequiresLocationServiceEnabled",
                "credentialBiometricsLockedOut",
            ]
        );
    }

    #[test]
    fn test_unrecognized_values_are_tagged() {
        assert_eq!(
            sdk_state_name(&MobileAccessState::Unrecognized("WIFI_ERROR".into())),
            "unknown:WIFI_ERROR"
        );
        assert_eq!(
            access_mode_name(&AccessMode::Unrecognized("lockdown".into())),
            "unknown:lockdown"
        );
        assert_eq!(
            reader_update_type_name(&ReaderUpdateType::Unrecognized("3".into())),
            "unknown:3"
        );
        assert_eq!(
            reader_distance_name(&ReaderDistance::Unrecognized("touching".into())),
            "unknown:touching"
        );
    }

    #[test]
    fn test_known_enum_names() {
        assert_eq!(access_mode_name(&AccessMode::Evac), "evac");
        assert_eq!(access_mode_name(&AccessMode::Search), "search");
        assert_eq!(
            reader_update_type_name(&ReaderUpdateType::ReaderUnavailable),
            "readerUnavailable"
        );
        assert_eq!(reader_distance_name(&ReaderDistance::Medium), "medium");
    }

    #[test]
    fn test_credential_wire_shape() {
        let credential = MobileCredential {
            id: "C1".to_string(),
            facility_id: 7,
            facility_name: "HQ".to_string(),
            is_revoked: false,
            registered_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(CredentialPayload::from(&credential)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "C1",
                "facilityId": 7,
                "facilityName": "HQ",
                "isRevoked": false,
                "registeredDate": "2024-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn test_reader_attributes_wire_shape() {
        let reader = ReaderAttributes {
            id: "R1".to_string(),
            name: "Front Door".to_string(),
            measured_path_loss: 62.5,
            distance: ReaderDistance::Near,
            auto_connect_path_loss: 60.0,
            manual_connect_path_loss: 75.0,
            is_ble_manual_connect_enabled: true,
            is_ble_auto_connect_enabled: false,
            is_second_factor_required: true,
            is_ble_actions_enabled: false,
        };

        let value = serde_json::to_value(ReaderAttributesPayload::from(&reader)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "R1",
                "name": "Front Door",
                "measuredPathLoss": 62.5,
                "distance": "near",
                "autoConnectPathLoss": 60.0,
                "manualConnectPathLoss": 75.0,
                "isBleManualConnectEnabled": true,
                "isBleAutoConnectEnabled": false,
                "isSecondFactorRequired": true,
                "isBleActionsEnabled": false,
            })
        );
    }
}
