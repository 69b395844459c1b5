//! Native types of the mobile access SDK
//!
//! These mirror the records and enumerations the SDK hands to its listeners.
//! Enumerations carry an `Unrecognized` variant holding the raw value so that
//! values added by newer SDK releases can still be represented.

use std::{collections::BTreeSet, path::PathBuf};

use chrono::{DateTime, Utc};

/// Condition flags reported by the SDK (errors and warnings)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MobileAccessState {
    ErrorDeviceNotSupported,
    ErrorNoPasscodeSet,
    ErrorNoCredentials,
    ErrorUnsupportedOsVersion,
    ErrorNoBleFeature,
    BleErrorLocationServiceDisabled,
    BleErrorNoLocationPermission,
    BleWarningExtendedBackgroundScanningRequiresLocationServiceEnabled,
    BleWarningExtendedBackgroundScanningRequiresLocationAlwaysPermission,
    BleErrorDisabled,
    BleErrorUnauthorized,
    NfcErrorDisabled,
    NoNfcFeature,
    CredentialRequiresBiometricsEnrolment,
    CredentialBiometricsLockedOut,
    BleErrorNoBackgroundLocationPermission,
    Unrecognized(String),
}

/// Mode a reader was operating in when an access decision was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMode {
    Evac,
    Access,
    Challenge,
    Search,
    Unrecognized(String),
}

/// Kind of reader update delivered to reader listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderUpdateType {
    AttributesChanged,
    ReaderUnavailable,
    Unrecognized(String),
}

/// Coarse distance bucket derived from the measured path loss
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderDistance {
    Far,
    Medium,
    Near,
    Unrecognized(String),
}

/// A registered mobile credential
#[derive(Debug, Clone, PartialEq)]
pub struct MobileCredential {
    pub id: String,
    pub facility_id: i64,
    pub facility_name: String,
    pub is_revoked: bool,
    pub registered_date: DateTime<Utc>,
}

/// Identity of an access-control reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader {
    pub id: String,
    pub name: String,
}

/// Live radio attributes of a reader in range
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderAttributes {
    pub id: String,
    pub name: String,
    /// Measured path loss in dB
    pub measured_path_loss: f64,
    pub distance: ReaderDistance,
    pub auto_connect_path_loss: f64,
    pub manual_connect_path_loss: f64,
    pub is_ble_manual_connect_enabled: bool,
    pub is_ble_auto_connect_enabled: bool,
    pub is_second_factor_required: bool,
    pub is_ble_actions_enabled: bool,
}

/// Access decision code and its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub code: i32,
    pub description: String,
}

/// Outcome of a completed access attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessResult {
    pub granted: bool,
    pub decision: AccessDecision,
    pub access_mode: AccessMode,
}

impl AccessResult {
    pub fn is_access_granted(&self) -> bool {
        self.granted
    }
}

/// TLS policy applied to the SDK's cloud connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudTlsValidationMode {
    #[default]
    AnyValidCertificateRequired,
    GallagherCertificateRequired,
    AllowInvalidCertificate,
}

/// Optional SDK capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SdkFeature {
    Salto,
    DigitalId,
}

/// Bluetooth scanning behaviour while the host app is not in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundScanMode {
    /// Scan only while the app is in the foreground
    ForegroundOnly,
    /// Keep scanning in the background while the screen is on
    BackgroundScreenOn,
    /// Low-latency background scanning
    BackgroundLowLatency,
}

/// Second factor the user chose for a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondFactorType {
    Pin,
    /// Fingerprint or face recognition, whichever the device offers
    Biometric,
}

/// Configuration handed to the SDK provider on first configure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdkConfig {
    pub database_file_path: Option<PathBuf>,
    pub cloud_tls_validation_mode: CloudTlsValidationMode,
    pub enabled_features: BTreeSet<SdkFeature>,
}
