//! Mapping of caller option strings onto SDK settings
//!
//! Every mapping is exclusive: one input string selects exactly one value.

use std::path::PathBuf;

use tracing::debug;

use crate::{
    core::types::ConfigureParams,
    sdk::types::{
        BackgroundScanMode, CloudTlsValidationMode, SdkConfig, SdkFeature, SecondFactorType,
    },
};

/// Absent or unrecognized modes select the strictest policy
pub fn cloud_tls_validation_mode(name: Option<&str>) -> CloudTlsValidationMode {
    match name {
        Some("anyValidCertificateRequired") => CloudTlsValidationMode::AnyValidCertificateRequired,
        Some("gallagherCertificateRequired") => {
            CloudTlsValidationMode::GallagherCertificateRequired
        }
        Some("allowInvalidCertificate") => CloudTlsValidationMode::AllowInvalidCertificate,
        _ => CloudTlsValidationMode::AnyValidCertificateRequired,
    }
}

pub fn sdk_feature(name: &str) -> Option<SdkFeature> {
    match name {
        "salto" => Some(SdkFeature::Salto),
        "digitalId" => Some(SdkFeature::DigitalId),
        _ => None,
    }
}

pub fn background_scan_mode(name: &str) -> BackgroundScanMode {
    match name {
        "standard" => BackgroundScanMode::BackgroundScreenOn,
        "extended" => BackgroundScanMode::BackgroundLowLatency,
        _ => BackgroundScanMode::ForegroundOnly,
    }
}

/// The biometric aliases exist so callers on every platform can use the
/// name their platform knows; they all select the same SDK type.
pub fn second_factor_type(name: &str) -> SecondFactorType {
    match name {
        "fingerprint" | "faceId" | "fingerprintOrFaceId" | "touchId" => {
            SecondFactorType::Biometric
        }
        _ => SecondFactorType::Pin,
    }
}

/// Build the SDK configuration from raw configure options
pub fn sdk_config(params: &ConfigureParams) -> SdkConfig {
    let enabled_features = params
        .enabled_features
        .iter()
        .flatten()
        .filter_map(|name| {
            let feature = sdk_feature(name);
            if feature.is_none() {
                debug!(feature = %name, "ignoring unknown SDK feature");
            }
            feature
        })
        .collect();

    SdkConfig {
        database_file_path: params.db_file_path.as_ref().map(PathBuf::from),
        cloud_tls_validation_mode: cloud_tls_validation_mode(
            params.cloud_tls_validation_mode.as_deref(),
        ),
        enabled_features,
    }
}
