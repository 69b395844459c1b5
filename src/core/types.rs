//! Domain types for the mobile access bridge

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Options accepted by `configure`
///
/// All values are raw caller strings; unknown values fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_tls_validation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_features: Option<Vec<String>>,
}

/// Opaque single-use token correlating the two phases of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(uuid::Uuid);

impl ContinuationToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ContinuationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ContinuationToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier for transport connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_token_parses_its_own_display() {
        let token = ContinuationToken::new();
        let parsed: ContinuationToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert_ne!(ContinuationToken::new(), token);
    }

    #[test]
    fn test_continuation_token_rejects_garbage() {
        assert!("not-a-token".parse::<ContinuationToken>().is_err());
        assert!("".parse::<ContinuationToken>().is_err());
    }

    #[test]
    fn test_configure_params_accept_missing_fields() {
        let params: ConfigureParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ConfigureParams::default());

        let params: ConfigureParams = serde_json::from_str(
            r#"{"cloudTlsValidationMode":"allowInvalidCertificate","enabledFeatures":["salto"]}"#,
        )
        .unwrap();
        assert_eq!(
            params.cloud_tls_validation_mode.as_deref(),
            Some("allowInvalidCertificate")
        );
        assert_eq!(params.enabled_features, Some(vec!["salto".to_string()]));
    }
}
