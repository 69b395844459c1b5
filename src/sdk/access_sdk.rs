//! Mobile access SDK trait definitions

use std::sync::Arc;

use trait_variant::make;
use url::Url;

use crate::{
    core::error::{SdkError, SdkResult},
    sdk::types::{
        AccessResult, BackgroundScanMode, MobileAccessState, MobileCredential, Reader,
        ReaderAttributes, ReaderUpdateType, SdkConfig, SecondFactorType,
    },
};

/// Callback the SDK hands out when a registration needs a second factor
///
/// Invoking it with the user's decision resumes the suspended registration.
pub type SecondFactorSelector = Box<dyn FnOnce(bool, SecondFactorType) + Send>;

/// Creates the process-wide SDK instance
pub trait SdkProvider: Send + Sync + 'static {
    type Sdk: MobileAccess;

    /// Configure the SDK and return its handle
    fn configure(&self, config: &SdkConfig) -> Arc<Self::Sdk>;
}

/// Abstraction over the vendor mobile access SDK
///
/// Commands return immediately; results of long-running operations are
/// delivered later on an SDK-owned thread through the listener traits below.
/// This trait enables testing by allowing simulated implementations.
#[make(Send)]
pub trait MobileAccess: Send + Sync + 'static {
    fn set_automatic_access_enabled(&self, enabled: bool);

    fn set_scanning(&self, enabled: bool);

    fn set_background_scan_mode(&self, mode: BackgroundScanMode);

    /// Build the registration URL for an invitation code issued by `host`
    ///
    /// Returns `None` when host or code cannot form a valid URL.
    fn resolve_invitation_url(&self, host: &str, invitation_code: &str) -> Option<Url>;

    /// Start registering the credential behind `url`
    ///
    /// The listener is called back exactly once with a terminal outcome, and
    /// possibly once before that to request a second factor.
    fn register_credential(&self, url: Url, listener: Arc<dyn RegistrationListener>);

    fn mobile_credentials(&self) -> Vec<MobileCredential>;

    fn mobile_access_states(&self) -> Vec<MobileAccessState>;

    /// Delete a credential, resolving with the deleted record
    async fn delete_mobile_credential(
        &self,
        credential: &MobileCredential,
    ) -> SdkResult<MobileCredential>;

    fn add_sdk_state_listener(&self, listener: Arc<dyn SdkStateListener>);

    fn add_reader_update_listener(&self, listener: Arc<dyn ReaderUpdateListener>);

    fn add_automatic_access_listener(&self, listener: Arc<dyn AccessListener>);
}

/// Receives the progress of one credential registration
pub trait RegistrationListener: Send + Sync {
    /// Terminal callback. Exactly one of `credential` and `error` is set.
    fn on_registration_completed(
        &self,
        credential: Option<MobileCredential>,
        error: Option<SdkError>,
    );

    fn on_authentication_type_selection_requested(&self, selector: SecondFactorSelector);
}

pub trait SdkStateListener: Send + Sync {
    fn on_state_changed(&self, is_scanning: bool, states: &[MobileAccessState]);
}

pub trait ReaderUpdateListener: Send + Sync {
    fn on_reader_updated(&self, reader: &ReaderAttributes, update_type: ReaderUpdateType);
}

/// Lifecycle of access attempts against a reader
pub trait AccessListener: Send + Sync {
    fn on_return_to_reader_required(&self, reader: &Reader);

    fn on_returned_to_reader(&self, reader: &Reader);

    fn on_access_started(&self, reader: &Reader);

    /// Terminal callback. Exactly one of `result` and `error` is set.
    fn on_access_completed(
        &self,
        reader: &Reader,
        result: Option<AccessResult>,
        error: Option<SdkError>,
    );
}
