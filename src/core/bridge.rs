//! Main mobile access bridge facade

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    core::{
        error::{BridgeError, BridgeResult},
        events::{BridgeEvent, EventChannel},
        options,
        registration::{ContinuationTable, PendingRegistration, RegistrationResponse},
        serializer::{CredentialPayload, sdk_state_names},
        types::{ConfigureParams, ContinuationToken},
    },
    sdk::access_sdk::{MobileAccess, SdkProvider},
};

/// State that exists once `configure` has run
struct Session<S> {
    sdk: Arc<S>,
}

/// Main mobile access bridge facade
///
/// Owns the single SDK session, the table of registrations awaiting a
/// second factor, and the outbound event channel. Share it behind an `Arc`
/// and pass it to whatever transports the commands.
pub struct MobileAccessBridge<P: SdkProvider> {
    provider: P,
    session: OnceLock<Session<P::Sdk>>,
    registrations: Arc<ContinuationTable>,
    events: EventChannel,
}

impl<P: SdkProvider> MobileAccessBridge<P> {
    /// Create an unconfigured bridge
    pub fn new(provider: P, continuation_ttl: Duration, event_capacity: usize) -> Self {
        Self {
            provider,
            session: OnceLock::new(),
            registrations: ContinuationTable::new(continuation_ttl),
            events: EventChannel::new(event_capacity),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.session.get().is_some()
    }

    /// Subscribe to state, reader and access events
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Registrations that can currently be resumed
    pub fn pending_registrations(&self) -> &ContinuationTable {
        &self.registrations
    }

    fn sdk(&self) -> BridgeResult<&Arc<P::Sdk>> {
        self.session
            .get()
            .map(|session| &session.sdk)
            .ok_or(BridgeError::NotConfigured)
    }

    /// Configure the SDK and hook its listeners
    ///
    /// Only the first call has an effect. Later calls are logged and ignored,
    /// which tolerates a host that reloads its scripting environment.
    pub fn configure(&self, params: &ConfigureParams) {
        let mut created = false;
        self.session.get_or_init(|| {
            created = true;
            let config = options::sdk_config(params);
            info!(?config, "Configuring mobile access SDK");

            let sdk = self.provider.configure(&config);
            let listener = Arc::new(self.events.clone());
            sdk.add_sdk_state_listener(listener.clone());
            sdk.add_reader_update_listener(listener.clone());
            sdk.add_automatic_access_listener(listener);
            Session { sdk }
        });

        if !created {
            debug!("Already configured; assuming a reload of the host environment");
        }
    }

    pub fn set_automatic_access_enabled(&self, enabled: bool) {
        if let Ok(sdk) = self.sdk() {
            sdk.set_automatic_access_enabled(enabled);
        }
    }

    pub fn set_scanning(&self, enabled: bool) {
        if let Ok(sdk) = self.sdk() {
            sdk.set_scanning(enabled);
        }
    }

    pub fn set_background_scanning_mode(&self, mode: &str) {
        if let Ok(sdk) = self.sdk() {
            let mode = options::background_scan_mode(mode);
            debug!(?mode, "Setting background scan mode");
            sdk.set_background_scan_mode(mode);
        }
    }

    /// Resolve an invitation code into a registration URL
    pub fn resolve_invitation_url(
        &self,
        host: &str,
        invitation_code: &str,
    ) -> BridgeResult<String> {
        let sdk = self.sdk()?;
        sdk.resolve_invitation_url(host, invitation_code)
            .map(|url| url.to_string())
            .ok_or_else(|| BridgeError::invalid_arg("host or invitationCode was invalid"))
    }

    /// Start registering the credential behind `url`
    ///
    /// Resolves once the SDK reports completion, or as soon as it asks for a
    /// second factor, in which case the response carries the continuation
    /// point for [`Self::register_credential_continue`].
    pub async fn register_credential(&self, url: &str) -> BridgeResult<RegistrationResponse> {
        let sdk = self.sdk()?;
        let url = Url::parse(url).map_err(|_| BridgeError::invalid_arg("url was invalid"))?;

        let (tx, rx) = oneshot::channel();
        let registration =
            PendingRegistration::new(ContinuationToken::new(), tx, self.registrations.cleanup());
        self.registrations.insert(&registration);

        info!(token = %registration.token(), %url, "Registering credential");
        sdk.register_credential(url, registration);

        Self::completion(rx).await
    }

    /// Resume a registration that is waiting for a second-factor decision
    ///
    /// The continuation point is consumed whether or not the registration
    /// eventually succeeds.
    pub async fn register_credential_continue(
        &self,
        continuation_point: &str,
        second_factor_selected: bool,
        authentication_type: &str,
    ) -> BridgeResult<RegistrationResponse> {
        let token: ContinuationToken = continuation_point
            .parse()
            .map_err(|_| BridgeError::InvalidContinuationPoint)?;
        let factor = options::second_factor_type(authentication_type);

        let (tx, rx) = oneshot::channel();
        let selector = self
            .registrations
            .resume(&token, tx)
            .map_err(|_| BridgeError::InvalidContinuationPoint)?;

        info!(%token, second_factor_selected, ?factor, "Resuming registration");
        selector(second_factor_selected, factor);

        Self::completion(rx).await
    }

    async fn completion(
        rx: oneshot::Receiver<BridgeResult<RegistrationResponse>>,
    ) -> BridgeResult<RegistrationResponse> {
        rx.await.unwrap_or_else(|_| {
            warn!("Registration dropped by the SDK without a result");
            Err(BridgeError::RegistrationFailed(
                "registration was abandoned before it completed".to_string(),
            ))
        })
    }

    /// Current SDK condition flags
    pub fn states(&self) -> BridgeResult<Vec<String>> {
        let sdk = self.sdk()?;
        Ok(sdk_state_names(&sdk.mobile_access_states()))
    }

    /// Credentials currently registered on this device
    pub fn credentials(&self) -> BridgeResult<Vec<CredentialPayload>> {
        let sdk = self.sdk()?;
        Ok(sdk
            .mobile_credentials()
            .iter()
            .map(CredentialPayload::from)
            .collect())
    }

    /// Delete a registered credential by id
    pub async fn delete_credential(&self, credential_id: &str) -> BridgeResult<CredentialPayload> {
        let sdk = self.sdk()?;
        let candidate = sdk
            .mobile_credentials()
            .into_iter()
            .find(|credential| credential.id == credential_id)
            .ok_or_else(|| BridgeError::invalid_arg("credentialId was invalid"))?;

        let deleted = sdk
            .delete_mobile_credential(&candidate)
            .await
            .map_err(|e| {
                warn!(credential = %credential_id, error = %e, "Credential delete failed");
                BridgeError::DeleteFailed(e.message)
            })?;

        info!(credential = %deleted.id, "Credential deleted");
        Ok(CredentialPayload::from(&deleted))
    }
}
