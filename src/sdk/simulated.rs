//! Simulated mobile access SDK
//!
//! Stands in for the vendor SDK during development and testing. Registration
//! outcomes are scripted, and reader/access events can be injected.

use std::{collections::VecDeque, sync::Arc, thread};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use crate::{
    core::error::{SdkError, SdkResult},
    sdk::{
        access_sdk::{
            AccessListener, MobileAccess, ReaderUpdateListener, RegistrationListener,
            SdkProvider, SdkStateListener,
        },
        types::{
            AccessResult, BackgroundScanMode, MobileAccessState, MobileCredential, Reader,
            ReaderAttributes, ReaderUpdateType, SdkConfig, SecondFactorType,
        },
    },
};

/// Terminal result the simulated SDK reports for a registration
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Succeed(MobileCredential),
    Fail(String),
    /// Terminal callback with neither credential nor error (a broken SDK)
    Malformed,
}

/// Script for the next registration attempt
#[derive(Debug, Clone)]
pub enum RegistrationScript {
    /// Report the outcome without asking for a second factor
    Immediate(RegistrationOutcome),
    /// Ask for a second factor, then report the outcome once selected
    SecondFactor(RegistrationOutcome),
    /// Keep the listener so a test can drive it by hand
    Hold,
}

struct SimulatedState {
    credentials: Vec<MobileCredential>,
    states: Vec<MobileAccessState>,
    scanning: bool,
    automatic_access_enabled: bool,
    background_scan_mode: BackgroundScanMode,
    scripts: VecDeque<RegistrationScript>,
    held: Vec<(Url, Arc<dyn RegistrationListener>)>,
    second_factor_choices: Vec<(bool, SecondFactorType)>,
    delete_failure: Option<String>,
    delete_calls: usize,
    second_factor_required: bool,
    state_listeners: Vec<Arc<dyn SdkStateListener>>,
    reader_listeners: Vec<Arc<dyn ReaderUpdateListener>>,
    access_listeners: Vec<Arc<dyn AccessListener>>,
}

/// In-process simulation of the mobile access SDK
///
/// Registration callbacks are delivered on a separate thread, like the
/// vendor SDK does. Listener notifications triggered by commands or `emit_*`
/// helpers are delivered synchronously on the calling thread.
pub struct SimulatedSdk {
    inner: Arc<Mutex<SimulatedState>>,
}

impl SimulatedSdk {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimulatedState {
                credentials: vec![],
                states: vec![],
                scanning: false,
                automatic_access_enabled: false,
                background_scan_mode: BackgroundScanMode::ForegroundOnly,
                scripts: VecDeque::new(),
                held: vec![],
                second_factor_choices: vec![],
                delete_failure: None,
                delete_calls: 0,
                second_factor_required: false,
                state_listeners: vec![],
                reader_listeners: vec![],
                access_listeners: vec![],
            })),
        }
    }

    /// Replace the stored credentials
    pub fn set_credentials(&self, credentials: Vec<MobileCredential>) {
        self.inner.lock().credentials = credentials;
    }

    /// Replace the reported condition flags
    pub fn set_states(&self, states: Vec<MobileAccessState>) {
        self.inner.lock().states = states;
    }

    /// Queue the behaviour of the next registration
    ///
    /// Without a queued script a registration succeeds with a fresh credential,
    /// after a second-factor request if [`Self::set_second_factor_required`] is on.
    pub fn push_registration(&self, script: RegistrationScript) {
        self.inner.lock().scripts.push_back(script);
    }

    /// Ask for a second factor on registrations without a queued script
    pub fn set_second_factor_required(&self, required: bool) {
        self.inner.lock().second_factor_required = required;
    }

    /// Make subsequent deletes fail with `message`
    pub fn set_delete_failure(&self, message: Option<String>) {
        self.inner.lock().delete_failure = message;
    }

    /// Take the listeners of registrations scripted with [`RegistrationScript::Hold`]
    pub fn take_held_registrations(&self) -> Vec<(Url, Arc<dyn RegistrationListener>)> {
        std::mem::take(&mut self.inner.lock().held)
    }

    /// Second-factor decisions received through selectors, in order
    pub fn second_factor_choices(&self) -> Vec<(bool, SecondFactorType)> {
        self.inner.lock().second_factor_choices.clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.lock().delete_calls
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.lock().scanning
    }

    pub fn is_automatic_access_enabled(&self) -> bool {
        self.inner.lock().automatic_access_enabled
    }

    pub fn background_scan_mode(&self) -> BackgroundScanMode {
        self.inner.lock().background_scan_mode
    }

    /// Number of registered (state, reader, access) listeners
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        let state = self.inner.lock();
        (
            state.state_listeners.len(),
            state.reader_listeners.len(),
            state.access_listeners.len(),
        )
    }

    /// Notify state listeners with the current scanning flag and states
    pub fn emit_state_change(&self) {
        let (listeners, scanning, states) = {
            let state = self.inner.lock();
            (
                state.state_listeners.clone(),
                state.scanning,
                state.states.clone(),
            )
        };
        for listener in listeners {
            listener.on_state_changed(scanning, &states);
        }
    }

    pub fn emit_reader_update(&self, reader: &ReaderAttributes, update_type: ReaderUpdateType) {
        let listeners = self.inner.lock().reader_listeners.clone();
        for listener in listeners {
            listener.on_reader_updated(reader, update_type.clone());
        }
    }

    pub fn emit_return_to_reader_required(&self, reader: &Reader) {
        for listener in self.access_listeners() {
            listener.on_return_to_reader_required(reader);
        }
    }

    pub fn emit_returned_to_reader(&self, reader: &Reader) {
        for listener in self.access_listeners() {
            listener.on_returned_to_reader(reader);
        }
    }

    pub fn emit_access_started(&self, reader: &Reader) {
        for listener in self.access_listeners() {
            listener.on_access_started(reader);
        }
    }

    pub fn emit_access_completed(
        &self,
        reader: &Reader,
        result: Option<AccessResult>,
        error: Option<SdkError>,
    ) {
        for listener in self.access_listeners() {
            listener.on_access_completed(reader, result.clone(), error.clone());
        }
    }

    fn access_listeners(&self) -> Vec<Arc<dyn AccessListener>> {
        self.inner.lock().access_listeners.clone()
    }

    fn credential_for(url: &Url) -> MobileCredential {
        MobileCredential {
            id: uuid::Uuid::new_v4().to_string(),
            facility_id: 1,
            facility_name: url.host_str().unwrap_or("facility").to_string(),
            is_revoked: false,
            registered_date: Utc::now(),
        }
    }

    fn delete_now(&self, credential: &MobileCredential) -> SdkResult<MobileCredential> {
        let mut state = self.inner.lock();
        state.delete_calls += 1;
        if let Some(message) = &state.delete_failure {
            return Err(SdkError::new(message.clone()));
        }
        state.credentials.retain(|c| c.id != credential.id);
        Ok(credential.clone())
    }

    /// Deliver a terminal registration callback
    fn complete(
        inner: &Arc<Mutex<SimulatedState>>,
        listener: &Arc<dyn RegistrationListener>,
        outcome: RegistrationOutcome,
    ) {
        match outcome {
            RegistrationOutcome::Succeed(credential) => {
                inner.lock().credentials.push(credential.clone());
                listener.on_registration_completed(Some(credential), None);
            }
            RegistrationOutcome::Fail(message) => {
                listener.on_registration_completed(None, Some(SdkError::new(message)));
            }
            RegistrationOutcome::Malformed => listener.on_registration_completed(None, None),
        }
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileAccess for SimulatedSdk {
    fn set_automatic_access_enabled(&self, enabled: bool) {
        self.inner.lock().automatic_access_enabled = enabled;
    }

    fn set_scanning(&self, enabled: bool) {
        let changed = {
            let mut state = self.inner.lock();
            let changed = state.scanning != enabled;
            state.scanning = enabled;
            changed
        };
        if changed {
            self.emit_state_change();
        }
    }

    fn set_background_scan_mode(&self, mode: BackgroundScanMode) {
        self.inner.lock().background_scan_mode = mode;
    }

    fn resolve_invitation_url(&self, host: &str, invitation_code: &str) -> Option<Url> {
        let host = host.trim();
        let code_ok = !invitation_code.is_empty()
            && invitation_code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if host.is_empty() || !code_ok {
            return None;
        }
        let url = Url::parse(&format!("https://{host}/api/invitations/{invitation_code}")).ok()?;
        url.host_str()?;
        Some(url)
    }

    fn register_credential(&self, url: Url, listener: Arc<dyn RegistrationListener>) {
        let script = {
            let mut state = self.inner.lock();
            match state.scripts.pop_front() {
                Some(RegistrationScript::Hold) => {
                    state.held.push((url, listener));
                    return;
                }
                Some(script) => script,
                None => {
                    let outcome = RegistrationOutcome::Succeed(Self::credential_for(&url));
                    if state.second_factor_required {
                        RegistrationScript::SecondFactor(outcome)
                    } else {
                        RegistrationScript::Immediate(outcome)
                    }
                }
            }
        };
        debug!(%url, "simulated registration started");

        let inner = self.inner.clone();
        thread::spawn(move || match script {
            RegistrationScript::Immediate(outcome) => Self::complete(&inner, &listener, outcome),
            RegistrationScript::SecondFactor(outcome) => {
                let resumed = listener.clone();
                let state = inner.clone();
                listener.on_authentication_type_selection_requested(Box::new(
                    move |selected, factor| {
                        state.lock().second_factor_choices.push((selected, factor));
                        thread::spawn(move || Self::complete(&state, &resumed, outcome));
                    },
                ));
            }
            RegistrationScript::Hold => {}
        });
    }

    fn mobile_credentials(&self) -> Vec<MobileCredential> {
        self.inner.lock().credentials.clone()
    }

    fn mobile_access_states(&self) -> Vec<MobileAccessState> {
        self.inner.lock().states.clone()
    }

    async fn delete_mobile_credential(
        &self,
        credential: &MobileCredential,
    ) -> SdkResult<MobileCredential> {
        self.delete_now(credential)
    }

    fn add_sdk_state_listener(&self, listener: Arc<dyn SdkStateListener>) {
        self.inner.lock().state_listeners.push(listener);
    }

    fn add_reader_update_listener(&self, listener: Arc<dyn ReaderUpdateListener>) {
        self.inner.lock().reader_listeners.push(listener);
    }

    fn add_automatic_access_listener(&self, listener: Arc<dyn AccessListener>) {
        self.inner.lock().access_listeners.push(listener);
    }
}

/// Provider handing out one shared [`SimulatedSdk`]
pub struct SimulatedSdkProvider {
    sdk: Arc<SimulatedSdk>,
    configurations: Mutex<Vec<SdkConfig>>,
}

impl SimulatedSdkProvider {
    pub fn new(sdk: Arc<SimulatedSdk>) -> Self {
        Self {
            sdk,
            configurations: Mutex::new(vec![]),
        }
    }

    pub fn sdk(&self) -> Arc<SimulatedSdk> {
        self.sdk.clone()
    }

    /// Configurations the SDK was created with, in call order
    pub fn configurations(&self) -> Vec<SdkConfig> {
        self.configurations.lock().clone()
    }
}

impl SdkProvider for SimulatedSdkProvider {
    type Sdk = SimulatedSdk;

    fn configure(&self, config: &SdkConfig) -> Arc<SimulatedSdk> {
        self.configurations.lock().push(config.clone());
        self.sdk.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::access_sdk::SecondFactorSelector;
    use std::sync::mpsc;

    struct ChannelListener(Mutex<mpsc::Sender<String>>);

    impl RegistrationListener for ChannelListener {
        fn on_registration_completed(
            &self,
            credential: Option<MobileCredential>,
            error: Option<SdkError>,
        ) {
            let msg = match (credential, error) {
                (Some(c), None) => format!("ok:{}", c.id),
                (None, Some(e)) => format!("err:{e}"),
                _ => "malformed".to_string(),
            };
            self.0.lock().send(msg).unwrap();
        }

        fn on_authentication_type_selection_requested(&self, selector: SecondFactorSelector) {
            self.0.lock().send("second-factor".to_string()).unwrap();
            selector(true, SecondFactorType::Pin);
        }
    }

    fn credential(id: &str) -> MobileCredential {
        MobileCredential {
            id: id.to_string(),
            facility_id: 7,
            facility_name: "HQ".to_string(),
            is_revoked: false,
            registered_date: Utc::now(),
        }
    }

    fn url() -> Url {
        Url::parse("https://host/invite/ABC").unwrap()
    }

    #[test]
    fn test_default_registration_succeeds_and_stores_credential() {
        let sdk = SimulatedSdk::new();
        let (tx, rx) = mpsc::channel();
        sdk.register_credential(url(), Arc::new(ChannelListener(Mutex::new(tx))));

        let msg = rx.recv().unwrap();
        assert!(msg.starts_with("ok:"));
        assert_eq!(sdk.mobile_credentials().len(), 1);
        assert_eq!(sdk.mobile_credentials()[0].facility_name, "host");
    }

    #[test]
    fn test_second_factor_script_records_choice() {
        let sdk = SimulatedSdk::new();
        sdk.push_registration(RegistrationScript::SecondFactor(
            RegistrationOutcome::Succeed(credential("C1")),
        ));
        let (tx, rx) = mpsc::channel();
        sdk.register_credential(url(), Arc::new(ChannelListener(Mutex::new(tx))));

        assert_eq!(rx.recv().unwrap(), "second-factor");
        assert_eq!(rx.recv().unwrap(), "ok:C1");
        assert_eq!(
            sdk.second_factor_choices(),
            vec![(true, SecondFactorType::Pin)]
        );
    }

    #[test]
    fn test_failure_and_hold_scripts() {
        let sdk = SimulatedSdk::new();
        sdk.push_registration(RegistrationScript::Immediate(RegistrationOutcome::Fail(
            "offline".into(),
        )));
        sdk.push_registration(RegistrationScript::Hold);

        let (tx, rx) = mpsc::channel();
        sdk.register_credential(url(), Arc::new(ChannelListener(Mutex::new(tx.clone()))));
        assert_eq!(rx.recv().unwrap(), "err:offline");

        sdk.register_credential(url(), Arc::new(ChannelListener(Mutex::new(tx))));
        let held = sdk.take_held_registrations();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].0, url());
        assert!(sdk.mobile_credentials().is_empty());
    }

    #[test]
    fn test_resolve_invitation_url() {
        let sdk = SimulatedSdk::new();
        let url = sdk.resolve_invitation_url("cloud.example.com", "ABCD-1234").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/api/invitations/ABCD-1234"
        );

        assert!(sdk.resolve_invitation_url("", "ABCD").is_none());
        assert!(sdk.resolve_invitation_url("cloud.example.com", "").is_none());
        assert!(sdk.resolve_invitation_url("cloud.example.com", "a/b").is_none());
        assert!(sdk.resolve_invitation_url("bad host", "ABCD").is_none());
    }

    #[tokio::test]
    async fn test_delete_credential() {
        let sdk = SimulatedSdk::new();
        sdk.set_credentials(vec![credential("C1"), credential("C2")]);

        let deleted = sdk.delete_mobile_credential(&credential("C1")).await.unwrap();
        assert_eq!(deleted.id, "C1");
        assert_eq!(sdk.mobile_credentials().len(), 1);

        sdk.set_delete_failure(Some("server refused".into()));
        let err = sdk
            .delete_mobile_credential(&credential("C2"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "server refused");
        assert_eq!(sdk.delete_calls(), 2);
    }

    #[test]
    fn test_provider_records_configurations() {
        let provider = SimulatedSdkProvider::new(Arc::new(SimulatedSdk::new()));
        let sdk = provider.configure(&SdkConfig::default());
        assert!(Arc::ptr_eq(&sdk, &provider.sdk()));
        assert_eq!(provider.configurations().len(), 1);
    }
}
