//! Two-phase credential registration with second-factor continuation
//!
//! A registration may finish in one step, or the SDK may pause it to ask
//! which second factor to use. In the second case the first caller is
//! answered with a continuation token, the SDK's selector is parked in a
//! [`PendingRegistration`], and a later `registerCredentialContinue` call
//! consumes the token, swaps in its own completion handle and resumes the
//! SDK. The SDK's terminal callback then answers whichever caller currently
//! owns the handle.
//!
//! Lock order is table, then entry. SDK code (the selector) is never invoked
//! while a lock is held because the SDK may call back synchronously.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::{
    core::{
        error::{BridgeError, BridgeResult, SdkError},
        serializer::CredentialPayload,
        types::ContinuationToken,
    },
    sdk::{
        access_sdk::{RegistrationListener, SecondFactorSelector},
        types::MobileCredential,
    },
};

/// Default lifetime of a parked continuation token
pub const CONTINUATION_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Result of one registration step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_point: Option<String>,
}

impl RegistrationResponse {
    pub fn completed(credential: CredentialPayload) -> Self {
        Self {
            completed: true,
            credential: Some(credential),
            continuation_point: None,
        }
    }

    pub fn needs_second_factor(token: &ContinuationToken) -> Self {
        Self {
            completed: false,
            credential: None,
            continuation_point: Some(token.to_string()),
        }
    }
}

/// Single-use completion handle of one waiting caller
pub type CompletionHandle = oneshot::Sender<BridgeResult<RegistrationResponse>>;

/// Removes a registration from its table; run at most once
pub type Cleanup = Box<dyn FnOnce(&ContinuationToken) + Send>;

/// Where a registration currently is, and who is waiting on it
enum Phase {
    /// Waiting for the SDK's first callback
    Started(CompletionHandle),
    /// First caller answered; the selector waits for a continue call
    AwaitingSecondFactor {
        selector: SecondFactorSelector,
        parked_at: Instant,
    },
    /// Resumed by a continue call that now owns the handle
    Resumed(CompletionHandle),
    Finished,
}

/// One in-flight credential registration
///
/// Also the listener handed to the SDK for this registration.
pub struct PendingRegistration {
    token: ContinuationToken,
    phase: Mutex<Phase>,
    cleanup: Mutex<Option<Cleanup>>,
}

impl PendingRegistration {
    pub fn new(token: ContinuationToken, handle: CompletionHandle, cleanup: Cleanup) -> Arc<Self> {
        Arc::new(Self {
            token,
            phase: Mutex::new(Phase::Started(handle)),
            cleanup: Mutex::new(Some(cleanup)),
        })
    }

    pub fn token(&self) -> ContinuationToken {
        self.token
    }

    pub fn is_awaiting_second_factor(&self) -> bool {
        matches!(*self.phase.lock(), Phase::AwaitingSecondFactor { .. })
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.lock().take();
        if let Some(cleanup) = cleanup {
            cleanup(&self.token);
        }
    }

    /// Hand the registration to a new caller and release the parked selector
    ///
    /// Gives the handle back if the registration is not waiting for a
    /// second-factor decision.
    fn resume(&self, handle: CompletionHandle) -> Result<SecondFactorSelector, CompletionHandle> {
        let mut phase = self.phase.lock();
        match std::mem::replace(&mut *phase, Phase::Finished) {
            Phase::AwaitingSecondFactor { selector, .. } => {
                *phase = Phase::Resumed(handle);
                Ok(selector)
            }
            other => {
                *phase = other;
                Err(handle)
            }
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        match &*self.phase.lock() {
            Phase::AwaitingSecondFactor { parked_at, .. } => now.duration_since(*parked_at) >= ttl,
            _ => false,
        }
    }

    /// Abandon a parked registration, returning its selector to be dropped
    /// outside the lock
    fn expire(&self) -> Option<SecondFactorSelector> {
        let mut phase = self.phase.lock();
        match std::mem::replace(&mut *phase, Phase::Finished) {
            Phase::AwaitingSecondFactor { selector, .. } => Some(selector),
            other => {
                *phase = other;
                None
            }
        }
    }

    /// Take the handle of whoever is waiting and mark the registration finished
    fn finish(&self) -> Option<CompletionHandle> {
        let previous = std::mem::replace(&mut *self.phase.lock(), Phase::Finished);
        match previous {
            Phase::Started(handle) | Phase::Resumed(handle) => Some(handle),
            // Dropped only after the phase guard is released
            Phase::AwaitingSecondFactor { selector, .. } => {
                drop(selector);
                None
            }
            Phase::Finished => None,
        }
    }

    fn deliver(&self, handle: CompletionHandle, result: BridgeResult<RegistrationResponse>) {
        if handle.send(result).is_err() {
            debug!(token = %self.token, "registration caller went away before the result");
        }
    }
}

impl RegistrationListener for PendingRegistration {
    fn on_registration_completed(
        &self,
        credential: Option<MobileCredential>,
        error: Option<SdkError>,
    ) {
        self.run_cleanup();

        let result = match (credential, error) {
            (_, Some(error)) => {
                info!(token = %self.token, %error, "registration failed");
                Err(BridgeError::RegistrationFailed(error.message))
            }
            (Some(credential), None) => {
                info!(token = %self.token, credential = %credential.id, "registration completed");
                Ok(RegistrationResponse::completed(CredentialPayload::from(
                    &credential,
                )))
            }
            (None, None) => {
                error!(
                    token = %self.token,
                    "SDK contract violation: registration completed with neither credential nor error"
                );
                Err(BridgeError::ContractViolation(
                    "registration completed with neither credential nor error".to_string(),
                ))
            }
        };

        match self.finish() {
            Some(handle) => self.deliver(handle, result),
            None => warn!(
                token = %self.token,
                "registration completed with no caller waiting for it"
            ),
        }
    }

    fn on_authentication_type_selection_requested(&self, selector: SecondFactorSelector) {
        let mut phase = self.phase.lock();
        match std::mem::replace(&mut *phase, Phase::Finished) {
            Phase::Started(handle) => {
                *phase = Phase::AwaitingSecondFactor {
                    selector,
                    parked_at: Instant::now(),
                };
                drop(phase);
                info!(token = %self.token, "registration waiting for second factor");
                self.deliver(handle, Ok(RegistrationResponse::needs_second_factor(&self.token)));
            }
            Phase::AwaitingSecondFactor {
                selector: replaced,
                parked_at,
            } => {
                *phase = Phase::AwaitingSecondFactor {
                    selector,
                    parked_at,
                };
                drop(phase);
                drop(replaced);
                warn!(token = %self.token, "second factor requested again while parked");
            }
            Phase::Resumed(handle) => {
                drop(phase);
                drop(selector);
                self.run_cleanup();
                error!(token = %self.token, "SDK contract violation: second factor requested after resume");
                self.deliver(
                    handle,
                    Err(BridgeError::ContractViolation(
                        "second factor requested after the registration was resumed".to_string(),
                    )),
                );
            }
            Phase::Finished => {
                drop(phase);
                warn!(token = %self.token, "second factor requested for a finished registration");
            }
        }
    }
}

/// Registrations that can still be resumed, keyed by continuation token
///
/// The table only indexes registrations. The SDK owns them through the
/// listener it was handed, so a registration the SDK drops without calling
/// back disappears from the table and its caller is told it was abandoned.
pub struct ContinuationTable {
    entries: Mutex<HashMap<ContinuationToken, Weak<PendingRegistration>>>,
    ttl: Duration,
}

impl ContinuationTable {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        })
    }

    /// Cleanup callback removing a token from this table
    pub fn cleanup(self: &Arc<Self>) -> Cleanup {
        let table: Weak<Self> = Arc::downgrade(self);
        Box::new(move |token| {
            if let Some(table) = table.upgrade() {
                table.remove(token);
            }
        })
    }

    /// Add a registration, dropping expired and abandoned ones first
    pub fn insert(&self, registration: &Arc<PendingRegistration>) {
        self.purge_expired();
        self.entries
            .lock()
            .insert(registration.token(), Arc::downgrade(registration));
    }

    pub fn remove(&self, token: &ContinuationToken) -> bool {
        self.entries.lock().remove(token).is_some()
    }

    /// Whether `token` names a registration that can still be resumed or
    /// completed. Expired and abandoned entries do not count even before a
    /// purge removes them.
    pub fn contains(&self, token: &ContinuationToken) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .get(token)
            .is_some_and(|registration| self.is_live(registration, now))
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|registration| self.is_live(registration, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_live(&self, registration: &Weak<PendingRegistration>, now: Instant) -> bool {
        registration
            .upgrade()
            .is_some_and(|registration| !registration.is_expired(self.ttl, now))
    }

    /// Consume a token and hand its registration to a new caller
    ///
    /// On success the token is gone from the table and the returned selector
    /// must be invoked by the caller. Fails, returning the handle, when the
    /// token is unknown, already consumed, expired, or not yet parked.
    pub fn resume(
        &self,
        token: &ContinuationToken,
        handle: CompletionHandle,
    ) -> Result<SecondFactorSelector, CompletionHandle> {
        let expired = {
            let mut entries = self.entries.lock();
            let Some(registration) = entries.get(token).and_then(Weak::upgrade) else {
                return Err(handle);
            };
            if registration.is_expired(self.ttl, Instant::now()) {
                entries.remove(token);
                registration
            } else {
                let selector = registration.resume(handle)?;
                entries.remove(token);
                return Ok(selector);
            }
        };

        warn!(%token, "continuation token expired");
        drop(expired.expire());
        Err(handle)
    }

    /// Drop parked registrations older than the TTL along with abandoned
    /// ones, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let (expired, abandoned) = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            let mut expired = vec![];
            entries.retain(|_, registration| match registration.upgrade() {
                Some(registration) if registration.is_expired(self.ttl, now) => {
                    expired.push(registration);
                    false
                }
                Some(_) => true,
                None => false,
            });
            let abandoned = before - entries.len() - expired.len();
            (expired, abandoned)
        };

        if abandoned > 0 {
            debug!(abandoned, "dropped registrations released by the SDK");
        }
        for registration in &expired {
            warn!(token = %registration.token(), "continuation token expired");
            drop(registration.expire());
        }
        expired.len() + abandoned
    }
}
