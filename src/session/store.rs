//! SessionStore: the current identity and profile, kept in sync with slot
//! storage.
//!
//! One store is created at process start (`SessionStore::open`) and passed
//! to every view as an `Arc`. All mutations go through the four session
//! operations; each one broadcasts a [`SessionEvent`] afterwards.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::auth::Authenticator;
use super::model::{Identity, Profile, ProfileUpdate, Role};
use crate::error::{SessionError, StorageError};
use crate::store::{SlotStorage, load_json, save_json, slot_keys};

const EVENT_CAPACITY: usize = 64;

/// Shown to the user once storage has been lost.
pub const DEGRADED_WARNING: &str =
    "Storage is unavailable. Your session is kept in memory only and will be lost when you exit.";

/// Everything sign-up collects.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
}

/// Broadcast after every session state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Hydrated { signed_in: bool },
    SignedIn { user_id: String },
    SignedUp { user_id: String, role: Role },
    SignedOut,
    ProfileUpdated { user_id: String },
    StorageDegraded { reason: String },
}

/// Point-in-time copy of the session for views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

struct SessionState {
    identity: Option<Identity>,
    profile: Option<Profile>,
    loading: bool,
    /// Set once storage has failed; from then on nothing is written.
    degraded: Option<String>,
}

pub struct SessionStore {
    storage: Arc<dyn SlotStorage>,
    auth: Arc<dyn Authenticator>,
    state: RwLock<SessionState>,
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store that has not hydrated yet (`loading` is true).
    pub fn new(storage: Arc<dyn SlotStorage>, auth: Arc<dyn Authenticator>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            storage,
            auth,
            state: RwLock::new(SessionState {
                identity: None,
                profile: None,
                loading: true,
                degraded: None,
            }),
            tx,
        })
    }

    /// Create a store and hydrate it from storage.
    pub async fn open(storage: Arc<dyn SlotStorage>, auth: Arc<dyn Authenticator>) -> Arc<Self> {
        let store = Self::new(storage, auth);
        store.hydrate().await;
        store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Restore identity and profile from storage. Both slots must be present
    /// and agree on the id, otherwise there is no session. Always clears the
    /// `loading` flag.
    pub async fn hydrate(&self) {
        let mut state = self.state.write().await;

        if state.degraded.is_none() {
            match self.load_session().await {
                Ok(Some((identity, profile))) => {
                    info!(user_id = %identity.id, role = %identity.role, "Session restored");
                    state.identity = Some(identity);
                    state.profile = Some(profile);
                }
                Ok(None) => debug!("No stored session"),
                Err(e) if e.is_unavailable() => self.degrade(&mut state, &e),
                Err(e) => warn!(error = %e, "Ignoring unreadable stored session"),
            }
        }

        state.loading = false;
        let signed_in = state.identity.is_some();
        drop(state);
        self.emit(SessionEvent::Hydrated { signed_in });
    }

    async fn load_session(&self) -> Result<Option<(Identity, Profile)>, StorageError> {
        let identity: Option<Identity> = load_json(self.storage.as_ref(), slot_keys::USER).await?;
        let profile: Option<Profile> = load_json(self.storage.as_ref(), slot_keys::PROFILE).await?;
        match (identity, profile) {
            (Some(identity), Some(profile)) if identity.id == profile.id => {
                Ok(Some((identity, profile)))
            }
            (Some(identity), Some(profile)) => {
                warn!(
                    user_id = %identity.id,
                    profile_id = %profile.id,
                    "Stored user and profile disagree on id"
                );
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Check credentials and replace the current session.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(Identity, Profile), SessionError> {
        let mut state = self.state.write().await;
        let (identity, profile) = self.auth.sign_in(email, password, Utc::now()).await?;

        if let Some(previous) = state.identity.as_ref().filter(|p| p.id != identity.id) {
            debug!(previous = %previous.id, "Replacing active session");
        }

        self.persist(&mut state, Some(&identity), &profile).await;
        state.identity = Some(identity.clone());
        state.profile = Some(profile.clone());
        drop(state);

        info!(user_id = %identity.id, auth = self.auth.name(), "Signed in");
        self.emit(SessionEvent::SignedIn {
            user_id: identity.id.clone(),
        });
        Ok((identity, profile))
    }

    /// Create an account with onboarding still pending and make it the
    /// current session.
    pub async fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> Result<(Identity, Profile), SessionError> {
        let mut state = self.state.write().await;

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: request.email.trim().to_string(),
            role: request.role,
        };
        let mut profile = Profile::new(
            &identity,
            request.first_name,
            request.last_name,
            request.country,
            Utc::now(),
        );
        profile.phone = Some(request.phone).filter(|p| !p.trim().is_empty());

        self.auth
            .register(&identity, &request.password, &profile)
            .await?;

        self.persist(&mut state, Some(&identity), &profile).await;
        state.identity = Some(identity.clone());
        state.profile = Some(profile.clone());
        drop(state);

        info!(user_id = %identity.id, role = %identity.role, "Signed up");
        self.emit(SessionEvent::SignedUp {
            user_id: identity.id.clone(),
            role: identity.role,
        });
        Ok((identity, profile))
    }

    /// Clear the session from memory and storage.
    pub async fn sign_out(&self) {
        let mut state = self.state.write().await;
        let previous = state.identity.take();
        state.profile = None;

        if state.degraded.is_none() {
            for key in [slot_keys::USER, slot_keys::PROFILE] {
                if let Err(e) = self.storage.remove_slot(key).await {
                    if e.is_unavailable() {
                        self.degrade(&mut state, &e);
                        break;
                    }
                    warn!(slot = key, error = %e, "Failed to clear slot");
                }
            }
        }
        drop(state);

        if let Some(identity) = previous {
            info!(user_id = %identity.id, "Signed out");
        }
        self.emit(SessionEvent::SignedOut);
    }

    /// Merge `update` into the current profile and stamp `updatedAt`.
    ///
    /// Returns `None` without touching anything when no one is signed in.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Option<Profile> {
        let mut state = self.state.write().await;
        let Some(mut profile) = state.profile.clone() else {
            debug!("Profile update ignored: no session");
            return None;
        };

        profile.apply(update);
        profile.updated_at = next_stamp(profile.updated_at, Utc::now());

        self.persist(&mut state, None, &profile).await;
        // Recorded under the lock so concurrent updates reach the account in order
        if let Err(e) = self.auth.remember_profile(&profile).await {
            warn!(user_id = %profile.id, error = %e, "Failed to record profile on account");
        }
        state.profile = Some(profile.clone());
        drop(state);

        debug!(user_id = %profile.id, "Profile updated");
        self.emit(SessionEvent::ProfileUpdated {
            user_id: profile.id.clone(),
        });
        Some(profile)
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// The user-visible warning, once storage has been lost.
    pub async fn warning(&self) -> Option<String> {
        self.state
            .read()
            .await
            .degraded
            .as_ref()
            .map(|_| DEGRADED_WARNING.to_string())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            user: state.identity.clone(),
            profile: state.profile.clone(),
            loading: state.loading,
            warning: state.degraded.as_ref().map(|_| DEGRADED_WARNING.to_string()),
        }
    }

    /// Write the profile (and identity, if given) to storage. Failures never
    /// fail the operation; losing the backend degrades the store instead.
    async fn persist(
        &self,
        state: &mut SessionState,
        identity: Option<&Identity>,
        profile: &Profile,
    ) {
        if state.degraded.is_some() {
            return;
        }

        let result = async {
            if let Some(identity) = identity {
                save_json(self.storage.as_ref(), slot_keys::USER, identity).await?;
            }
            save_json(self.storage.as_ref(), slot_keys::PROFILE, profile).await
        }
        .await;

        match result {
            Ok(()) => {}
            Err(e) if e.is_unavailable() => self.degrade(state, &e),
            Err(e) => warn!(user_id = %profile.id, error = %e, "Failed to persist session"),
        }
    }

    fn degrade(&self, state: &mut SessionState, err: &StorageError) {
        if state.degraded.is_some() {
            return;
        }
        warn!(
            backend = self.storage.name(),
            error = %err,
            "Storage unavailable, continuing with in-memory session"
        );
        let reason = err.to_string();
        state.degraded = Some(reason.clone());
        self.emit(SessionEvent::StorageDegraded { reason });
    }

    fn emit(&self, event: SessionEvent) {
        // Ok if nobody is listening
        let _ = self.tx.send(event);
    }
}

/// Next `updatedAt` value: the clock, unless it has not moved past the
/// previous stamp.
fn next_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
