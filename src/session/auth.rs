//! Credential checks behind sign-in and sign-up.
//!
//! [`MockAuthenticator`] accepts everything and hands out a canned session.
//! [`LocalAuthenticator`] keeps an account registry in the `accounts` slot
//! and verifies salted SHA-256 password hashes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::{Identity, Profile, Role};
use crate::error::{SessionError, StorageError};
use crate::store::{SlotStorage, load_json, save_json, slot_keys};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Checks credentials and remembers accounts.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn name(&self) -> &str;

    /// Verify credentials and return the account's identity and last known
    /// profile.
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<(Identity, Profile), SessionError>;

    /// Register a freshly created account.
    async fn register(
        &self,
        identity: &Identity,
        password: &SecretString,
        profile: &Profile,
    ) -> Result<(), SessionError>;

    /// Keep the account's copy of the profile current so the next sign-in
    /// restores it.
    async fn remember_profile(&self, _profile: &Profile) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Accepts any credentials.
///
/// Sign-in always yields the same demo freelancer (id `1`, John Doe, USA)
/// with onboarding already done, under whatever email was entered.
#[derive(Debug, Default)]
pub struct MockAuthenticator;

impl MockAuthenticator {
    pub const DEMO_ID: &'static str = "1";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn sign_in(
        &self,
        email: &str,
        _password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<(Identity, Profile), SessionError> {
        let identity = Identity {
            id: Self::DEMO_ID.to_string(),
            email: email.to_string(),
            role: Role::Freelancer,
        };
        let mut profile = Profile::new(&identity, "John", "Doe", "USA", now);
        profile.onboarding_completed = true;
        Ok((identity, profile))
    }

    async fn register(
        &self,
        _identity: &Identity,
        _password: &SecretString,
        _profile: &Profile,
    ) -> Result<(), SessionError> {
        Ok(())
    }
}

/// One registered account as stored in the `accounts` slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    id: String,
    email: String,
    role: Role,
    salt: String,
    password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

type Accounts = BTreeMap<String, AccountRecord>;

/// Account registry persisted in slot storage.
pub struct LocalAuthenticator {
    storage: Arc<dyn SlotStorage>,
    /// Lazily loaded registry keyed by normalized email.
    accounts: RwLock<Option<Accounts>>,
    /// Set once the backend is gone; the registry then lives in memory only.
    offline: AtomicBool,
}

impl LocalAuthenticator {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self {
            storage,
            accounts: RwLock::new(None),
            offline: AtomicBool::new(false),
        }
    }

    fn go_offline(&self, err: &StorageError) {
        if !self.offline.swap(true, Ordering::SeqCst) {
            warn!(error = %err, "Account storage unavailable, keeping registry in memory");
        }
    }

    async fn with_accounts<R>(
        &self,
        f: impl FnOnce(&mut Accounts) -> R,
    ) -> Result<R, SessionError> {
        let mut guard = self.accounts.write().await;
        if guard.is_none() && !self.offline.load(Ordering::SeqCst) {
            let loaded: Option<Accounts> =
                match load_json(self.storage.as_ref(), slot_keys::ACCOUNTS).await {
                    Ok(loaded) => loaded,
                    Err(e) if e.is_unavailable() => {
                        self.go_offline(&e);
                        None
                    }
                    Err(e) => return Err(e.into()),
                };
            debug!(
                accounts = loaded.as_ref().map(|a| a.len()).unwrap_or(0),
                "Account registry loaded"
            );
            *guard = Some(loaded.unwrap_or_default());
        }
        let accounts = guard.get_or_insert_with(Accounts::new);
        Ok(f(accounts))
    }

    /// Write the registry back. A failed write keeps the in-memory registry
    /// so the running process can still sign people in.
    async fn persist(&self) {
        if self.offline.load(Ordering::SeqCst) {
            return;
        }
        let guard = self.accounts.read().await;
        let Some(accounts) = guard.as_ref() else {
            return;
        };
        match save_json(self.storage.as_ref(), slot_keys::ACCOUNTS, accounts).await {
            Ok(()) => {}
            Err(e) if e.is_unavailable() => self.go_offline(&e),
            Err(e) => warn!(error = %e, "Failed to persist account registry"),
        }
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    fn name(&self) -> &str {
        "local"
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<(Identity, Profile), SessionError> {
        let key = normalize_email(email);
        let record = self
            .with_accounts(|accounts| accounts.get(&key).cloned())
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        if hash_password(&record.salt, password) != record.password_hash {
            info!(email = %key, "Sign-in rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let identity = Identity {
            id: record.id.clone(),
            email: record.email.clone(),
            role: record.role,
        };
        let profile = record
            .profile
            .unwrap_or_else(|| Profile::new(&identity, "", "", "", now));
        Ok((identity, profile))
    }

    async fn register(
        &self,
        identity: &Identity,
        password: &SecretString,
        profile: &Profile,
    ) -> Result<(), SessionError> {
        if !EMAIL_RE.is_match(identity.email.trim()) {
            return Err(SessionError::validation("email"));
        }
        if password.expose_secret().is_empty() {
            return Err(SessionError::validation("password"));
        }

        let key = normalize_email(&identity.email);
        let salt = new_salt();
        let record = AccountRecord {
            id: identity.id.clone(),
            email: identity.email.trim().to_string(),
            role: identity.role,
            password_hash: hash_password(&salt, password),
            salt,
            profile: Some(profile.clone()),
        };

        let inserted = self
            .with_accounts(|accounts| {
                if accounts.contains_key(&key) {
                    false
                } else {
                    accounts.insert(key.clone(), record);
                    true
                }
            })
            .await?;

        if !inserted {
            return Err(SessionError::EmailAlreadyRegistered {
                email: identity.email.clone(),
            });
        }

        info!(user_id = %identity.id, role = %identity.role, "Account registered");
        self.persist().await;
        Ok(())
    }

    async fn remember_profile(&self, profile: &Profile) -> Result<(), SessionError> {
        let updated = self
            .with_accounts(|accounts| {
                match accounts.values_mut().find(|a| a.id == profile.id) {
                    Some(account) => {
                        account.profile = Some(profile.clone());
                        true
                    }
                    None => false,
                }
            })
            .await?;
        if updated {
            self.persist().await;
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn new_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    to_hex(&bytes)
}

fn hash_password(salt: &str, password: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.expose_secret().as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn new_account(id: &str, email: &str) -> (Identity, Profile) {
        let identity = Identity {
            id: id.into(),
            email: email.into(),
            role: Role::Client,
        };
        let profile = Profile::new(&identity, "Ada", "Lovelace", "UK", Utc::now());
        (identity, profile)
    }

    #[tokio::test]
    async fn mock_sign_in_returns_demo_freelancer() {
        let auth = MockAuthenticator::new();
        let (identity, profile) = auth
            .sign_in("who@ever.io", &secret("x"), Utc::now())
            .await
            .unwrap();
        assert_eq!(identity.id, "1");
        assert_eq!(identity.email, "who@ever.io");
        assert_eq!(identity.role, Role::Freelancer);
        assert_eq!(profile.display_name(), "John Doe");
        assert_eq!(profile.country, "USA");
        assert!(profile.onboarding_completed);
    }

    #[tokio::test]
    async fn local_register_then_sign_in() {
        let storage = Arc::new(MemoryStorage::new());
        let auth = LocalAuthenticator::new(storage.clone());
        let (identity, profile) = new_account("u-1", "Ada@Example.com");
        auth.register(&identity, &secret("hunter2"), &profile)
            .await
            .unwrap();

        // Email lookup is case-insensitive
        let (signed_in, restored) = auth
            .sign_in("ada@example.com", &secret("hunter2"), Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.id, "u-1");
        assert_eq!(restored.first_name, "Ada");

        // Registry is persisted without the plain password
        let raw = storage.get_slot(slot_keys::ACCOUNTS).await.unwrap().unwrap();
        assert!(!raw.contains("hunter2"));
    }

    #[tokio::test]
    async fn local_rejects_wrong_password_and_unknown_email() {
        let auth = LocalAuthenticator::new(Arc::new(MemoryStorage::new()));
        let (identity, profile) = new_account("u-1", "ada@example.com");
        auth.register(&identity, &secret("right"), &profile)
            .await
            .unwrap();

        let err = auth
            .sign_in("ada@example.com", &secret("wrong"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));

        let err = auth
            .sign_in("nobody@example.com", &secret("right"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn local_rejects_duplicate_email() {
        let auth = LocalAuthenticator::new(Arc::new(MemoryStorage::new()));
        let (first, profile) = new_account("u-1", "ada@example.com");
        auth.register(&first, &secret("pw"), &profile).await.unwrap();

        let (second, profile) = new_account("u-2", " ADA@example.com ");
        let err = auth.register(&second, &secret("pw"), &profile).await.unwrap_err();
        assert!(matches!(err, SessionError::EmailAlreadyRegistered { .. }));
    }

    #[tokio::test]
    async fn local_validates_email_and_password() {
        let auth = LocalAuthenticator::new(Arc::new(MemoryStorage::new()));
        let (identity, profile) = new_account("u-1", "not-an-email");
        let err = auth.register(&identity, &secret("pw"), &profile).await.unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "email"));

        let (identity, profile) = new_account("u-1", "ada@example.com");
        let err = auth.register(&identity, &secret(""), &profile).await.unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "password"));
    }

    #[tokio::test]
    async fn remembered_profile_is_restored_on_sign_in() {
        let storage = Arc::new(MemoryStorage::new());
        let auth = LocalAuthenticator::new(storage.clone());
        let (identity, mut profile) = new_account("u-1", "ada@example.com");
        auth.register(&identity, &secret("pw"), &profile).await.unwrap();

        profile.onboarding_completed = true;
        profile.company_name = Some("Analytical Engines".into());
        auth.remember_profile(&profile).await.unwrap();

        // Fresh authenticator reads the registry back from storage
        let reloaded = LocalAuthenticator::new(storage);
        let (_, restored) = reloaded
            .sign_in("ada@example.com", &secret("pw"), Utc::now())
            .await
            .unwrap();
        assert!(restored.onboarding_completed);
        assert_eq!(restored.company_name.as_deref(), Some("Analytical Engines"));
    }

    #[test]
    fn hashes_depend_on_salt() {
        let pw = secret("same");
        assert_ne!(hash_password("a", &pw), hash_password("b", &pw));
        assert_eq!(hash_password("a", &pw), hash_password("a", &pw));
        assert_eq!(new_salt().len(), 32);
    }
}
