//! Session layer: identity, profile, and the store that keeps them.

pub mod auth;
pub mod model;
pub mod store;

use std::sync::Arc;

pub use auth::{Authenticator, LocalAuthenticator, MockAuthenticator};
pub use model::{
    Certification, Education, Experience, Identity, Profile, ProfileUpdate, Project, Role, Skill,
    SkillLevel,
};
pub use store::{SessionEvent, SessionSnapshot, SessionStore, SignUpRequest};

use crate::config::AuthMode;
use crate::store::SlotStorage;

/// Build the authenticator selected in configuration.
pub fn authenticator(mode: AuthMode, storage: Arc<dyn SlotStorage>) -> Arc<dyn Authenticator> {
    match mode {
        AuthMode::Mock => Arc::new(MockAuthenticator::new()),
        AuthMode::Local => Arc::new(LocalAuthenticator::new(storage)),
    }
}
