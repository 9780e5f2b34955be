//! Which top-level view the session calls for.

use serde::Serialize;

use super::navigation::Page;
use crate::session::{Identity, Profile, Role, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "page", rename_all = "snake_case")]
pub enum View {
    Loading,
    Unauthenticated,
    OnboardingFreelancer,
    OnboardingClient,
    Authenticated(Page),
}

impl View {
    pub fn is_onboarding(&self) -> bool {
        matches!(self, Self::OnboardingFreelancer | Self::OnboardingClient)
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::OnboardingFreelancer => write!(f, "onboarding_freelancer"),
            Self::OnboardingClient => write!(f, "onboarding_client"),
            Self::Authenticated(page) => write!(f, "authenticated:{page}"),
        }
    }
}

/// Pick the view. A session needs both an identity and a profile; until the
/// profile's onboarding is complete the role's onboarding flow is shown.
pub fn route(
    loading: bool,
    identity: Option<&Identity>,
    profile: Option<&Profile>,
    page: Page,
) -> View {
    if loading {
        return View::Loading;
    }
    match (identity, profile) {
        (Some(_), Some(profile)) if !profile.onboarding_completed => match profile.role {
            Role::Freelancer => View::OnboardingFreelancer,
            Role::Client => View::OnboardingClient,
        },
        (Some(_), Some(_)) => View::Authenticated(page),
        _ => View::Unauthenticated,
    }
}

/// [`route`] over the store's current snapshot.
pub async fn current_view(store: &SessionStore, page: Page) -> View {
    let snapshot = store.snapshot().await;
    route(
        snapshot.loading,
        snapshot.user.as_ref(),
        snapshot.profile.as_ref(),
        page,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::session::MockAuthenticator;
    use crate::store::MemoryStorage;

    fn session(role: Role, completed: bool) -> (Identity, Profile) {
        let identity = Identity {
            id: "7".into(),
            email: "a@b.c".into(),
            role,
        };
        let mut profile = Profile::new(&identity, "A", "B", "C", Utc::now());
        profile.onboarding_completed = completed;
        (identity, profile)
    }

    #[test]
    fn loading_wins() {
        let (identity, profile) = session(Role::Client, true);
        assert_eq!(
            route(true, Some(&identity), Some(&profile), Page::Orders),
            View::Loading
        );
    }

    #[test]
    fn needs_both_identity_and_profile() {
        let (identity, profile) = session(Role::Client, true);
        assert_eq!(route(false, None, None, Page::Dashboard), View::Unauthenticated);
        assert_eq!(
            route(false, Some(&identity), None, Page::Dashboard),
            View::Unauthenticated
        );
        assert_eq!(
            route(false, None, Some(&profile), Page::Dashboard),
            View::Unauthenticated
        );
    }

    #[test]
    fn incomplete_onboarding_routes_by_role() {
        let (identity, profile) = session(Role::Freelancer, false);
        assert_eq!(
            route(false, Some(&identity), Some(&profile), Page::Gigs),
            View::OnboardingFreelancer
        );
        let (identity, profile) = session(Role::Client, false);
        let view = route(false, Some(&identity), Some(&profile), Page::Gigs);
        assert_eq!(view, View::OnboardingClient);
        assert!(view.is_onboarding());
    }

    #[test]
    fn completed_session_shows_page() {
        let (identity, profile) = session(Role::Client, true);
        assert_eq!(
            route(false, Some(&identity), Some(&profile), Page::Billing),
            View::Authenticated(Page::Billing)
        );
    }

    #[test]
    fn serializes_with_view_tag() {
        let json = serde_json::to_value(View::Authenticated(Page::Orders)).unwrap();
        assert_eq!(json["view"], "authenticated");
        assert_eq!(json["page"], "orders");
        let json = serde_json::to_value(View::Unauthenticated).unwrap();
        assert_eq!(json["view"], "unauthenticated");
    }

    #[tokio::test]
    async fn current_view_follows_store() {
        let store = SessionStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MockAuthenticator::new()),
        );
        assert_eq!(current_view(&store, Page::Dashboard).await, View::Loading);
        store.hydrate().await;
        assert_eq!(
            current_view(&store, Page::Dashboard).await,
            View::Unauthenticated
        );
        store
            .sign_in("john@doe.com", &secrecy::SecretString::from("x".to_string()))
            .await
            .unwrap();
        assert_eq!(
            current_view(&store, Page::Explore).await,
            View::Authenticated(Page::Explore)
        );
    }
}
