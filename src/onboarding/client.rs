//! ClientOnboarding: the single-step client form.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::catalog::{self, OTHER};
use super::draft::unknown_field;
use crate::error::SessionError;
use crate::session::{Profile, ProfileUpdate, SessionStore};

/// Leading decimal number, the way a browser's `parseFloat` reads one.
static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(Infinity|\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
        .expect("valid float regex")
});

/// Parse the leading number of `text`. Text without one (including blank
/// text) yields NaN.
pub fn parse_float_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    let Some(m) = FLOAT_PREFIX.find(text) else {
        return f64::NAN;
    };
    match m.as_str() {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        number => number.parse().unwrap_or(f64::NAN),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientOnboarding {
    strict: bool,
    pub company_name: String,
    pub industry: String,
    pub custom_industry: String,
    pub preferred_skills: Vec<String>,
    pub budget_range_min: String,
    pub budget_range_max: String,
    pub languages: Vec<String>,
    pub custom_language: String,
    pub bio: String,
}

impl ClientOnboarding {
    /// Pre-seed from whatever the profile already holds.
    pub fn from_profile(profile: &Profile, strict: bool) -> Self {
        let (industry, custom_industry) = match profile.industry.as_deref() {
            None | Some("") => (String::new(), String::new()),
            Some(known) if catalog::INDUSTRIES.contains(&known) => {
                (known.to_string(), String::new())
            }
            Some(custom) => (OTHER.to_string(), custom.to_string()),
        };
        let (languages, custom_language) = catalog::split_custom(
            profile.languages.as_deref().unwrap_or_default(),
            catalog::LANGUAGES,
            OTHER,
        );
        Self {
            strict,
            company_name: profile.company_name.clone().unwrap_or_default(),
            industry,
            custom_industry,
            preferred_skills: profile.preferred_skills.clone().unwrap_or_default(),
            budget_range_min: budget_text(profile.budget_range_min),
            budget_range_max: budget_text(profile.budget_range_max),
            languages,
            custom_language,
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    pub fn toggle_skill(&mut self, skill: &str) {
        catalog::toggle(&mut self.preferred_skills, skill);
    }

    pub fn toggle_language(&mut self, language: &str) {
        catalog::toggle(&mut self.languages, language);
    }

    /// Set a field by its camelCase name. Multi-selects toggle `value`.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        let target = match field {
            "preferredSkills" => {
                self.toggle_skill(value);
                return Ok(());
            }
            "languages" => {
                self.toggle_language(value);
                return Ok(());
            }
            "companyName" => &mut self.company_name,
            "industry" => &mut self.industry,
            "customIndustry" => &mut self.custom_industry,
            "budgetRangeMin" => &mut self.budget_range_min,
            "budgetRangeMax" => &mut self.budget_range_max,
            "customLanguage" => &mut self.custom_language,
            "bio" => &mut self.bio,
            _ => return Err(unknown_field(field)),
        };
        *target = value.to_string();
        Ok(())
    }

    /// Build the update the form commits.
    ///
    /// Budgets are parsed leniently: a blank or non-numeric budget becomes
    /// NaN, which is stored as absent. Strict mode rejects it instead.
    pub fn collect(&self) -> Result<ProfileUpdate, SessionError> {
        let budget_min = parse_float_prefix(&self.budget_range_min);
        let budget_max = parse_float_prefix(&self.budget_range_max);

        if self.strict {
            if self.company_name.trim().is_empty() {
                return Err(SessionError::validation("companyName"));
            }
            if budget_min.is_nan() {
                return Err(SessionError::validation("budgetRangeMin"));
            }
            if budget_max.is_nan() {
                return Err(SessionError::validation("budgetRangeMax"));
            }
        }

        let industry = if self.industry == OTHER {
            self.custom_industry.trim().to_string()
        } else {
            self.industry.clone()
        };

        Ok(ProfileUpdate {
            company_name: Some(self.company_name.trim().to_string()),
            industry: Some(industry),
            preferred_skills: Some(self.preferred_skills.clone()),
            budget_range_min: Some(budget_min),
            budget_range_max: Some(budget_max),
            languages: Some(catalog::resolve_placeholder(
                &self.languages,
                OTHER,
                &self.custom_language,
            )),
            bio: Some(self.bio.trim().to_string()),
            onboarding_completed: Some(true),
            ..Default::default()
        })
    }

    /// Commit the form. Returns the updated profile, or `None` when no one
    /// is signed in.
    pub async fn submit(&self, store: &SessionStore) -> Result<Option<Profile>, SessionError> {
        let update = self.collect()?;
        if update.budget_range_min.is_some_and(f64::is_nan)
            || update.budget_range_max.is_some_and(f64::is_nan)
        {
            warn!("Client budget left blank or non-numeric");
        }

        let profile = store.update_profile(update).await;
        match &profile {
            Some(p) => info!(user_id = %p.id, "Client onboarding complete"),
            None => warn!("Client onboarding submitted without an active session"),
        }
        Ok(profile)
    }
}

fn budget_text(budget: Option<f64>) -> String {
    budget
        .filter(|b| !b.is_nan())
        .map(|b| b.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::session::{MockAuthenticator, Role, SignUpRequest};
    use crate::store::{MemoryStorage, load_json, slot_keys};

    async fn client_store() -> (Arc<SessionStore>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::open(storage.clone(), Arc::new(MockAuthenticator::new())).await;
        store
            .sign_up(SignUpRequest {
                email: "buyer@acme.io".into(),
                password: SecretString::from("pw".to_string()),
                first_name: "Bo".into(),
                last_name: "Reyes".into(),
                country: "Mexico".into(),
                phone: String::new(),
                role: Role::Client,
            })
            .await
            .unwrap();
        (store, storage)
    }

    #[test]
    fn parses_like_parse_float() {
        assert_eq!(parse_float_prefix("250"), 250.0);
        assert_eq!(parse_float_prefix("  12.5k"), 12.5);
        assert_eq!(parse_float_prefix("-3e2"), -300.0);
        assert_eq!(parse_float_prefix(".5"), 0.5);
        assert_eq!(parse_float_prefix("Infinity"), f64::INFINITY);
        assert!(parse_float_prefix("").is_nan());
        assert!(parse_float_prefix("about 100").is_nan());
    }

    #[tokio::test]
    async fn submit_commits_all_fields() {
        let (store, _) = client_store().await;
        let mut form = ClientOnboarding::from_profile(&store.profile().await.unwrap(), false);
        form.set_field("companyName", "Acme").unwrap();
        form.set_field("industry", OTHER).unwrap();
        form.set_field("customIndustry", "Aerospace").unwrap();
        form.set_field("preferredSkills", "Translation").unwrap();
        form.set_field("budgetRangeMin", "100").unwrap();
        form.set_field("budgetRangeMax", "900").unwrap();
        form.set_field("languages", "Spanish").unwrap();

        let profile = form.submit(&store).await.unwrap().unwrap();
        assert!(profile.onboarding_completed);
        assert_eq!(profile.company_name.as_deref(), Some("Acme"));
        assert_eq!(profile.industry.as_deref(), Some("Aerospace"));
        assert_eq!(profile.budget_range_min, Some(100.0));
        assert_eq!(profile.budget_range_max, Some(900.0));
        assert_eq!(profile.languages, Some(vec!["Spanish".to_string()]));
    }

    #[tokio::test]
    async fn blank_budget_is_nan_in_memory_and_absent_in_storage() {
        let (store, storage) = client_store().await;
        let mut form = ClientOnboarding::from_profile(&store.profile().await.unwrap(), false);
        form.company_name = "Acme".into();

        let profile = form.submit(&store).await.unwrap().unwrap();
        assert!(profile.budget_range_min.is_some_and(f64::is_nan));
        assert!(profile.onboarding_completed);

        let stored: Profile = load_json(storage.as_ref(), slot_keys::PROFILE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.budget_range_min, None);
        assert!(stored.onboarding_completed);
    }

    #[tokio::test]
    async fn strict_mode_rejects_blank_budget() {
        let (store, _) = client_store().await;
        let mut form = ClientOnboarding::from_profile(&store.profile().await.unwrap(), true);
        form.company_name = "Acme".into();
        form.budget_range_min = "50".into();

        let err = form.submit(&store).await.unwrap_err();
        assert!(
            matches!(err, SessionError::ValidationFailed { ref field } if field == "budgetRangeMax")
        );
        assert!(!store.profile().await.unwrap().onboarding_completed);
    }

    #[tokio::test]
    async fn submit_without_session_is_noop() {
        let (store, _) = client_store().await;
        store.sign_out().await;
        let form = ClientOnboarding::default();
        assert!(form.submit(&store).await.unwrap().is_none());
    }

    #[test]
    fn other_industry_uses_custom_text() {
        let mut form = ClientOnboarding::default();
        form.industry = OTHER.into();
        form.custom_industry = "Aerospace".into();
        let update = form.collect().unwrap();
        assert_eq!(update.industry.as_deref(), Some("Aerospace"));
        assert!(form.set_field("colour", "red").is_err());
    }
}
