//! Profile page edit form.

use tracing::debug;

use crate::onboarding::draft::unknown_field;
use crate::session::{Profile, ProfileUpdate, SessionStore};

/// The editable subset of a profile, as form text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub bio: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            country: profile.country.clone(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    /// Fields that differ from `profile`, as an update. A cleared phone or
    /// bio goes out as blank text, which removes it from the profile.
    fn changes(&self, profile: &Profile) -> ProfileUpdate {
        let original = Self::from_profile(profile);
        let changed = |new: &String, old: &String| (new != old).then(|| new.trim().to_string());
        ProfileUpdate {
            first_name: changed(&self.first_name, &original.first_name),
            last_name: changed(&self.last_name, &original.last_name),
            email: changed(&self.email, &original.email),
            phone: changed(&self.phone, &original.phone),
            country: changed(&self.country, &original.country),
            bio: changed(&self.bio, &original.bio),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileEditor {
    form: Option<ProfileForm>,
}

impl ProfileEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.form.is_some()
    }

    pub fn form(&self) -> Option<&ProfileForm> {
        self.form.as_ref()
    }

    /// Enter edit mode seeded from `profile`.
    pub fn begin_edit(&mut self, profile: &Profile) {
        self.form = Some(ProfileForm::from_profile(profile));
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        let form = self
            .form
            .as_mut()
            .ok_or_else(|| "Not editing the profile".to_string())?;
        let target = match field {
            "firstName" => &mut form.first_name,
            "lastName" => &mut form.last_name,
            "email" => &mut form.email,
            "phone" => &mut form.phone,
            "country" => &mut form.country,
            "bio" => &mut form.bio,
            _ => return Err(unknown_field(field)),
        };
        *target = value.to_string();
        Ok(())
    }

    /// Drop the edits and leave edit mode.
    pub fn cancel(&mut self) {
        self.form = None;
    }

    /// Commit changed fields and leave edit mode. Returns the saved profile,
    /// or `None` if nothing was being edited or no one is signed in.
    pub async fn save(&mut self, store: &SessionStore) -> Option<Profile> {
        let form = self.form.take()?;
        let current = store.profile().await?;
        let update = form.changes(&current);
        if update.is_empty() {
            debug!(user_id = %current.id, "Profile save with no changes");
            return Some(current);
        }
        store.update_profile(update).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::session::MockAuthenticator;
    use crate::store::MemoryStorage;

    async fn signed_in() -> Arc<SessionStore> {
        let store = SessionStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(MockAuthenticator::new()),
        )
        .await;
        store
            .sign_in("john@doe.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn save_commits_only_changed_fields() {
        let store = signed_in().await;
        let before = store.profile().await.unwrap();
        let mut editor = ProfileEditor::new();
        editor.begin_edit(&before);
        editor.set_field("bio", "Rustacean").unwrap();
        editor.set_field("country", "Canada").unwrap();

        let saved = editor.save(&store).await.unwrap();
        assert!(!editor.is_editing());
        assert_eq!(saved.bio.as_deref(), Some("Rustacean"));
        assert_eq!(saved.country, "Canada");
        assert_eq!(saved.first_name, before.first_name);
        assert!(saved.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn clearing_optional_text_removes_it() {
        let store = signed_in().await;
        store
            .update_profile(ProfileUpdate {
                phone: Some("555-0100".into()),
                bio: Some("Rustacean".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut editor = ProfileEditor::new();
        editor.begin_edit(&store.profile().await.unwrap());
        editor.set_field("phone", "").unwrap();
        editor.set_field("bio", "   ").unwrap();

        let saved = editor.save(&store).await.unwrap();
        assert_eq!(saved.phone, None);
        assert_eq!(saved.bio, None);
    }

    #[tokio::test]
    async fn cancel_discards_edits() {
        let store = signed_in().await;
        let before = store.profile().await.unwrap();
        let mut editor = ProfileEditor::new();
        editor.begin_edit(&before);
        editor.set_field("firstName", "Jane").unwrap();
        editor.cancel();

        assert!(editor.save(&store).await.is_none());
        assert_eq!(store.profile().await.unwrap(), before);
    }

    #[tokio::test]
    async fn unchanged_save_leaves_stamp_alone() {
        let store = signed_in().await;
        let before = store.profile().await.unwrap();
        let mut editor = ProfileEditor::new();
        editor.begin_edit(&before);
        let saved = editor.save(&store).await.unwrap();
        assert_eq!(saved.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn save_without_session_is_noop() {
        let store = signed_in().await;
        let mut editor = ProfileEditor::new();
        editor.begin_edit(&store.profile().await.unwrap());
        store.sign_out().await;
        editor.set_field("bio", "gone").unwrap();
        assert!(editor.save(&store).await.is_none());
        assert!(store.profile().await.is_none());
    }

    #[test]
    fn set_field_requires_edit_mode() {
        let mut editor = ProfileEditor::new();
        assert!(editor.set_field("bio", "x").is_err());
    }
}
