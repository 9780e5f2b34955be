//! Identity and profile data models.
//!
//! Serialized with camelCase field names; these are the values held in the
//! `user` and `profile` storage slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the marketplace an account is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Freelancer,
    Client,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Freelancer => write!(f, "freelancer"),
            Self::Client => write!(f, "client"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freelancer" => Ok(Self::Freelancer),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Minimal authentication record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl std::str::FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            other => Err(format!("unknown skill level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub occupation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_to: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub college: String,
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passout_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub issued_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Full user-facing record. Shares its id with the [`Identity`].
///
/// Client-only and freelancer-only fields are all optional; which ones are
/// filled depends on the onboarding flow the user went through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_website: Option<String>,

    // Client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_skills: Option<Vec<String>>,
    /// May hold NaN in memory when the client left the field blank. JSON has
    /// no NaN, so it is written as `null` and reads back as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range_max: Option<f64>,

    // Freelancer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiences: Option<Vec<Experience>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Certification>>,

    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A bare profile with only the common fields set.
    pub fn new(
        identity: &Identity,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        country: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: identity.id.clone(),
            role: identity.role,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: identity.email.clone(),
            phone: None,
            country: country.into(),
            profile_photo_url: None,
            bio: None,
            languages: None,
            personal_website: None,
            company_name: None,
            industry: None,
            preferred_skills: None,
            budget_range_min: None,
            budget_range_max: None,
            occupations: None,
            experiences: None,
            skills: None,
            projects: None,
            education: None,
            certifications: None,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Merge a partial update into this profile. Does not touch `updatedAt`;
    /// the session store stamps that.
    pub fn apply(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            first_name,
            last_name,
            email,
            phone,
            country,
            profile_photo_url,
            bio,
            languages,
            personal_website,
            company_name,
            industry,
            preferred_skills,
            budget_range_min,
            budget_range_max,
            occupations,
            experiences,
            skills,
            projects,
            education,
            certifications,
            onboarding_completed,
        } = update;

        if let Some(v) = first_name {
            self.first_name = v;
        }
        if let Some(v) = last_name {
            self.last_name = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = country {
            self.country = v;
        }
        if let Some(v) = onboarding_completed {
            self.onboarding_completed = v;
        }

        merge_text(&mut self.phone, phone);
        merge(&mut self.profile_photo_url, profile_photo_url);
        merge_text(&mut self.bio, bio);
        merge(&mut self.languages, languages);
        merge(&mut self.personal_website, personal_website);
        merge(&mut self.company_name, company_name);
        merge(&mut self.industry, industry);
        merge(&mut self.preferred_skills, preferred_skills);
        merge(&mut self.budget_range_min, budget_range_min);
        merge(&mut self.budget_range_max, budget_range_max);
        merge(&mut self.occupations, occupations);
        merge(&mut self.experiences, experiences);
        merge(&mut self.skills, skills);
        merge(&mut self.projects, projects);
        merge(&mut self.education, education);
        merge(&mut self.certifications, certifications);
    }
}

fn merge<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

/// Like `merge`, but blank text clears the field.
fn merge_text(field: &mut Option<String>, value: Option<String>) {
    if let Some(text) = value {
        let text = text.trim();
        *field = (!text.is_empty()).then(|| text.to_string());
    }
}

/// Partial profile. `None` leaves the field untouched.
///
/// `id`, `role` and `createdAt` are fixed at sign-up and cannot be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiences: Option<Vec<Experience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Certification>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
