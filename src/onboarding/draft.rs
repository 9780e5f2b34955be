//! Per-step form buffers for the freelancer wizard.
//!
//! Every field is raw text as typed. Nothing here is persisted; the wizard
//! folds all four drafts into one `ProfileUpdate` when it completes.

use super::catalog::{self, CUSTOM_OCCUPATION, OTHER};
use super::rows::RowList;
use crate::error::SessionError;
use crate::session::{
    Certification, Education, Experience, Profile, ProfileUpdate, Project, Skill, SkillLevel,
};

/// Behaviour shared by every step's draft.
pub trait StepDraft {
    /// Check required fields. Only called when strict onboarding is on.
    fn validate(&self) -> Result<(), SessionError>;

    /// Write this step's fields into the aggregate update.
    fn contribute(&self, update: &mut ProfileUpdate, strict: bool) -> Result<(), SessionError>;

    /// Set one field by its camelCase name. Row fields are addressed as
    /// `list.index.field`; multi-select fields toggle `value`.
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), String>;

    /// Append a blank row to `list` and return its index.
    fn add_row(&mut self, list: &str) -> Result<usize, String> {
        Err(format!("no list '{list}' on this step"))
    }

    /// Remove a row from `list`. `Ok(false)` when the row must stay.
    fn remove_row(&mut self, list: &str, _index: usize) -> Result<bool, String> {
        Err(format!("no list '{list}' on this step"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceRow {
    pub occupation: String,
    pub years_from: String,
    pub years_to: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillRow {
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRow {
    pub title: String,
    pub description: String,
    pub image: String,
    /// Comma-separated.
    pub links: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationRow {
    pub college: String,
    pub degree: String,
    pub passout_year: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificationRow {
    pub name: String,
    pub issued_by: String,
    pub year: String,
}

/// Step 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub profile_photo: String,
}

/// Step 2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfessionalInfo {
    pub occupations: Vec<String>,
    pub custom_occupation: String,
    pub experiences: RowList<ExperienceRow>,
    pub languages: Vec<String>,
    pub custom_language: String,
    pub bio: String,
}

/// Step 3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillsPortfolio {
    pub skills: RowList<SkillRow>,
    pub projects: RowList<ProjectRow>,
    pub personal_website: String,
}

/// Step 4.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationCerts {
    pub education: RowList<EducationRow>,
    pub certifications: RowList<CertificationRow>,
}

impl BasicInfo {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            country: profile.country.clone(),
            profile_photo: profile.profile_photo_url.clone().unwrap_or_default(),
        }
    }
}

impl StepDraft for BasicInfo {
    fn validate(&self) -> Result<(), SessionError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("email", &self.email)?;
        require("country", &self.country)
    }

    fn contribute(&self, update: &mut ProfileUpdate, _strict: bool) -> Result<(), SessionError> {
        update.first_name = Some(self.first_name.trim().to_string());
        update.last_name = Some(self.last_name.trim().to_string());
        update.email = Some(self.email.trim().to_string());
        update.country = Some(self.country.trim().to_string());
        update.phone = non_blank(&self.phone);
        update.profile_photo_url = non_blank(&self.profile_photo);
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        let target = match field {
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "country" => &mut self.country,
            "profilePhoto" => &mut self.profile_photo,
            _ => return Err(unknown_field(field)),
        };
        *target = value.to_string();
        Ok(())
    }
}

impl ProfessionalInfo {
    pub fn from_profile(profile: &Profile) -> Self {
        let (occupations, custom_occupation) = catalog::split_custom(
            profile.occupations.as_deref().unwrap_or_default(),
            catalog::OCCUPATIONS,
            CUSTOM_OCCUPATION,
        );
        let (languages, custom_language) = catalog::split_custom(
            profile.languages.as_deref().unwrap_or_default(),
            catalog::LANGUAGES,
            OTHER,
        );
        let experiences = profile
            .experiences
            .iter()
            .flatten()
            .map(|e| ExperienceRow {
                occupation: e.occupation.clone(),
                years_from: year_text(e.years_from),
                years_to: year_text(e.years_to),
            })
            .collect();
        Self {
            occupations,
            custom_occupation,
            experiences: RowList::from_rows(experiences),
            languages,
            custom_language,
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    pub fn toggle_occupation(&mut self, occupation: &str) {
        catalog::toggle(&mut self.occupations, occupation);
    }

    pub fn toggle_language(&mut self, language: &str) {
        catalog::toggle(&mut self.languages, language);
    }
}

impl StepDraft for ProfessionalInfo {
    fn validate(&self) -> Result<(), SessionError> {
        let occupations =
            catalog::resolve_placeholder(&self.occupations, CUSTOM_OCCUPATION, &self.custom_occupation);
        if occupations.is_empty() {
            return Err(SessionError::validation("occupations"));
        }
        if self.occupations.iter().any(|o| o == CUSTOM_OCCUPATION) {
            require("customOccupation", &self.custom_occupation)?;
        }
        if self.languages.iter().any(|l| l == OTHER) {
            require("customLanguage", &self.custom_language)?;
        }
        Ok(())
    }

    fn contribute(&self, update: &mut ProfileUpdate, strict: bool) -> Result<(), SessionError> {
        update.occupations = Some(catalog::resolve_placeholder(
            &self.occupations,
            CUSTOM_OCCUPATION,
            &self.custom_occupation,
        ));
        update.languages = Some(catalog::resolve_placeholder(
            &self.languages,
            OTHER,
            &self.custom_language,
        ));

        let mut experiences = Vec::new();
        for row in self.experiences.iter().filter(|r| !is_blank_experience(r)) {
            experiences.push(Experience {
                occupation: row.occupation.trim().to_string(),
                years_from: parse_year("yearsFrom", &row.years_from, strict)?,
                years_to: parse_year("yearsTo", &row.years_to, strict)?,
            });
        }
        update.experiences = Some(experiences);
        update.bio = non_blank(&self.bio);
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        match field {
            "occupations" => self.toggle_occupation(value),
            "customOccupation" => self.custom_occupation = value.to_string(),
            "languages" => self.toggle_language(value),
            "customLanguage" => self.custom_language = value.to_string(),
            "bio" => self.bio = value.to_string(),
            _ => {
                let (index, name) = row_address(field, "experiences")?;
                let row = row_mut(&mut self.experiences, index)?;
                let target = match name {
                    "occupation" => &mut row.occupation,
                    "yearsFrom" => &mut row.years_from,
                    "yearsTo" => &mut row.years_to,
                    _ => return Err(unknown_field(field)),
                };
                *target = value.to_string();
            }
        }
        Ok(())
    }

    fn add_row(&mut self, list: &str) -> Result<usize, String> {
        match list {
            "experiences" => Ok(push_row(&mut self.experiences)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }

    fn remove_row(&mut self, list: &str, index: usize) -> Result<bool, String> {
        match list {
            "experiences" => Ok(self.experiences.remove(index)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }
}

impl SkillsPortfolio {
    pub fn from_profile(profile: &Profile) -> Self {
        let skills = profile
            .skills
            .iter()
            .flatten()
            .map(|s| SkillRow {
                name: s.name.clone(),
                level: s.level,
            })
            .collect();
        let projects = profile
            .projects
            .iter()
            .flatten()
            .map(|p| ProjectRow {
                title: p.title.clone(),
                description: p.description.clone(),
                image: p.image_url.clone().unwrap_or_default(),
                links: p.links.join(", "),
            })
            .collect();
        Self {
            skills: RowList::from_rows(skills),
            projects: RowList::from_rows(projects),
            personal_website: profile.personal_website.clone().unwrap_or_default(),
        }
    }
}

impl StepDraft for SkillsPortfolio {
    fn validate(&self) -> Result<(), SessionError> {
        if self.skills.iter().all(|s| s.name.trim().is_empty()) {
            return Err(SessionError::validation("skills"));
        }
        Ok(())
    }

    fn contribute(&self, update: &mut ProfileUpdate, _strict: bool) -> Result<(), SessionError> {
        update.skills = Some(
            self.skills
                .iter()
                .filter(|s| !s.name.trim().is_empty())
                .map(|s| Skill {
                    name: s.name.trim().to_string(),
                    level: s.level,
                })
                .collect(),
        );
        update.projects = Some(
            self.projects
                .iter()
                .filter(|p| !(p.title.trim().is_empty() && p.description.trim().is_empty()))
                .map(|p| Project {
                    title: p.title.trim().to_string(),
                    description: p.description.trim().to_string(),
                    image_url: non_blank(&p.image),
                    links: split_links(&p.links),
                })
                .collect(),
        );
        update.personal_website = non_blank(&self.personal_website);
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        if field == "personalWebsite" {
            self.personal_website = value.to_string();
            return Ok(());
        }
        if let Ok((index, name)) = row_address(field, "skills") {
            let row = row_mut(&mut self.skills, index)?;
            match name {
                "name" => row.name = value.to_string(),
                "level" => row.level = value.parse()?,
                _ => return Err(unknown_field(field)),
            }
            return Ok(());
        }
        let (index, name) = row_address(field, "projects")?;
        let row = row_mut(&mut self.projects, index)?;
        let target = match name {
            "title" => &mut row.title,
            "description" => &mut row.description,
            "image" => &mut row.image,
            "links" => &mut row.links,
            _ => return Err(unknown_field(field)),
        };
        *target = value.to_string();
        Ok(())
    }

    fn add_row(&mut self, list: &str) -> Result<usize, String> {
        match list {
            "skills" => Ok(push_row(&mut self.skills)),
            "projects" => Ok(push_row(&mut self.projects)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }

    fn remove_row(&mut self, list: &str, index: usize) -> Result<bool, String> {
        match list {
            "skills" => Ok(self.skills.remove(index)),
            "projects" => Ok(self.projects.remove(index)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }
}

impl EducationCerts {
    pub fn from_profile(profile: &Profile) -> Self {
        let education = profile
            .education
            .iter()
            .flatten()
            .map(|e| EducationRow {
                college: e.college.clone(),
                degree: e.degree.clone(),
                passout_year: year_text(e.passout_year),
            })
            .collect();
        let certifications = profile
            .certifications
            .iter()
            .flatten()
            .map(|c| CertificationRow {
                name: c.name.clone(),
                issued_by: c.issued_by.clone(),
                year: year_text(c.year),
            })
            .collect();
        Self {
            education: RowList::from_rows(education),
            certifications: RowList::from_rows(certifications),
        }
    }
}

impl StepDraft for EducationCerts {
    fn validate(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn contribute(&self, update: &mut ProfileUpdate, strict: bool) -> Result<(), SessionError> {
        let mut education = Vec::new();
        for row in self
            .education
            .iter()
            .filter(|r| !(r.college.trim().is_empty() && r.degree.trim().is_empty()))
        {
            education.push(Education {
                college: row.college.trim().to_string(),
                degree: row.degree.trim().to_string(),
                passout_year: parse_year("passoutYear", &row.passout_year, strict)?,
            });
        }

        let mut certifications = Vec::new();
        for row in self.certifications.iter().filter(|r| !r.name.trim().is_empty()) {
            certifications.push(Certification {
                name: row.name.trim().to_string(),
                issued_by: row.issued_by.trim().to_string(),
                year: parse_year("year", &row.year, strict)?,
            });
        }

        update.education = Some(education);
        update.certifications = Some(certifications);
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        if let Ok((index, name)) = row_address(field, "education") {
            let row = row_mut(&mut self.education, index)?;
            let target = match name {
                "college" => &mut row.college,
                "degree" => &mut row.degree,
                "passoutYear" => &mut row.passout_year,
                _ => return Err(unknown_field(field)),
            };
            *target = value.to_string();
            return Ok(());
        }
        let (index, name) = row_address(field, "certifications")?;
        let row = row_mut(&mut self.certifications, index)?;
        let target = match name {
            "name" => &mut row.name,
            "issuedBy" => &mut row.issued_by,
            "year" => &mut row.year,
            _ => return Err(unknown_field(field)),
        };
        *target = value.to_string();
        Ok(())
    }

    fn add_row(&mut self, list: &str) -> Result<usize, String> {
        match list {
            "education" => Ok(push_row(&mut self.education)),
            "certifications" => Ok(push_row(&mut self.certifications)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }

    fn remove_row(&mut self, list: &str, index: usize) -> Result<bool, String> {
        match list {
            "education" => Ok(self.education.remove(index)),
            "certifications" => Ok(self.certifications.remove(index)),
            _ => Err(format!("no list '{list}' on this step")),
        }
    }
}

pub(crate) fn unknown_field(field: &str) -> String {
    format!("unknown field '{field}'")
}

/// Split `experiences.2.yearsFrom` into `(2, "yearsFrom")` when it belongs to
/// `list`.
fn row_address<'a>(field: &'a str, list: &str) -> Result<(usize, &'a str), String> {
    let mut parts = field.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(index), Some(name)) if l == list => index
            .parse()
            .map(|i| (i, name))
            .map_err(|_| format!("bad row index in '{field}'")),
        _ => Err(unknown_field(field)),
    }
}

fn row_mut<T>(rows: &mut RowList<T>, index: usize) -> Result<&mut T, String> {
    rows.get_mut(index)
        .ok_or_else(|| format!("no row {index}"))
}

fn push_row<T: Default>(rows: &mut RowList<T>) -> usize {
    rows.add();
    rows.len() - 1
}

fn require(field: &str, value: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        Err(SessionError::validation(field))
    } else {
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_blank_experience(row: &ExperienceRow) -> bool {
    row.occupation.trim().is_empty()
        && row.years_from.trim().is_empty()
        && row.years_to.trim().is_empty()
}

fn year_text(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

/// Blank is absent. Unparseable text is absent too, unless strict, where it
/// fails naming `field`.
fn parse_year(field: &str, text: &str, strict: bool) -> Result<Option<i32>, SessionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<i32>() {
        Ok(year) => Ok(Some(year)),
        Err(_) if strict => Err(SessionError::validation(field)),
        Err(_) => Ok(None),
    }
}

fn split_links(links: &str) -> Vec<String> {
    links
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_info_requires_names_email_country() {
        let mut basic = BasicInfo {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        };
        let err = basic.validate().unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "country"));
        basic.country = "UK".into();
        assert!(basic.validate().is_ok());
    }

    #[test]
    fn professional_resolves_custom_entries_and_drops_blank_rows() {
        let mut info = ProfessionalInfo::default();
        info.toggle_occupation("Web Developer");
        info.toggle_occupation(CUSTOM_OCCUPATION);
        info.custom_occupation = "Luthier".into();
        info.toggle_language("English");
        {
            let row = info.experiences.get_mut(0).unwrap();
            row.occupation = "Web Developer".into();
            row.years_from = "2015".into();
            row.years_to = "".into();
        }
        info.experiences.add();

        let mut update = ProfileUpdate::default();
        info.contribute(&mut update, false).unwrap();

        assert_eq!(
            update.occupations.unwrap(),
            vec!["Web Developer".to_string(), "Luthier".to_string()]
        );
        assert_eq!(update.languages.unwrap(), vec!["English".to_string()]);
        let experiences = update.experiences.unwrap();
        assert_eq!(experiences.len(), 1);
        assert_eq!(experiences[0].years_from, Some(2015));
        assert_eq!(experiences[0].years_to, None);
        assert!(update.bio.is_none());
    }

    #[test]
    fn professional_validation_needs_custom_text() {
        let mut info = ProfessionalInfo::default();
        assert!(info.validate().is_err());
        info.toggle_occupation(CUSTOM_OCCUPATION);
        let err = info.validate().unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "occupations"));
        info.toggle_occupation("Video Editor");
        let err = info.validate().unwrap_err();
        assert!(
            matches!(err, SessionError::ValidationFailed { ref field } if field == "customOccupation")
        );
        info.custom_occupation = "Colorist".into();
        assert!(info.validate().is_ok());
    }

    #[test]
    fn bad_year_is_dropped_unless_strict() {
        let mut certs = EducationCerts::default();
        {
            let row = certs.education.get_mut(0).unwrap();
            row.college = "MIT".into();
            row.degree = "BSc".into();
            row.passout_year = "soon".into();
        }

        let mut update = ProfileUpdate::default();
        certs.contribute(&mut update, false).unwrap();
        assert_eq!(update.education.unwrap()[0].passout_year, None);

        let err = certs.contribute(&mut ProfileUpdate::default(), true).unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "passoutYear"));
    }

    #[test]
    fn project_links_are_split() {
        let mut portfolio = SkillsPortfolio::default();
        portfolio.skills.get_mut(0).unwrap().name = "Rust".into();
        {
            let project = portfolio.projects.get_mut(0).unwrap();
            project.title = "Compiler".into();
            project.links = "https://a.dev, ,https://b.dev".into();
        }

        let mut update = ProfileUpdate::default();
        portfolio.contribute(&mut update, false).unwrap();
        let projects = update.projects.unwrap();
        assert_eq!(projects[0].links, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(update.skills.unwrap()[0].level, SkillLevel::Beginner);
    }

    #[test]
    fn set_field_addresses_rows_by_index() {
        let mut portfolio = SkillsPortfolio::default();
        assert_eq!(portfolio.add_row("skills").unwrap(), 1);
        portfolio.set_field("skills.1.name", "Go").unwrap();
        portfolio.set_field("skills.1.level", "expert").unwrap();
        assert_eq!(portfolio.skills.get(1).unwrap().level, SkillLevel::Expert);

        assert!(portfolio.set_field("skills.5.name", "x").is_err());
        assert!(portfolio.set_field("skills.0.colour", "x").is_err());
        assert!(portfolio.set_field("skills.0.level", "guru").is_err());
        assert!(portfolio.add_row("education").is_err());
        assert!(portfolio.remove_row("projects", 0).is_ok_and(|removed| !removed));
    }

    #[test]
    fn set_field_toggles_multi_selects() {
        let mut info = ProfessionalInfo::default();
        info.set_field("languages", "French").unwrap();
        info.set_field("languages", "German").unwrap();
        info.set_field("languages", "French").unwrap();
        assert_eq!(info.languages, vec!["German".to_string()]);
        info.set_field("experiences.0.yearsTo", "2020").unwrap();
        assert_eq!(info.experiences.get(0).unwrap().years_to, "2020");
    }

    #[test]
    fn portfolio_requires_a_named_skill() {
        let portfolio = SkillsPortfolio::default();
        let err = portfolio.validate().unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed { ref field } if field == "skills"));
    }
}
