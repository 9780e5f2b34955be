//! FreelancerWizard: four form steps that end in one profile update.

use tracing::{debug, info, warn};

use super::draft::{BasicInfo, EducationCerts, ProfessionalInfo, SkillsPortfolio, StepDraft};
use super::state::WizardStep;
use crate::error::SessionError;
use crate::session::{Profile, ProfileUpdate, SessionStore};

/// Borrowed view of the draft for the step currently on screen.
#[derive(Debug)]
pub enum StepForm<'a> {
    Basic(&'a BasicInfo),
    Professional(&'a ProfessionalInfo),
    SkillsPortfolio(&'a SkillsPortfolio),
    EducationCerts(&'a EducationCerts),
}

/// Freelancer onboarding.
///
/// Drafts for all four steps live side by side so `back` never loses input.
/// Nothing is written until the last step commits.
#[derive(Debug, Clone)]
pub struct FreelancerWizard {
    step: WizardStep,
    strict: bool,
    pub basic: BasicInfo,
    pub professional: ProfessionalInfo,
    pub portfolio: SkillsPortfolio,
    pub education: EducationCerts,
}

impl FreelancerWizard {
    /// Start at step 1 with every field the profile already has.
    pub fn from_profile(profile: &Profile, strict: bool) -> Self {
        Self {
            step: WizardStep::Basic,
            strict,
            basic: BasicInfo::from_profile(profile),
            professional: ProfessionalInfo::from_profile(profile),
            portfolio: SkillsPortfolio::from_profile(profile),
            education: EducationCerts::from_profile(profile),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    /// "Step n of 4".
    pub fn progress(&self) -> (u8, u8) {
        (self.step.number(), WizardStep::COUNT)
    }

    pub fn progress_percent(&self) -> u8 {
        if self.step.is_terminal() {
            return 100;
        }
        self.step.number() * 100 / WizardStep::COUNT
    }

    pub fn form(&self) -> Option<StepForm<'_>> {
        match self.step {
            WizardStep::Basic => Some(StepForm::Basic(&self.basic)),
            WizardStep::Professional => Some(StepForm::Professional(&self.professional)),
            WizardStep::SkillsPortfolio => Some(StepForm::SkillsPortfolio(&self.portfolio)),
            WizardStep::EducationCerts => Some(StepForm::EducationCerts(&self.education)),
            WizardStep::Complete => None,
        }
    }

    fn current(&self) -> Option<&dyn StepDraft> {
        match self.step {
            WizardStep::Basic => Some(&self.basic),
            WizardStep::Professional => Some(&self.professional),
            WizardStep::SkillsPortfolio => Some(&self.portfolio),
            WizardStep::EducationCerts => Some(&self.education),
            WizardStep::Complete => None,
        }
    }

    fn current_mut(&mut self) -> Result<&mut dyn StepDraft, String> {
        match self.step {
            WizardStep::Basic => Ok(&mut self.basic),
            WizardStep::Professional => Ok(&mut self.professional),
            WizardStep::SkillsPortfolio => Ok(&mut self.portfolio),
            WizardStep::EducationCerts => Ok(&mut self.education),
            WizardStep::Complete => Err("Onboarding is already complete".to_string()),
        }
    }

    /// Set a field on the current step's form.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        self.current_mut()?.set_field(field, value)
    }

    /// Append a row to a list on the current step.
    pub fn add_row(&mut self, list: &str) -> Result<usize, String> {
        self.current_mut()?.add_row(list)
    }

    /// Remove a row from a list on the current step. `Ok(false)` when it is
    /// the only row left.
    pub fn remove_row(&mut self, list: &str, index: usize) -> Result<bool, String> {
        self.current_mut()?.remove_row(list, index)
    }

    pub fn add_experience(&mut self) {
        self.professional.experiences.add();
    }

    pub fn remove_experience(&mut self, index: usize) -> bool {
        self.professional.experiences.remove(index)
    }

    pub fn add_skill(&mut self) {
        self.portfolio.skills.add();
    }

    pub fn remove_skill(&mut self, index: usize) -> bool {
        self.portfolio.skills.remove(index)
    }

    pub fn add_project(&mut self) {
        self.portfolio.projects.add();
    }

    pub fn remove_project(&mut self, index: usize) -> bool {
        self.portfolio.projects.remove(index)
    }

    pub fn add_education(&mut self) {
        self.education.education.add();
    }

    pub fn remove_education(&mut self, index: usize) -> bool {
        self.education.education.remove(index)
    }

    pub fn add_certification(&mut self) {
        self.education.certifications.add();
    }

    pub fn remove_certification(&mut self, index: usize) -> bool {
        self.education.certifications.remove(index)
    }

    /// Go back one step. Returns false on step 1 and once complete.
    pub fn back(&mut self) -> bool {
        match self.step.previous() {
            Some(prev) if self.step.can_transition_to(prev) => {
                debug!(from = %self.step, to = %prev, "Wizard back");
                self.step = prev;
                true
            }
            _ => false,
        }
    }

    /// Move forward one step. On the last step this commits the collected
    /// fields with `onboardingCompleted` set and finishes the wizard.
    ///
    /// With no active session the commit is a no-op and the wizard stays on
    /// the last step.
    pub async fn next(&mut self, store: &SessionStore) -> Result<WizardStep, SessionError> {
        let Some(draft) = self.current() else {
            return Ok(self.step);
        };
        if self.strict {
            draft.validate()?;
        }

        if self.step == WizardStep::EducationCerts {
            return self.finish(store).await;
        }

        let Some(next) = self.step.next() else {
            return Ok(self.step);
        };
        debug!(from = %self.step, to = %next, "Wizard next");
        self.step = next;
        Ok(next)
    }

    async fn finish(&mut self, store: &SessionStore) -> Result<WizardStep, SessionError> {
        let update = self.collect()?;
        match store.update_profile(update).await {
            Some(profile) => {
                info!(user_id = %profile.id, "Freelancer onboarding complete");
                self.step = WizardStep::Complete;
            }
            None => warn!("Onboarding finished without an active session"),
        }
        Ok(self.step)
    }

    /// Fold every step's draft into one update.
    pub fn collect(&self) -> Result<ProfileUpdate, SessionError> {
        let mut update = ProfileUpdate::default();
        let drafts: [&dyn StepDraft; 4] = [
            &self.basic,
            &self.professional,
            &self.portfolio,
            &self.education,
        ];
        for draft in drafts {
            draft.contribute(&mut update, self.strict)?;
        }
        update.onboarding_completed = Some(true);
        Ok(update)
    }
}
