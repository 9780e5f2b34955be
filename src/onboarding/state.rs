//! Freelancer wizard state machine: which step the user is on.

use serde::{Deserialize, Serialize};

/// The steps of the freelancer onboarding wizard.
///
/// Progresses linearly: Basic → Professional → SkillsPortfolio →
/// EducationCerts → Complete. Any step but the first can go back one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Basic,
    Professional,
    SkillsPortfolio,
    EducationCerts,
    Complete,
}

impl WizardStep {
    /// Number of form steps (Complete is not one).
    pub const COUNT: u8 = 4;

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Basic, Professional)
                | (Professional, SkillsPortfolio)
                | (SkillsPortfolio, EducationCerts)
                | (EducationCerts, Complete)
                | (Professional, Basic)
                | (SkillsPortfolio, Professional)
                | (EducationCerts, SkillsPortfolio)
        )
    }

    /// Whether the wizard is done.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Basic => Some(Professional),
            Professional => Some(SkillsPortfolio),
            SkillsPortfolio => Some(EducationCerts),
            EducationCerts => Some(Complete),
            Complete => None,
        }
    }

    /// The step `Back` leads to. `None` on the first step and once complete.
    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Basic | Complete => None,
            Professional => Some(Basic),
            SkillsPortfolio => Some(Professional),
            EducationCerts => Some(SkillsPortfolio),
        }
    }

    /// 1-based position for "Step n of 4".
    pub fn number(&self) -> u8 {
        match self {
            Self::Basic => 1,
            Self::Professional => 2,
            Self::SkillsPortfolio => 3,
            Self::EducationCerts => 4,
            Self::Complete => Self::COUNT,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Basic => "Basic Information",
            Self::Professional => "Professional Information",
            Self::SkillsPortfolio => "Skills & Portfolio",
            Self::EducationCerts => "Education & Certifications",
            Self::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Professional => "professional",
            Self::SkillsPortfolio => "skills_portfolio",
            Self::EducationCerts => "education_certs",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
