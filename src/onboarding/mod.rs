//! Onboarding: the forms a new account fills in before reaching the app.
//!
//! Freelancers go through a four-step wizard; clients fill in one form.
//! Both end with a single `update_profile` call that sets
//! `onboardingCompleted`.

pub mod catalog;
pub mod client;
pub mod draft;
pub mod freelancer;
pub mod rows;
pub mod state;

pub use client::ClientOnboarding;
pub use draft::StepDraft;
pub use freelancer::{FreelancerWizard, StepForm};
pub use rows::RowList;
pub use state::WizardStep;
