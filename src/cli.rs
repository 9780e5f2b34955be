//! Interactive shell: stdin/stdout front door over the session store.
//!
//! One command per line, one text reply per command. `Shell::execute` does
//! the work so it can be driven without a terminal.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, error};

use crate::onboarding::{ClientOnboarding, FreelancerWizard, StepForm, WizardStep, catalog};
use crate::session::{Profile, Role, SessionEvent, SessionStore, SignUpRequest};
use crate::views::{Navigator, Page, ProfileEditor, View, current_view, menu_items};

const HELP: &str = "\
Commands:
  signup <freelancer|client> <email> <password> <first> <last> <country>
  signin <email> <password>
  signout                 end the session
  whoami                  show the signed-in user
  view                    show the current screen
  go <page>               open a page (dashboard, explore, profile, ...)
  menu                    list the pages for your role
  set <field> <value>     fill a form field (lists: list.index.field)
  add <list>              add a row to a list on this step
  remove <list> <index>   remove a row
  next | back             move through the onboarding wizard
  done                    finish onboarding
  edit | save | cancel    edit your profile
  help | quit";

/// Reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub text: String,
    pub quit: bool,
}

impl ShellOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// The onboarding form bound to a user id.
enum OnboardingForm {
    Freelancer(String, FreelancerWizard),
    Client(String, ClientOnboarding),
}

pub struct Shell {
    store: Arc<SessionStore>,
    strict: bool,
    navigator: Navigator,
    editor: ProfileEditor,
    onboarding: Option<OnboardingForm>,
    events: broadcast::Receiver<SessionEvent>,
}

impl Shell {
    pub fn new(store: Arc<SessionStore>, strict_onboarding: bool) -> Self {
        let events = store.subscribe();
        Self {
            store,
            strict: strict_onboarding,
            navigator: Navigator::new(),
            editor: ProfileEditor::new(),
            onboarding: None,
            events,
        }
    }

    /// Read commands from stdin until `quit` or EOF.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", self.execute("view").await.text);
        eprint!("> ");
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                eprint!("> ");
                continue;
            }
            let output = self.execute(line).await;
            println!("{}", output.text);
            for warning in self.drain_warnings() {
                eprintln!("warning: {warning}");
            }
            if output.quit {
                break;
            }
            eprint!("> ");
        }
        Ok(())
    }

    /// Storage warnings broadcast since the last call.
    fn drain_warnings(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::StorageDegraded { reason }) => {
                    warnings.push(format!("storage lost ({reason}), session kept in memory only"))
                }
                Ok(event) => debug!(?event, "Session event"),
                Err(TryRecvError::Lagged(n)) => debug!(skipped = n, "Session events lagged"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        warnings
    }

    pub async fn execute(&mut self, line: &str) -> ShellOutput {
        let (command, rest) = line
            .trim()
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line.trim(), ""));

        let result = match command {
            "help" => Ok(HELP.to_string()),
            "quit" | "exit" => {
                return ShellOutput {
                    text: "Bye.".to_string(),
                    quit: true,
                };
            }
            "signup" => self.sign_up(rest).await,
            "signin" => self.sign_in(rest).await,
            "signout" => self.sign_out().await,
            "whoami" => Ok(self.whoami().await),
            "view" => Ok(self.render().await),
            "go" => self.go(rest).await,
            "menu" => self.menu().await,
            "set" => self.set(rest).await,
            "add" => self.add_row(rest).await,
            "remove" => self.remove_row(rest).await,
            "next" => self.next().await,
            "back" => self.back().await,
            "done" => self.done().await,
            "edit" => self.edit().await,
            "save" => self.save().await,
            "cancel" => {
                self.editor.cancel();
                Ok(self.render().await)
            }
            other => Err(format!("Unknown command '{other}'. Type 'help'.")),
        };

        ShellOutput::text(result.unwrap_or_else(|e| format!("error: {e}")))
    }

    // ── Session ─────────────────────────────────────────────────────────

    async fn sign_up(&mut self, args: &str) -> Result<String, String> {
        let mut rest = args;
        let (Some(role), Some(email), Some(password), Some(first), Some(last), Some(country)) = (
            next_word(&mut rest),
            next_word(&mut rest),
            next_word(&mut rest),
            next_word(&mut rest),
            next_word(&mut rest),
            Some(rest.trim()).filter(|c| !c.is_empty()),
        ) else {
            return Err(
                "usage: signup <freelancer|client> <email> <password> <first> <last> <country>"
                    .to_string(),
            );
        };
        let role: Role = role.parse()?;

        self.store
            .sign_up(SignUpRequest {
                email: email.to_string(),
                password: SecretString::from(password.to_string()),
                first_name: first.to_string(),
                last_name: last.to_string(),
                country: country.to_string(),
                phone: String::new(),
                role,
            })
            .await
            .map_err(|e| e.to_string())?;

        self.reset_ui();
        Ok(self.render().await)
    }

    async fn sign_in(&mut self, args: &str) -> Result<String, String> {
        let mut parts = args.split_whitespace();
        let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
            return Err("usage: signin <email> <password>".to_string());
        };
        self.store
            .sign_in(email, &SecretString::from(password.to_string()))
            .await
            .map_err(|e| e.to_string())?;

        self.reset_ui();
        Ok(self.render().await)
    }

    async fn sign_out(&mut self) -> Result<String, String> {
        self.store.sign_out().await;
        self.reset_ui();
        Ok(format!("Signed out.\n{}", self.render().await))
    }

    fn reset_ui(&mut self) {
        self.navigator.reset();
        self.editor.cancel();
        self.onboarding = None;
    }

    async fn whoami(&self) -> String {
        match (self.store.identity().await, self.store.profile().await) {
            (Some(identity), Some(profile)) => format!(
                "{} <{}> ({}, id {})",
                profile.display_name(),
                identity.email,
                identity.role,
                identity.id
            ),
            _ => "Not signed in.".to_string(),
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────

    async fn go(&mut self, page: &str) -> Result<String, String> {
        self.require_authenticated().await?;
        let page = self.navigator.go(page);
        if page != Page::Profile {
            self.editor.cancel();
        }
        Ok(self.render().await)
    }

    async fn menu(&self) -> Result<String, String> {
        self.require_authenticated().await?;
        let identity = self.store.identity().await.ok_or("Not signed in.")?;
        let current = self.navigator.current();
        let lines: Vec<String> = menu_items(identity.role)
            .iter()
            .map(|item| {
                let marker = if item.id == current { "*" } else { " " };
                format!("{marker} {:<12} {}", item.id.id(), item.label)
            })
            .collect();
        Ok(lines.join("\n"))
    }

    async fn require_authenticated(&self) -> Result<(), String> {
        match current_view(&self.store, self.navigator.current()).await {
            View::Authenticated(_) => Ok(()),
            view if view.is_onboarding() => Err("Finish onboarding first.".to_string()),
            _ => Err("Sign in first.".to_string()),
        }
    }

    // ── Forms ───────────────────────────────────────────────────────────

    /// The onboarding form for the current session, created on first use
    /// and seeded from the profile.
    async fn onboarding_form(&mut self) -> Result<&mut OnboardingForm, String> {
        let view = current_view(&self.store, self.navigator.current()).await;
        let profile = self.store.profile().await;
        let Some(profile) = profile.filter(|_| view.is_onboarding()) else {
            return Err("Nothing to onboard.".to_string());
        };

        let bound_to = match &self.onboarding {
            Some(OnboardingForm::Freelancer(id, _) | OnboardingForm::Client(id, _)) => Some(id),
            None => None,
        };
        if bound_to != Some(&profile.id) {
            self.onboarding = Some(new_form(&profile, self.strict));
        }
        self.onboarding
            .as_mut()
            .ok_or_else(|| "Nothing to onboard.".to_string())
    }

    async fn set(&mut self, args: &str) -> Result<String, String> {
        let (field, value) = args
            .split_once(char::is_whitespace)
            .map(|(f, v)| (f, v.trim()))
            .unwrap_or((args, ""));
        if field.is_empty() {
            return Err("usage: set <field> <value>".to_string());
        }

        if self.editor.is_editing() {
            self.editor.set_field(field, value)?;
            return Ok(format!("{field} = {value}"));
        }
        match self.onboarding_form().await? {
            OnboardingForm::Freelancer(_, wizard) => wizard.set_field(field, value)?,
            OnboardingForm::Client(_, form) => form.set_field(field, value)?,
        }
        Ok(format!("{field} = {value}"))
    }

    async fn add_row(&mut self, list: &str) -> Result<String, String> {
        let OnboardingForm::Freelancer(_, wizard) = self.onboarding_form().await? else {
            return Err("This form has no lists.".to_string());
        };
        let index = wizard.add_row(list)?;
        Ok(format!("Added {list}.{index}"))
    }

    async fn remove_row(&mut self, args: &str) -> Result<String, String> {
        let mut parts = args.split_whitespace();
        let (Some(list), Some(index)) = (parts.next(), parts.next()) else {
            return Err("usage: remove <list> <index>".to_string());
        };
        let index: usize = index.parse().map_err(|_| format!("bad index '{index}'"))?;
        let OnboardingForm::Freelancer(_, wizard) = self.onboarding_form().await? else {
            return Err("This form has no lists.".to_string());
        };
        if wizard.remove_row(list, index)? {
            Ok(format!("Removed {list}.{index}"))
        } else {
            Ok(format!("Cannot remove {list}.{index}: at least one row must remain"))
        }
    }

    async fn next(&mut self) -> Result<String, String> {
        let store = Arc::clone(&self.store);
        let OnboardingForm::Freelancer(_, wizard) = self.onboarding_form().await? else {
            return Err("The client form has one step. Use 'done'.".to_string());
        };
        let step = wizard.next(&store).await.map_err(|e| e.to_string())?;
        if step.is_terminal() {
            self.onboarding = None;
        }
        Ok(self.render().await)
    }

    async fn back(&mut self) -> Result<String, String> {
        let OnboardingForm::Freelancer(_, wizard) = self.onboarding_form().await? else {
            return Err("The client form has one step.".to_string());
        };
        if !wizard.back() {
            return Err("Already on the first step.".to_string());
        }
        Ok(self.render().await)
    }

    async fn done(&mut self) -> Result<String, String> {
        let store = Arc::clone(&self.store);
        match self.onboarding_form().await? {
            OnboardingForm::Client(_, form) => {
                form.submit(&store).await.map_err(|e| e.to_string())?;
            }
            OnboardingForm::Freelancer(_, wizard) => {
                if wizard.step() != WizardStep::EducationCerts {
                    return Err(format!(
                        "Step {} of {}: use 'next' to reach the last step.",
                        wizard.progress().0,
                        wizard.progress().1
                    ));
                }
                wizard.next(&store).await.map_err(|e| e.to_string())?;
            }
        }
        self.onboarding = None;
        Ok(self.render().await)
    }

    async fn edit(&mut self) -> Result<String, String> {
        self.require_authenticated().await?;
        let profile = self.store.profile().await.ok_or("Sign in first.")?;
        self.navigator.go_to(Page::Profile);
        self.editor.begin_edit(&profile);
        Ok(self.render().await)
    }

    async fn save(&mut self) -> Result<String, String> {
        if !self.editor.is_editing() {
            return Err("Not editing. Use 'edit' first.".to_string());
        }
        self.editor.save(&self.store).await;
        Ok(self.render().await)
    }

    // ── Rendering ───────────────────────────────────────────────────────

    async fn render(&mut self) -> String {
        let view = current_view(&self.store, self.navigator.current()).await;
        let mut out = match view {
            View::Loading => "Loading...".to_string(),
            View::Unauthenticated => {
                "Welcome to Freelance Hub.\nUse 'signup' to create an account or 'signin' to continue."
                    .to_string()
            }
            View::OnboardingFreelancer | View::OnboardingClient => match self.onboarding_form().await {
                Ok(OnboardingForm::Freelancer(_, wizard)) => render_wizard(wizard),
                Ok(OnboardingForm::Client(_, form)) => render_client(form),
                Err(e) => e,
            },
            View::Authenticated(page) => self.render_page(page).await,
        };
        if let Some(warning) = self.store.warning().await {
            out.push_str(&format!("\n! {warning}"));
        }
        out
    }

    async fn render_page(&self, page: Page) -> String {
        let Some(profile) = self.store.profile().await else {
            return String::new();
        };
        let mut out = format!("== {} ==\n{}", page.title(), page.description());
        if page == Page::Profile {
            match self.editor.form() {
                Some(form) => {
                    out.push_str(&format!(
                        "\nEditing (set <field> <value>, then 'save' or 'cancel'):\n  firstName: {}\n  lastName: {}\n  email: {}\n  phone: {}\n  country: {}\n  bio: {}",
                        form.first_name, form.last_name, form.email, form.phone, form.country, form.bio
                    ));
                }
                None => out.push_str(&render_profile(&profile)),
            }
        } else if page == Page::Dashboard {
            out.push_str(&format!("\nWelcome back, {}!", profile.first_name));
        }
        out
    }
}

/// Take the next whitespace-separated word off the front of `rest`.
fn next_word<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let text = rest.trim_start();
    if text.is_empty() {
        return None;
    }
    let (word, tail) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    *rest = tail;
    Some(word)
}

fn new_form(profile: &Profile, strict: bool) -> OnboardingForm {
    match profile.role {
        Role::Freelancer => {
            OnboardingForm::Freelancer(profile.id.clone(), FreelancerWizard::from_profile(profile, strict))
        }
        Role::Client => {
            OnboardingForm::Client(profile.id.clone(), ClientOnboarding::from_profile(profile, strict))
        }
    }
}

fn render_profile(profile: &Profile) -> String {
    let mut out = format!(
        "\n{} ({})\n  email: {}\n  country: {}",
        profile.display_name(),
        profile.role,
        profile.email,
        profile.country
    );
    if let Some(phone) = &profile.phone {
        out.push_str(&format!("\n  phone: {phone}"));
    }
    if let Some(bio) = &profile.bio {
        out.push_str(&format!("\n  bio: {bio}"));
    }
    out.push_str("\nUse 'edit' to change these.");
    out
}

fn render_wizard(wizard: &FreelancerWizard) -> String {
    let (n, of) = wizard.progress();
    let mut out = format!(
        "Freelancer onboarding: step {n} of {of} ({}%) {}\n",
        wizard.progress_percent(),
        wizard.step().title()
    );
    match wizard.form() {
        Some(StepForm::Basic(b)) => out.push_str(&format!(
            "  firstName: {}\n  lastName: {}\n  email: {}\n  phone: {}\n  country: {}\n  profilePhoto: {}",
            b.first_name, b.last_name, b.email, b.phone, b.country, b.profile_photo
        )),
        Some(StepForm::Professional(p)) => {
            out.push_str(&format!(
                "  occupations: {} (options: {})\n  customOccupation: {}\n",
                p.occupations.join(", "),
                catalog::OCCUPATIONS.join(", "),
                p.custom_occupation
            ));
            for (i, row) in p.experiences.iter().enumerate() {
                out.push_str(&format!(
                    "  experiences.{i}: {} {}-{}\n",
                    row.occupation, row.years_from, row.years_to
                ));
            }
            out.push_str(&format!(
                "  languages: {} (options: {})\n  customLanguage: {}\n  bio: {}",
                p.languages.join(", "),
                catalog::LANGUAGES.join(", "),
                p.custom_language,
                p.bio
            ));
        }
        Some(StepForm::SkillsPortfolio(s)) => {
            for (i, row) in s.skills.iter().enumerate() {
                out.push_str(&format!("  skills.{i}: {} ({:?})\n", row.name, row.level));
            }
            for (i, row) in s.projects.iter().enumerate() {
                out.push_str(&format!(
                    "  projects.{i}: {} | {} | {}\n",
                    row.title, row.description, row.links
                ));
            }
            out.push_str(&format!("  personalWebsite: {}", s.personal_website));
        }
        Some(StepForm::EducationCerts(e)) => {
            for (i, row) in e.education.iter().enumerate() {
                out.push_str(&format!(
                    "  education.{i}: {} {} {}\n",
                    row.college, row.degree, row.passout_year
                ));
            }
            for (i, row) in e.certifications.iter().enumerate() {
                out.push_str(&format!(
                    "  certifications.{i}: {} {} {}\n",
                    row.name, row.issued_by, row.year
                ));
            }
            out.push_str("Type 'done' to finish.");
        }
        None => out.push_str("Complete."),
    }
    out
}

fn render_client(form: &ClientOnboarding) -> String {
    format!(
        "Client onboarding\n  companyName: {}\n  industry: {} (options: {})\n  customIndustry: {}\n  preferredSkills: {} (options: {})\n  budgetRangeMin: {}\n  budgetRangeMax: {}\n  languages: {}\n  customLanguage: {}\n  bio: {}\nType 'done' to finish.",
        form.company_name,
        form.industry,
        catalog::INDUSTRIES.join(", "),
        form.custom_industry,
        form.preferred_skills.join(", "),
        catalog::SKILL_CATEGORIES.join(", "),
        form.budget_range_min,
        form.budget_range_max,
        form.languages.join(", "),
        form.custom_language,
        form.bio
    )
}

/// Log and swallow a shell I/O failure.
pub async fn run_shell(store: Arc<SessionStore>, strict_onboarding: bool) {
    if let Err(e) = Shell::new(store, strict_onboarding).run().await {
        error!("Error reading stdin: {e}");
    }
}
