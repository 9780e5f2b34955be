//! Fixed option lists offered by the onboarding forms.

/// Selecting this occupation reveals a free-text field.
pub const CUSTOM_OCCUPATION: &str = "Custom";
/// Selecting this language (or industry) reveals a free-text field.
pub const OTHER: &str = "Other";

pub const OCCUPATIONS: &[&str] = &[
    "Graphic Designer",
    "Web Developer",
    "Mobile App Developer",
    "Video Editor",
    "Content Writer",
    "Social Media Manager",
    "SEO Specialist",
    "Virtual Assistant",
    "Data Analyst",
    "UI/UX Designer",
    CUSTOM_OCCUPATION,
];

pub const LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Chinese",
    "Japanese",
    "Hindi",
    "Arabic",
    "Portuguese",
    "Russian",
    OTHER,
];

pub const INDUSTRIES: &[&str] = &[
    "Technology",
    "Healthcare",
    "Finance",
    "Education",
    "E-commerce",
    "Marketing",
    "Real Estate",
    "Manufacturing",
    "Entertainment",
    "Non-Profit",
    OTHER,
];

pub const SKILL_CATEGORIES: &[&str] = &[
    "Web Development",
    "Mobile Development",
    "Design (UI/UX)",
    "Content Writing",
    "Video Editing",
    "SEO & Marketing",
    "Data Analysis",
    "Virtual Assistance",
    "Translation",
    "Consulting",
];

/// Flip `option` in a multi-select: remove it if selected, append it if not.
pub fn toggle(selection: &mut Vec<String>, option: &str) {
    if let Some(pos) = selection.iter().position(|s| s == option) {
        selection.remove(pos);
    } else {
        selection.push(option.to_string());
    }
}

/// Replace the free-text placeholder (`Custom`/`Other`) with what the user
/// typed. A placeholder with nothing typed is dropped.
pub fn resolve_placeholder(selection: &[String], placeholder: &str, custom: &str) -> Vec<String> {
    let custom = custom.trim();
    selection
        .iter()
        .filter_map(|s| {
            if s == placeholder {
                (!custom.is_empty()).then(|| custom.to_string())
            } else {
                Some(s.clone())
            }
        })
        .collect()
}

/// Inverse of [`resolve_placeholder`] for pre-seeding a form from a saved
/// profile: known options stay selected, the first unknown value becomes the
/// custom text.
pub fn split_custom(values: &[String], catalog: &[&str], placeholder: &str) -> (Vec<String>, String) {
    let mut selected = Vec::new();
    let mut custom = String::new();
    for value in values {
        if catalog.contains(&value.as_str()) && value != placeholder {
            selected.push(value.clone());
        } else if custom.is_empty() {
            custom = value.clone();
            selected.push(placeholder.to_string());
        }
    }
    (selected, custom)
}
