//! Views: routing, navigation and the profile page.

pub mod navigation;
pub mod profile_editor;
pub mod router;

pub use navigation::{MenuItem, Navigator, Page, menu_items};
pub use profile_editor::{ProfileEditor, ProfileForm};
pub use router::{View, current_view, route};
