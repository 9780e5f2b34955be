//! In-app navigation: which page is showing and what the menu offers.
//!
//! Navigation is UI state, kept apart from the session model.

use serde::{Deserialize, Serialize};

use crate::session::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Dashboard,
    Explore,
    Profile,
    Gigs,
    Orders,
    Earnings,
    Connections,
    Billing,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Dashboard,
        Page::Explore,
        Page::Profile,
        Page::Gigs,
        Page::Orders,
        Page::Earnings,
        Page::Connections,
        Page::Billing,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Explore => "explore",
            Self::Profile => "profile",
            Self::Gigs => "gigs",
            Self::Orders => "orders",
            Self::Earnings => "earnings",
            Self::Connections => "connections",
            Self::Billing => "billing",
        }
    }

    /// Resolve a page id. Anything unknown is the dashboard.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .unwrap_or_default()
    }

    /// Heading shown on the page itself.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Explore => "Explore",
            Self::Profile => "Profile",
            Self::Gigs => "My Gigs",
            Self::Orders => "Orders",
            Self::Earnings => "Earnings",
            Self::Connections => "My Connections",
            Self::Billing => "Billing & Payments",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dashboard => "Your activity at a glance",
            Self::Explore => "Browse the marketplace",
            Self::Profile => "Your public profile",
            Self::Gigs => "Manage your service offerings here",
            Self::Orders => "View and manage your orders",
            Self::Earnings => "Track your earnings and payouts",
            Self::Connections => "Manage your professional network",
            Self::Billing => "Manage your payment methods and transaction history",
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One entry of the role menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: Page,
    pub label: &'static str,
}

const FREELANCER_MENU: &[MenuItem] = &[
    MenuItem { id: Page::Gigs, label: "My Gigs" },
    MenuItem { id: Page::Orders, label: "Orders" },
    MenuItem { id: Page::Earnings, label: "Earnings" },
    MenuItem { id: Page::Explore, label: "Explore" },
    MenuItem { id: Page::Billing, label: "Billing" },
    MenuItem { id: Page::Profile, label: "Profile" },
];

const CLIENT_MENU: &[MenuItem] = &[
    MenuItem { id: Page::Explore, label: "Explore Freelancers" },
    MenuItem { id: Page::Connections, label: "My Connections" },
    MenuItem { id: Page::Orders, label: "My Orders" },
    MenuItem { id: Page::Billing, label: "Billing" },
    MenuItem { id: Page::Profile, label: "Profile" },
];

pub fn menu_items(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Freelancer => FREELANCER_MENU,
        Role::Client => CLIENT_MENU,
    }
}

/// Current page for a signed-in user.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Page,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// Navigate by id; unknown ids land on the dashboard.
    pub fn go(&mut self, id: &str) -> Page {
        self.current = Page::from_id(id);
        self.current
    }

    pub fn go_to(&mut self, page: Page) {
        self.current = page;
    }

    /// Back to the dashboard, as after sign-out.
    pub fn reset(&mut self) {
        self.current = Page::Dashboard;
    }
}
