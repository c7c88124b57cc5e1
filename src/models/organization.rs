//! Organization (tenant) model and onboarding checklist.
//!
//! The organization is the tenant boundary: every client, package, session,
//! payment and commission profile belongs to exactly one organization, and
//! every query is filtered by the caller's `organization_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserResponse;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public signup request: creates an organization and its owner.
///
/// ```json
/// {
///   "name": "Iron Temple Fitness",
///   "owner_email": "jo@irontemple.example",
///   "owner_name": "Jo Park"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,

    /// Derived from `name` when omitted
    pub slug: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    pub owner_email: String,
    pub owner_name: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Signup response. The owner's API key is only shown here.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub organization: Organization,
    pub owner: UserResponse,
    pub api_key: String,
}

/// Turn a display name into a URL slug.
///
/// Lowercase ASCII alphanumerics are kept, every other run of characters
/// becomes a single `-`, and leading/trailing dashes are dropped.
pub fn slugify(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    (!slug.is_empty()).then_some(slug)
}

/// Slug to try on the given attempt (1-based): the base first, then
/// `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Raw counts the onboarding checklist is derived from.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct OnboardingCounts {
    pub trainers: i64,
    pub clients: i64,
    pub packages: i64,
    pub commission_profiles: i64,
    pub trainers_with_profile: i64,
    pub sessions: i64,
    pub payments: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OnboardingStep {
    pub key: &'static str,
    pub label: &'static str,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingChecklist {
    pub steps: Vec<OnboardingStep>,
    pub completed: usize,
    pub total: usize,
    pub percent_complete: u8,
}

impl OnboardingChecklist {
    pub fn from_counts(counts: &OnboardingCounts) -> Self {
        let step = |key: &'static str, label: &'static str, done: bool| OnboardingStep {
            key,
            label,
            done,
        };
        let steps = vec![
            step("add_trainer", "Add a trainer", counts.trainers > 0),
            step("add_client", "Add a client", counts.clients > 0),
            step("sell_package", "Sell a session package", counts.packages > 0),
            step(
                "create_commission_profile",
                "Create a commission profile",
                counts.commission_profiles > 0,
            ),
            step(
                "assign_commission_profile",
                "Assign a commission profile to a trainer",
                counts.trainers_with_profile > 0,
            ),
            step("log_session", "Log the first session", counts.sessions > 0),
            step("record_payment", "Record the first payment", counts.payments > 0),
        ];

        let completed = steps.iter().filter(|s| s.done).count();
        let total = steps.len();
        let percent_complete = (completed * 100 / total) as u8;

        Self {
            steps,
            completed,
            total,
            percent_complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_names() {
        assert_eq!(
            slugify("Iron Temple Fitness").as_deref(),
            Some("iron-temple-fitness")
        );
        assert_eq!(slugify("  PT & Co. -- Downtown!! ").as_deref(), Some("pt-co-downtown"));
        assert_eq!(slugify("Studio 54").as_deref(), Some("studio-54"));
        assert_eq!(slugify("¡¿!?"), None);
        assert_eq!(slugify(""), None);
    }

    #[test]
    fn numbers_slug_candidates_from_two() {
        let tried: Vec<String> = (1..=3).map(|n| slug_candidate("iron-temple", n)).collect();
        assert_eq!(tried, ["iron-temple", "iron-temple-2", "iron-temple-3"]);
        assert_eq!(slug_candidate("gym", 0), "gym");
    }

    #[test]
    fn empty_organization_has_nothing_done() {
        let checklist = OnboardingChecklist::from_counts(&OnboardingCounts::default());
        assert_eq!(checklist.completed, 0);
        assert_eq!(checklist.total, 7);
        assert_eq!(checklist.percent_complete, 0);
    }

    #[test]
    fn partial_progress_is_reported() {
        let counts = OnboardingCounts {
            trainers: 2,
            clients: 5,
            packages: 1,
            ..Default::default()
        };
        let checklist = OnboardingChecklist::from_counts(&counts);
        assert_eq!(checklist.completed, 3);
        assert_eq!(checklist.percent_complete, 42);
        assert!(checklist.steps[0].done);
        assert!(!checklist.steps[3].done);
    }
}
