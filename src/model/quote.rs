use bson::oid::ObjectId;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string does not name a member of one of the quote enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVariant {
    pub field: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl fmt::Display for InvalidVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Allowed values: {}",
            self.field,
            self.value,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for InvalidVariant {}

// Closed string enums shared by the model, the DTOs and the query layer.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($value => Ok($name::$variant),)+
                    other => Err(InvalidVariant {
                        field: $field,
                        value: other.to_string(),
                        allowed: $name::VALUES,
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Kind of project the client wants built.
    ProjectType, "projectType" {
        WebApp => "web-app",
        MobileApp => "mobile-app",
        ECommerce => "e-commerce",
        Saas => "saas",
        ApiIntegration => "api-integration",
        UiUxDesign => "ui-ux-design",
        Other => "other",
    }
}

string_enum! {
    /// Budget bracket in USD.
    Budget, "budget" {
        Under5k => "under-5000",
        From5kTo15k => "5000-15000",
        From15kTo50k => "15000-50000",
        Over50k => "50000-plus",
    }
}

string_enum! {
    /// Desired delivery timeline, in months.
    Timeline, "timeline" {
        Asap => "asap",
        OneToTwo => "1-2",
        ThreeToSix => "3-6",
        Flexible => "flexible",
    }
}

string_enum! {
    /// Admin workflow status.
    QuoteStatus, "status" {
        Pending => "pending",
        Contacted => "contacted",
        InProgress => "in-progress",
        ProposalSent => "proposal-sent",
        Completed => "completed",
        Rejected => "rejected",
    }
}

string_enum! {
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Pending
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Current UTC time as a fixed-width RFC 3339 string.
///
/// Millisecond precision with a `Z` suffix keeps lexical order equal to
/// chronological order, which the `createdAt` sort relies on.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A client-submitted project quote request as stored in MongoDB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub project_type: ProjectType,
    pub budget: Budget,
    pub timeline: Timeline,
    #[serde(default)]
    pub features: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub status: QuoteStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated, normalized fields of a new submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuoteRequest {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub project_type: ProjectType,
    pub budget: Budget,
    pub timeline: Timeline,
    pub features: Vec<String>,
    pub description: String,
}

/// Admin-side partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteUpdate {
    pub status: Option<QuoteStatus>,
    pub priority: Option<Priority>,
    pub admin_notes: Option<String>,
    pub estimated_value: Option<f64>,
}

impl QuoteRequest {
    /// Builds a fresh record: status `pending`, priority `medium`, no lifecycle stamps.
    pub fn new(new: NewQuoteRequest, now: &str) -> Self {
        QuoteRequest {
            id: None,
            name: new.name,
            email: new.email,
            company: new.company,
            project_type: new.project_type,
            budget: new.budget,
            timeline: new.timeline,
            features: new.features,
            description: new.description,
            status: QuoteStatus::default(),
            priority: Priority::default(),
            admin_notes: None,
            estimated_value: None,
            contacted_at: None,
            completed_at: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Applies an admin update in place.
    ///
    /// `contactedAt` and `completedAt` are stamped only the first time the
    /// record enters the matching status and are never cleared afterwards.
    pub fn apply_update(&mut self, update: QuoteUpdate, now: &str) {
        if let Some(status) = update.status {
            match status {
                QuoteStatus::Contacted if self.contacted_at.is_none() => {
                    self.contacted_at = Some(now.to_string());
                }
                QuoteStatus::Completed if self.completed_at.is_none() => {
                    self.completed_at = Some(now.to_string());
                }
                _ => {}
            }
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(notes) = update.admin_notes {
            self.admin_notes = Some(notes);
        }
        if let Some(value) = update.estimated_value {
            self.estimated_value = Some(value);
        }
        self.updated_at = now.to_string();
    }
}
