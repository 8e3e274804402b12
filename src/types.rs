//! Core alert types for the a3s-alert system
//!
//! All types use camelCase JSON serialization for wire compatibility.
//! Vocabulary values (severity, category, status) serialize to their exact,
//! case-sensitive wire strings.

use crate::error::AlertError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Opaque, string-keyed metadata bag carried by alerts
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Every severity, in vocabulary order
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Wire string for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Severity implied by a finding type, if the type is a known one
    pub fn for_finding_type(finding_type: &str) -> Option<Self> {
        match finding_type {
            "anomaly" => Some(Severity::High),
            "rule-violation" => Some(Severity::Medium),
            "cve" => Some(Severity::High),
            _ => None,
        }
    }
}

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "IAM")]
    Iam,
    S3,
    Network,
    Activity,
    #[serde(rename = "CVE")]
    Cve,
}

impl Category {
    /// Every category, in vocabulary order
    pub const ALL: [Category; 5] = [
        Category::Iam,
        Category::S3,
        Category::Network,
        Category::Activity,
        Category::Cve,
    ];

    /// Wire string for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Iam => "IAM",
            Category::S3 => "S3",
            Category::Network => "Network",
            Category::Activity => "Activity",
            Category::Cve => "CVE",
        }
    }

    /// Category implied by a finding type, if the type is a known one
    pub fn for_finding_type(finding_type: &str) -> Option<Self> {
        match finding_type {
            "anomaly" => Some(Category::Activity),
            "rule-violation" => Some(Category::Iam),
            "cve" => Some(Category::Cve),
            _ => None,
        }
    }
}

/// Alert lifecycle status
///
/// ```text
/// New ──► Acknowledged ──► In-Progress ──► Resolved
///  │            │                              ▲
///  └────────────┴──────────────────────────────┘
/// ```
///
/// `Resolved` is terminal. There are no self-loops and no back-edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertStatus {
    #[default]
    New,
    Acknowledged,
    #[serde(rename = "In-Progress")]
    InProgress,
    Resolved,
}

impl AlertStatus {
    /// Every status, in vocabulary order
    pub const ALL: [AlertStatus; 4] = [
        AlertStatus::New,
        AlertStatus::Acknowledged,
        AlertStatus::InProgress,
        AlertStatus::Resolved,
    ];

    /// Wire string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "New",
            AlertStatus::Acknowledged => "Acknowledged",
            AlertStatus::InProgress => "In-Progress",
            AlertStatus::Resolved => "Resolved",
        }
    }

    /// Statuses directly reachable from this one
    pub fn allowed_transitions(&self) -> &'static [AlertStatus] {
        match self {
            AlertStatus::New => &[AlertStatus::Acknowledged, AlertStatus::Resolved],
            AlertStatus::Acknowledged => &[AlertStatus::InProgress, AlertStatus::Resolved],
            AlertStatus::InProgress => &[AlertStatus::Resolved],
            AlertStatus::Resolved => &[],
        }
    }

    /// Whether `next` is an edge out of this status
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Whether this status has no outgoing edges
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

macro_rules! vocabulary_str {
    ($ty:ty, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AlertError;

            /// Exact, case-sensitive match against the wire strings
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| AlertError::InvalidInput(format!("Invalid {}: {}", $label, s)))
            }
        }
    };
}

vocabulary_str!(Severity, "severity");
vocabulary_str!(Category, "category");
vocabulary_str!(AlertStatus, "status");

/// A tracked security alert
///
/// Serializes to exactly eight fields:
/// `id, severity, category, status, description, metadata, createdAt, updatedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique alert identifier
    pub id: String,

    pub severity: Severity,

    pub category: Category,

    pub status: AlertStatus,

    /// Human-readable description
    pub description: String,

    /// Opaque metadata, stored and returned as-is
    #[serde(default)]
    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every status mutation
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert with a generated id, status `New`, and empty metadata
    pub fn new(severity: Severity, category: Category, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            severity,
            category,
            status: AlertStatus::New,
            description: description.into(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Use a caller-supplied id instead of the generated one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the metadata bag
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Raw external input describing a detected security condition
///
/// Vocabulary fields are kept as raw strings so that unknown values can be
/// reported by validation instead of failing deserialization. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Finding type (e.g. "anomaly", "rule-violation", "cve")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub finding_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Finding {
    /// Create a finding of the given type
    pub fn new(finding_type: impl Into<String>) -> Self {
        Self {
            finding_type: Some(finding_type.into()),
            ..Default::default()
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value);
        self
    }

    /// The finding type, treating an empty string as absent
    pub fn kind(&self) -> Option<&str> {
        self.finding_type.as_deref().filter(|t| !t.is_empty())
    }
}

/// Equality filter over alerts
///
/// Every field is optional. An omitted field imposes no constraint (it does
/// not mean "match empty"); present fields combine with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl AlertFilter {
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether the alert satisfies every constraint present in the filter
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && self.status.map_or(true, |s| alert.status == s)
            && self.category.map_or(true, |c| alert.category == c)
    }
}

/// Alert counts grouped by status, severity, and category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    /// Counts per status
    pub by_status: HashMap<String, u64>,

    /// Counts per severity
    pub by_severity: HashMap<String, u64>,

    /// Counts per category
    pub by_category: HashMap<String, u64>,

    /// Total alert count
    pub total: u64,
}

impl AlertCounts {
    /// Tally one alert
    pub fn record(&mut self, alert: &Alert) {
        *self.by_status.entry(alert.status.to_string()).or_insert(0) += 1;
        *self.by_severity.entry(alert.severity.to_string()).or_insert(0) += 1;
        *self.by_category.entry(alert.category.to_string()).or_insert(0) += 1;
        self.total += 1;
    }
}
