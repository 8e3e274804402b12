//! Audit log — bounded, append-only record of actions taken on alerts
//!
//! Every entry is immutable once appended. The log keeps at most
//! `max_logs` entries; each insertion past capacity evicts the single oldest
//! entry under the same lock as the insert, so no reader ever observes an
//! over-capacity log.

use crate::config::AlertConfig;
use crate::types::Metadata;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Default audit log capacity
pub const DEFAULT_MAX_LOGS: usize = 1000;

/// Action tags written by `AlertManager`
pub mod actions {
    /// An alert was created from a finding
    pub const CREATE_ALERT: &str = "CREATE_ALERT";
    /// An alert moved along a lifecycle edge
    pub const UPDATE_ALERT_STATUS: &str = "UPDATE_ALERT_STATUS";
    /// Alerts were listed
    pub const GET_ALERTS: &str = "GET_ALERTS";
}

/// Keys owned by the entry itself; never taken from free-form fields
const RESERVED_KEYS: [&str; 4] = ["id", "action", "alertId", "timestamp"];

/// A partial audit record, finalized by `AuditLog::log`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Event kind; stored as-is, even when empty
    #[serde(default)]
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,

    /// Honored verbatim when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Free-form fields carried through from the triggering call
    #[serde(flatten)]
    pub fields: Metadata,
}

impl AuditRecord {
    /// Create a record for the given action
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_alert_id(mut self, alert_id: impl Into<String>) -> Self {
        self.alert_id = Some(alert_id.into());
        self
    }

    /// Use an explicit timestamp instead of the time of logging
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Add a free-form field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A finalized, immutable audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Unique entry identifier (audit-<uuid>)
    pub id: String,

    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,

    #[serde(flatten)]
    pub fields: Metadata,

    /// ISO-8601 timestamp
    pub timestamp: String,
}

impl AuditLogEntry {
    /// Look up a free-form field
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// The timestamp as a time value, if it parses as ISO-8601
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339 with an offset, a local date-time without an offset,
/// and a bare date. Forms without an offset are read as UTC; a bare date
/// is midnight.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&t));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| Utc.from_utc_datetime(&t))
}

fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| {
        parse_timestamp(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", s)))
    })
    .transpose()
}

/// Filter over audit entries
///
/// Every field is optional; omission means no constraint. Present fields
/// combine with AND semantics. Date bounds are inclusive and compared as
/// time values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "deserialize_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_alert_id(mut self, alert_id: impl Into<String>) -> Self {
        self.alert_id = Some(alert_id.into());
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    fn has_date_bounds(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Entries with an unparseable timestamp never satisfy a date bound
    fn matches(&self, entry: &AuditLogEntry, at: Option<DateTime<Utc>>) -> bool {
        if self.action.as_ref().is_some_and(|a| *a != entry.action) {
            return false;
        }
        if self
            .alert_id
            .as_ref()
            .is_some_and(|id| entry.alert_id.as_ref() != Some(id))
        {
            return false;
        }
        if !self.has_date_bounds() {
            return true;
        }
        let Some(at) = at else {
            return false;
        };
        self.start_date.map_or(true, |start| at >= start)
            && self.end_date.map_or(true, |end| at <= end)
    }
}

/// In-memory, capacity-bounded audit log
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditLogEntry>>,
    max_logs: usize,
}

impl AuditLog {
    /// Create a log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_LOGS)
    }

    /// Create a log holding at most `max_logs` entries (0 = unbounded)
    pub fn with_capacity(max_logs: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_logs,
        }
    }

    /// Create a log sized from configuration
    pub fn from_config(config: &AlertConfig) -> Self {
        Self::with_capacity(config.max_logs)
    }

    /// Maximum number of retained entries
    pub fn max_logs(&self) -> usize {
        self.max_logs
    }

    /// Finalize and append a record, evicting the oldest entry when full
    pub async fn log(&self, record: AuditRecord) -> AuditLogEntry {
        let AuditRecord {
            action,
            alert_id,
            timestamp,
            mut fields,
        } = record;
        fields.retain(|k, _| !RESERVED_KEYS.contains(&k.as_str()));

        let entry = AuditLogEntry {
            id: format!("audit-{}", uuid::Uuid::new_v4()),
            action,
            alert_id,
            fields,
            timestamp: timestamp.unwrap_or_else(now_iso),
        };

        {
            let mut entries = self.entries.write().await;
            entries.push_back(entry.clone());
            if self.max_logs > 0 {
                while entries.len() > self.max_logs {
                    entries.pop_front();
                }
            }
        }

        tracing::info!(
            audit_id = %entry.id,
            action = %entry.action,
            alert_id = entry.alert_id.as_deref().unwrap_or("-"),
            timestamp = %entry.timestamp,
            "Audit entry recorded"
        );

        entry
    }

    /// Entries matching the filter, newest first by timestamp
    ///
    /// Ties keep newest-inserted first. Entries whose timestamp does not
    /// parse sort after every dated entry.
    pub async fn get_logs(&self, filter: &AuditFilter) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().await;

        let mut results: Vec<(Option<DateTime<Utc>>, AuditLogEntry)> = entries
            .iter()
            .rev()
            .map(|e| (e.parsed_timestamp(), e))
            .filter(|(at, e)| filter.matches(e, *at))
            .map(|(at, e)| (at, e.clone()))
            .collect();

        results.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        results.into_iter().map(|(_, e)| e).collect()
    }

    /// Remove every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        tracing::debug!("Audit log cleared");
    }

    /// Current number of entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Current UTC time as ISO-8601 with millisecond precision
fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
