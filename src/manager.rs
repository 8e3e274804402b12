//! Alert manager — lifecycle orchestration over a repository and audit log
//!
//! `AlertManager` is the only component that changes alert state. Each
//! mutation is persisted through the `AlertRepository` and then recorded in
//! the `AuditLog` within the same call. There is no cross-store transaction:
//! the audit trail is best-effort observability, not a commit log.

use crate::audit::{actions, AuditFilter, AuditLog, AuditLogEntry, AuditRecord};
use crate::config::AlertConfig;
use crate::error::{AlertError, Result};
use crate::repository::memory::MemoryAlertRepository;
use crate::repository::AlertRepository;
use crate::types::{Alert, AlertCounts, AlertFilter, AlertStatus, Category, Finding, Severity};
use tokio::sync::Mutex;

/// Orchestrates alert creation, status transitions, and queries
///
/// Construct one explicitly and share it (e.g. behind an `Arc`) with the
/// transport layer; there is no global instance.
pub struct AlertManager {
    repository: Box<dyn AlertRepository>,
    audit: AuditLog,
    config: AlertConfig,

    /// Serializes the read-check-write of status updates
    transitions: Mutex<()>,
}

impl AlertManager {
    /// Create a manager over the given repository and audit log
    pub fn new(repository: impl AlertRepository + 'static, audit: AuditLog) -> Self {
        let config = AlertConfig {
            max_logs: audit.max_logs(),
            ..AlertConfig::default()
        };
        Self {
            repository: Box::new(repository),
            audit,
            config,
            transitions: Mutex::new(()),
        }
    }

    /// Create a manager whose audit log and defaults come from `config`
    pub fn with_config(repository: impl AlertRepository + 'static, config: AlertConfig) -> Self {
        Self {
            repository: Box::new(repository),
            audit: AuditLog::from_config(&config),
            config,
            transitions: Mutex::new(()),
        }
    }

    /// Create a manager backed entirely by in-memory stores
    pub fn in_memory() -> Self {
        Self::with_config(MemoryAlertRepository::new(), AlertConfig::default())
    }

    /// Create an alert from a finding
    ///
    /// Explicit, valid severity and category win; otherwise both are derived
    /// from the finding type. The new alert always starts in `New`.
    pub async fn create_alert(&self, finding: Option<Finding>) -> Result<Alert> {
        let finding = match finding {
            Some(f) if f.kind().is_some() => f,
            _ => {
                return Err(AlertError::InvalidInput(
                    "Invalid finding: missing required fields".to_string(),
                ))
            }
        };

        let severity = determine_severity(&finding);
        let category = determine_category(&finding);
        let description = finding
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.config.default_description.clone());

        let alert = Alert::new(severity, category, description)
            .with_metadata(finding.metadata.unwrap_or_default());
        let saved = self.repository.save(alert).await?;

        self.audit
            .log(
                AuditRecord::new(actions::CREATE_ALERT)
                    .with_alert_id(&saved.id)
                    .with_field("severity", saved.severity.as_str())
                    .with_field("category", saved.category.as_str()),
            )
            .await;

        tracing::info!(
            alert_id = %saved.id,
            severity = %saved.severity,
            category = %saved.category,
            "Alert created"
        );

        Ok(saved)
    }

    /// Create an alert from a raw JSON finding
    ///
    /// `null` is treated as an absent finding; any other non-object value is
    /// rejected as invalid input.
    pub async fn create_alert_json(&self, value: serde_json::Value) -> Result<Alert> {
        let finding = match value {
            serde_json::Value::Null => None,
            serde_json::Value::Object(_) => Some(
                serde_json::from_value::<Finding>(value)
                    .map_err(|e| AlertError::InvalidInput(format!("Invalid finding: {}", e)))?,
            ),
            _ => {
                return Err(AlertError::InvalidInput(
                    "Invalid finding: expected a JSON object".to_string(),
                ))
            }
        };
        self.create_alert(finding).await
    }

    /// Move an alert to `new_status` along a lifecycle edge
    ///
    /// Fails with `InvalidInput` for an unknown status, `NotFound` for an
    /// unknown id, and `InvalidTransition` when the edge does not exist
    /// (including same-status updates). A failed update leaves the alert
    /// untouched.
    pub async fn update_alert_status(&self, id: &str, new_status: &str) -> Result<Alert> {
        let status: AlertStatus = new_status
            .parse()
            .map_err(|_| AlertError::InvalidInput(format!("Invalid status: {}", new_status)))?;

        let _guard = self.transitions.lock().await;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AlertError::NotFound(id.to_string()))?;

        if !current.status.can_transition_to(status) {
            tracing::warn!(
                alert_id = %id,
                from = %current.status,
                to = %status,
                "Rejected status transition"
            );
            return Err(AlertError::InvalidTransition {
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        let updated = self.repository.update_status(id, status).await?;

        self.audit
            .log(
                AuditRecord::new(actions::UPDATE_ALERT_STATUS)
                    .with_alert_id(id)
                    .with_field("oldStatus", current.status.as_str())
                    .with_field("newStatus", status.as_str()),
            )
            .await;

        tracing::info!(
            alert_id = %id,
            from = %current.status,
            to = %status,
            "Alert status changed"
        );

        Ok(updated)
    }

    /// List alerts matching the filter, newest first
    ///
    /// Never fails on an empty result. Every call is audited with the filter
    /// used and the number of alerts returned.
    pub async fn get_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let alerts = self.repository.find_all(filter).await?;

        self.audit
            .log(
                AuditRecord::new(actions::GET_ALERTS)
                    .with_field("filter", serde_json::to_value(filter)?)
                    .with_field("count", alerts.len()),
            )
            .await;

        tracing::debug!(count = alerts.len(), filter = ?filter, "Alerts queried");
        Ok(alerts)
    }

    /// Look up a single alert (read-only, not audited)
    pub async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        self.repository.find_by_id(id).await
    }

    /// Audit entries matching the filter, newest first
    pub async fn get_audit_logs(&self, filter: &AuditFilter) -> Vec<AuditLogEntry> {
        self.audit.get_logs(filter).await
    }

    /// Alert counts by status, severity, and category
    pub async fn counts(&self) -> Result<AlertCounts> {
        let alerts = self.repository.find_all(&AlertFilter::default()).await?;
        let mut counts = AlertCounts::default();
        for alert in &alerts {
            counts.record(alert);
        }
        Ok(counts)
    }

    /// Get a reference to the underlying repository
    pub fn repository(&self) -> &dyn AlertRepository {
        self.repository.as_ref()
    }

    /// Get a reference to the audit log
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}

fn determine_severity(finding: &Finding) -> Severity {
    finding
        .severity
        .as_deref()
        .and_then(|s| s.parse().ok())
        .or_else(|| finding.kind().and_then(Severity::for_finding_type))
        .unwrap_or(Severity::Medium)
}

fn determine_category(finding: &Finding) -> Category {
    finding
        .category
        .as_deref()
        .and_then(|c| c.parse().ok())
        .or_else(|| finding.kind().and_then(Category::for_finding_type))
        .unwrap_or(Category::Activity)
}
