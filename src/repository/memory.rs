//! In-memory alert repository
//!
//! Stores alerts in insertion order behind a `tokio::sync::RwLock`. Every
//! operation holds the lock for its full duration, so mutations against one
//! repository are serialized. Contents are lost on drop.

use crate::error::{AlertError, Result};
use crate::repository::AlertRepository;
use crate::types::{Alert, AlertFilter, AlertStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory repository for development, testing, and single-process use
#[derive(Clone, Default)]
pub struct MemoryAlertRepository {
    alerts: Arc<RwLock<Vec<Alert>>>,
}

impl MemoryAlertRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn save(&self, alert: Alert) -> Result<Alert> {
        if alert.id.is_empty() {
            return Err(AlertError::InvalidInput(
                "Invalid alert: missing id".to_string(),
            ));
        }

        let mut alerts = self.alerts.write().await;
        if alerts.iter().any(|a| a.id == alert.id) {
            return Err(AlertError::DuplicateKey(alert.id));
        }

        alerts.push(alert.clone());
        tracing::debug!(alert_id = %alert.id, total = alerts.len(), "Alert saved");
        Ok(alert)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_all(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;

        // Newest-inserted first, so the stable sort breaks created_at ties
        // the same way on every call.
        let mut results: Vec<Alert> = alerts
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(results)
    }

    async fn update_status(&self, id: &str, status: AlertStatus) -> Result<Alert> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AlertError::NotFound(id.to_string()))?;

        alert.status = status;
        alert.updated_at = Utc::now();

        tracing::debug!(alert_id = %id, status = %status, "Alert status stored");
        Ok(alert.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        Ok(alerts.len() < before)
    }

    async fn count(&self) -> Result<usize> {
        let alerts = self.alerts.read().await;
        Ok(alerts.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
