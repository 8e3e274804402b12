//! Alert repository trait — the storage abstraction for alerts
//!
//! All alert backends (in-memory, SQL, document stores, etc.) implement
//! `AlertRepository` to provide identity, lookup, filtered listing, and
//! status mutation with uniform semantics.

use crate::error::Result;
use crate::types::{Alert, AlertFilter, AlertStatus};
use async_trait::async_trait;

pub mod memory;

/// Core trait for alert storage backends
///
/// The repository is transition-agnostic: `update_status` applies any
/// status value without consulting the transition table. Lifecycle rules
/// are enforced by `AlertManager`, so code holding a repository directly
/// sits inside that trust boundary.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Insert a new alert
    ///
    /// Fails with `DuplicateKey` if the id is already stored and with
    /// `InvalidInput` if the id is empty.
    async fn save(&self, alert: Alert) -> Result<Alert>;

    /// Look up an alert by id; absence is `Ok(None)`
    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>>;

    /// List alerts matching the filter, newest first by `created_at`
    async fn find_all(&self, filter: &AlertFilter) -> Result<Vec<Alert>>;

    /// Set the status and refresh `updated_at`; `NotFound` if absent
    async fn update_status(&self, id: &str, status: AlertStatus) -> Result<Alert>;

    /// Remove an alert, returning whether one was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Number of stored alerts
    async fn count(&self) -> Result<usize>;

    /// Backend name (e.g., "memory", "postgres")
    fn name(&self) -> &str;
}
