//! # a3s-alert
//!
//! Security alert lifecycle tracking with an immutable, bounded audit trail.
//!
//! ## Overview
//!
//! `a3s-alert` turns raw security findings into tracked alerts, moves them
//! through a fixed status lifecycle, and records every create, update, and
//! query in an audit log. Storage sits behind the `AlertRepository` trait;
//! swap the in-memory backend for a durable one without changing callers.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_alert::{AlertManager, AuditFilter, Finding};
//!
//! # async fn example() -> a3s_alert::Result<()> {
//! let manager = AlertManager::in_memory();
//!
//! let alert = manager
//!     .create_alert(Some(
//!         Finding::new("anomaly")
//!             .with_severity("High")
//!             .with_category("S3")
//!             .with_description("Suspicious S3 bucket access"),
//!     ))
//!     .await?;
//!
//! manager.update_alert_status(&alert.id, "Acknowledged").await?;
//!
//! let trail = manager
//!     .get_audit_logs(&AuditFilter::default().with_alert_id(&alert.id))
//!     .await;
//! println!("{} audit entries", trail.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! `New → {Acknowledged, Resolved}`, `Acknowledged → {In-Progress, Resolved}`,
//! `In-Progress → {Resolved}`. `Resolved` is terminal.
//!
//! ## Architecture
//!
//! - **AlertRepository** trait — storage abstraction all backends implement
//! - **AuditLog** — append-only, capacity-bounded event record
//! - **AlertManager** — enforces the lifecycle and keeps both stores in step
//! - **validation** — pure shape checks for findings and status values

pub mod audit;
pub mod config;
pub mod error;
pub mod manager;
pub mod repository;
pub mod types;
pub mod validation;

// Re-export core types
pub use audit::{actions, AuditFilter, AuditLog, AuditLogEntry, AuditRecord, DEFAULT_MAX_LOGS};
pub use config::AlertConfig;
pub use error::{AlertError, Result};
pub use manager::AlertManager;
pub use repository::AlertRepository;
pub use types::{
    Alert, AlertCounts, AlertFilter, AlertStatus, Category, Finding, Metadata, Severity,
};
pub use validation::{validate_finding, validate_status, ValidationResult};

// Re-export the in-memory backend for convenience
pub use repository::memory::MemoryAlertRepository;
