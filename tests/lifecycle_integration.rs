//! Alert lifecycle integration tests
//!
//! End-to-end tests exercising `AlertManager` with the in-memory
//! repository and audit log. Covers creation, the status state machine,
//! filtered queries, the audit trail, validation, and concurrency.

use a3s_alert::{
    actions, validate_finding, Alert, AlertError, AlertFilter, AlertManager, AlertRepository,
    AlertStatus, AuditFilter, AuditLog, AuditRecord, Category, Finding, MemoryAlertRepository,
    Severity,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

/// Repository whose every `save` collides with an existing id
struct CollidingRepository;

#[async_trait]
impl AlertRepository for CollidingRepository {
    async fn save(&self, alert: Alert) -> a3s_alert::Result<Alert> {
        Err(AlertError::DuplicateKey(alert.id))
    }

    async fn find_by_id(&self, _id: &str) -> a3s_alert::Result<Option<Alert>> {
        Ok(None)
    }

    async fn find_all(&self, _filter: &AlertFilter) -> a3s_alert::Result<Vec<Alert>> {
        Ok(Vec::new())
    }

    async fn update_status(&self, id: &str, _status: AlertStatus) -> a3s_alert::Result<Alert> {
        Err(AlertError::NotFound(id.to_string()))
    }

    async fn delete(&self, _id: &str) -> a3s_alert::Result<bool> {
        Ok(false)
    }

    async fn count(&self) -> a3s_alert::Result<usize> {
        Ok(0)
    }

    fn name(&self) -> &str {
        "colliding"
    }
}

fn s3_finding() -> Finding {
    Finding::new("anomaly")
        .with_severity("High")
        .with_category("S3")
        .with_description("Suspicious S3 bucket access")
}

/// Create an alert and walk it to `target` along legal edges
async fn alert_in(manager: &AlertManager, target: AlertStatus) -> Alert {
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);
    let path: &[&str] = match target {
        AlertStatus::New => &[],
        AlertStatus::Acknowledged => &["Acknowledged"],
        AlertStatus::InProgress => &["Acknowledged", "In-Progress"],
        AlertStatus::Resolved => &["Acknowledged", "In-Progress", "Resolved"],
    };
    let id = alert.id.clone();
    let mut current = alert;
    for step in path {
        current = assert_ok!(manager.update_alert_status(&id, step).await);
    }
    assert_eq!(current.status, target);
    current
}

// ─── Creation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_from_explicit_finding() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);

    assert_eq!(alert.status, AlertStatus::New);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.category, Category::S3);
    assert_eq!(alert.description, "Suspicious S3 bucket access");

    let stored = assert_ok!(manager.get_alert(&alert.id).await);
    assert_eq!(stored, Some(alert));
}

#[tokio::test]
async fn test_create_yields_new_status_and_unique_ids() {
    let manager = AlertManager::in_memory();
    let mut ids = HashSet::new();

    for finding_type in ["anomaly", "rule-violation", "cve", "custom"].iter().cycle().take(40) {
        let alert = assert_ok!(manager.create_alert(Some(Finding::new(*finding_type))).await);
        assert_eq!(alert.status, AlertStatus::New);
        assert!(ids.insert(alert.id));
    }
    assert_eq!(assert_ok!(manager.repository().count().await), 40);
}

#[tokio::test]
async fn test_create_ignores_status_hints() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(
        manager
            .create_alert_json(serde_json::json!({
                "type": "cve",
                "status": "Resolved",
                "id": "caller-chosen"
            }))
            .await
    );
    assert_eq!(alert.status, AlertStatus::New);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.category, Category::Cve);
    assert_ne!(alert.id, "caller-chosen");
}

#[tokio::test]
async fn test_invalid_creates_leave_no_trace() {
    let manager = AlertManager::in_memory();

    let err = assert_err!(manager.create_alert(None).await);
    assert!(matches!(err, AlertError::InvalidInput(_)));
    let err = assert_err!(manager.create_alert(Some(Finding::default())).await);
    assert!(matches!(err, AlertError::InvalidInput(_)));
    let err = assert_err!(manager.create_alert_json(serde_json::Value::Null).await);
    assert!(matches!(err, AlertError::InvalidInput(_)));
    let err = assert_err!(manager.create_alert_json(serde_json::json!({})).await);
    assert!(matches!(err, AlertError::InvalidInput(_)));

    assert_eq!(assert_ok!(manager.repository().count().await), 0);
    assert!(manager.get_audit_logs(&AuditFilter::default()).await.is_empty());

    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);
    assert_eq!(alert.status, AlertStatus::New);
    assert_eq!(assert_ok!(manager.repository().count().await), 1);
}

#[tokio::test]
async fn test_duplicate_key_propagates_from_repository() {
    let manager = AlertManager::new(CollidingRepository, AuditLog::new());

    let err = assert_err!(manager.create_alert(Some(s3_finding())).await);
    assert!(matches!(err, AlertError::DuplicateKey(ref id) if !id.is_empty()));
    assert!(manager.audit_log().is_empty().await);
}

#[tokio::test]
async fn test_memory_repository_rejects_reused_id() {
    let repo = MemoryAlertRepository::new();
    let manager = AlertManager::new(repo.clone(), AuditLog::new());

    let alert = Alert::new(Severity::Low, Category::Network, "seeded").with_id("fixed");
    assert_ok!(repo.save(alert.clone()).await);
    let err = assert_err!(manager.repository().save(alert).await);
    assert!(matches!(err, AlertError::DuplicateKey(ref id) if id == "fixed"));
}

// ─── Lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn test_full_lifecycle_then_terminal() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);

    let acked = assert_ok!(manager.update_alert_status(&alert.id, "Acknowledged").await);
    assert_eq!(acked.status, AlertStatus::Acknowledged);
    let working = assert_ok!(manager.update_alert_status(&alert.id, "In-Progress").await);
    assert_eq!(working.status, AlertStatus::InProgress);
    let resolved = assert_ok!(manager.update_alert_status(&alert.id, "Resolved").await);
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert!(resolved.updated_at >= alert.updated_at);
    assert_eq!(resolved.created_at, alert.created_at);

    let err = assert_err!(manager.update_alert_status(&alert.id, "Acknowledged").await);
    assert!(matches!(err, AlertError::InvalidTransition { .. }));

    let stored = assert_ok!(manager.get_alert(&alert.id).await).unwrap();
    assert_eq!(stored.status, AlertStatus::Resolved);
}

#[tokio::test]
async fn test_skipping_acknowledge_is_rejected() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);

    let err = assert_err!(manager.update_alert_status(&alert.id, "In-Progress").await);
    match &err {
        AlertError::InvalidTransition { from, to } => {
            assert_eq!(from, "New");
            assert_eq!(to, "In-Progress");
        }
        other => panic!("expected InvalidTransition, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("New"));
    assert!(message.contains("In-Progress"));
}

#[tokio::test]
async fn test_new_can_resolve_directly() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);
    let resolved = assert_ok!(manager.update_alert_status(&alert.id, "Resolved").await);
    assert_eq!(resolved.status, AlertStatus::Resolved);
}

#[tokio::test]
async fn test_illegal_transitions_leave_status_unchanged() {
    let manager = AlertManager::in_memory();

    for from in AlertStatus::ALL {
        for to in AlertStatus::ALL {
            if from.can_transition_to(to) {
                continue;
            }
            let alert = alert_in(&manager, from).await;
            let before = assert_ok!(manager.get_alert(&alert.id).await).unwrap();

            let err = assert_err!(manager.update_alert_status(&alert.id, to.as_str()).await);
            assert!(
                matches!(err, AlertError::InvalidTransition { .. }),
                "{} -> {} should be InvalidTransition",
                from,
                to
            );

            let after = assert_ok!(manager.get_alert(&alert.id).await).unwrap();
            assert_eq!(after, before);
        }
    }
}

#[tokio::test]
async fn test_update_unknown_alert() {
    let manager = AlertManager::in_memory();
    let err = assert_err!(manager.update_alert_status("no-such-alert", "Resolved").await);
    assert!(matches!(err, AlertError::NotFound(ref id) if id == "no-such-alert"));
}

#[tokio::test]
async fn test_repository_bypass_skips_transition_rules() {
    let repo = MemoryAlertRepository::new();
    let manager = AlertManager::new(repo.clone(), AuditLog::new());
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);

    // Writing through the repository directly is inside the trust boundary
    let forced = assert_ok!(repo.update_status(&alert.id, AlertStatus::InProgress).await);
    assert_eq!(forced.status, AlertStatus::InProgress);

    let stored = assert_ok!(manager.get_alert(&alert.id).await).unwrap();
    assert_eq!(stored.status, AlertStatus::InProgress);
    assert!(manager
        .get_audit_logs(&AuditFilter::default().with_action(actions::UPDATE_ALERT_STATUS))
        .await
        .is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_apply_once() {
    let manager = Arc::new(AlertManager::in_memory());
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = Arc::clone(&manager);
        let id = alert.id.clone();
        handles.push(tokio::spawn(async move {
            manager.update_alert_status(&id, "Acknowledged").await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AlertError::InvalidTransition { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(succeeded, 1);

    let updates = manager
        .get_audit_logs(&AuditFilter::default().with_action(actions::UPDATE_ALERT_STATUS))
        .await;
    assert_eq!(updates.len(), 1);
}

// ─── Queries ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_filter_by_severity() {
    let manager = AlertManager::in_memory();
    let mut high_id = String::new();
    for severity in ["High", "Medium", "Low"] {
        let alert = assert_ok!(
            manager
                .create_alert(Some(Finding::new("custom").with_severity(severity)))
                .await
        );
        if severity == "High" {
            high_id = alert.id;
        }
    }

    let high = assert_ok!(
        manager
            .get_alerts(&AlertFilter::default().with_severity(Severity::High))
            .await
    );
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].id, high_id);
    assert_eq!(high[0].severity, Severity::High);
}

#[tokio::test]
async fn test_filter_by_status_and_category() {
    let manager = AlertManager::in_memory();
    let acked = alert_in(&manager, AlertStatus::Acknowledged).await;
    alert_in(&manager, AlertStatus::New).await;
    assert_ok!(
        manager
            .create_alert(Some(Finding::new("rule-violation")))
            .await
    );

    let filter = AlertFilter::default()
        .with_status(AlertStatus::Acknowledged)
        .with_category(Category::S3);
    let results = assert_ok!(manager.get_alerts(&filter).await);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, acked.id);

    let iam = assert_ok!(
        manager
            .get_alerts(&AlertFilter::default().with_category(Category::Iam))
            .await
    );
    assert_eq!(iam.len(), 1);

    let none = assert_ok!(
        manager
            .get_alerts(&AlertFilter::default().with_status(AlertStatus::Resolved))
            .await
    );
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_repeated_reads_are_identical() {
    let manager = AlertManager::in_memory();
    for _ in 0..10 {
        assert_ok!(manager.create_alert(Some(s3_finding())).await);
    }

    let first = assert_ok!(manager.get_alerts(&AlertFilter::default()).await);
    let second = assert_ok!(manager.get_alerts(&AlertFilter::default()).await);
    assert_eq!(first.len(), 10);
    assert_eq!(first, second);
    for pair in first.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn test_filter_deserializes_from_query_shape() {
    let manager = AlertManager::in_memory();
    alert_in(&manager, AlertStatus::InProgress).await;

    let filter: AlertFilter =
        serde_json::from_value(serde_json::json!({"status": "In-Progress", "severity": "High"}))
            .unwrap();
    assert_eq!(assert_ok!(manager.get_alerts(&filter).await).len(), 1);
}

// ─── Audit Trail ─────────────────────────────────────────────────

#[tokio::test]
async fn test_audit_trail_records_every_operation() {
    let manager = AlertManager::in_memory();
    let alert = assert_ok!(manager.create_alert(Some(s3_finding())).await);
    assert_ok!(manager.update_alert_status(&alert.id, "Acknowledged").await);
    assert_ok!(manager.get_alerts(&AlertFilter::default()).await);
    let _ = manager.update_alert_status(&alert.id, "New").await;

    let all = manager.get_audit_logs(&AuditFilter::default()).await;
    assert_eq!(all.len(), 3);
    for pair in all.windows(2) {
        assert!(pair[0].parsed_timestamp() >= pair[1].parsed_timestamp());
    }

    let trail = manager
        .get_audit_logs(&AuditFilter::default().with_alert_id(&alert.id))
        .await;
    let actions_seen: HashSet<&str> = trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions_seen,
        HashSet::from([actions::CREATE_ALERT, actions::UPDATE_ALERT_STATUS])
    );

    let queries = manager
        .get_audit_logs(&AuditFilter::default().with_action(actions::GET_ALERTS))
        .await;
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].field("count").unwrap(), 1);
}

#[tokio::test]
async fn test_audit_capacity_bounds_manager_log() {
    let config = a3s_alert::AlertConfig {
        max_logs: 5,
        ..Default::default()
    };
    let manager = AlertManager::with_config(MemoryAlertRepository::new(), config);

    for _ in 0..8 {
        assert_ok!(manager.create_alert(Some(s3_finding())).await);
    }
    assert_eq!(manager.audit_log().len().await, 5);
    assert_eq!(assert_ok!(manager.repository().count().await), 8);
}

#[tokio::test]
async fn test_audit_log_eviction_is_fifo() {
    let log = AuditLog::new();
    for i in 0..1001 {
        log.log(AuditRecord::new("TEST_ACTION").with_field("index", i))
            .await;
    }

    assert_eq!(log.len().await, 1000);
    let indices: HashSet<i64> = log
        .get_logs(&AuditFilter::default())
        .await
        .iter()
        .map(|e| e.field("index").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert!(!indices.contains(&0));
    assert!(indices.contains(&1));
    assert!(indices.contains(&1000));
}

// ─── Validation ──────────────────────────────────────────────────

#[test]
fn test_validation_reports_all_errors_in_order() {
    let finding: Finding = serde_json::from_value(serde_json::json!({
        "severity": "Invalid",
        "category": "Invalid"
    }))
    .unwrap();

    let result = validate_finding(Some(&finding));
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors[0].contains("type"));
    assert!(result.errors[1].contains("severity"));
    assert!(result.errors[2].contains("category"));
}

#[test]
fn test_validation_result_serialization() {
    let result = validate_finding(None);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["isValid"], false);
    assert_eq!(json["errors"][0], "Finding type is required");
}
