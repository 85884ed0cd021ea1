use std::sync::Arc;

use super::common::*;
use crate::workflows::expiry::{AuditError, DirectoryError, ExpiryAuditService};

#[test]
fn alerts_only_the_application_at_the_alert_point() {
    let directory = FakeDirectory::with_applications(vec![
        application("obj-a", "App A", vec![credential("a-1", Some(expiring_in(30)))]),
        application("obj-b", "App B", vec![credential("b-1", Some(expiring_in(29)))]),
    ])
    .owner("obj-a", mail_owner("alice@example.com"))
    .owner("obj-b", mail_owner("bob@example.com"));
    let mailer = Arc::new(RecordingMailer::default());
    let service = ExpiryAuditService::new(Arc::new(directory), mailer.clone(), settings());

    let summary = service.run(now()).expect("audit completes");

    assert_eq!(summary.applications_scanned, 2);
    assert_eq!(summary.expiring_credentials, 2);
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.delivered, 1);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.ends_with("App A"));
    assert_eq!(
        sent[0].recipients,
        vec!["alice@example.com".to_string(), OPS_MAILBOX.to_string()]
    );
    assert_eq!(sent[0].sender, "noreply@example.com");
}

#[test]
fn ownerless_application_still_alerts_operations() {
    let directory = FakeDirectory::with_applications(vec![application(
        "obj-a",
        "App A",
        vec![credential("a-1", Some(expiring_in(30)))],
    )])
    .owner("obj-a", Ok(None));
    let mailer = Arc::new(RecordingMailer::default());
    let service = ExpiryAuditService::new(Arc::new(directory), mailer.clone(), settings());

    service.run(now()).expect("audit completes");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec![OPS_MAILBOX.to_string()]);
}

#[test]
fn nothing_at_alert_point_sends_nothing() {
    let directory = FakeDirectory::with_applications(vec![application(
        "obj-a",
        "App A",
        vec![credential("a-1", Some(expiring_in(12)))],
    )]);
    let mailer = Arc::new(RecordingMailer::default());
    let service = ExpiryAuditService::new(Arc::new(directory), mailer.clone(), settings());

    let summary = service.run(now()).expect("audit completes");

    assert_eq!(summary.batches, 0);
    assert_eq!(summary.expiring_credentials, 1);
    assert_eq!(mailer.attempts(), 0);
}

#[test]
fn delivery_failure_does_not_stop_other_batches() {
    let directory = FakeDirectory::with_applications(vec![
        application("obj-a", "App A", vec![credential("a-1", Some(expiring_in(30)))]),
        application("obj-b", "App B", vec![credential("b-1", Some(expiring_in(30)))]),
    ]);
    let mailer = Arc::new(RecordingMailer::failing_on("App A"));
    let service = ExpiryAuditService::new(Arc::new(directory), mailer.clone(), settings());

    let summary = service.run(now()).expect("delivery failures are not fatal");

    assert_eq!(mailer.attempts(), 2);
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.failed_deliveries, 1);
    assert!(mailer.sent()[0].subject.ends_with("App B"));
}

#[test]
fn dry_run_renders_without_sending() {
    let directory = FakeDirectory::with_applications(vec![application(
        "obj-a",
        "App A",
        vec![credential("a-1", Some(expiring_in(30)))],
    )]);
    let mailer = Arc::new(RecordingMailer::default());
    let mut settings = settings();
    settings.dry_run = true;
    let service = ExpiryAuditService::new(Arc::new(directory), mailer.clone(), settings);

    let summary = service.run(now()).expect("audit completes");

    assert!(summary.dry_run);
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.delivered, 0);
    assert_eq!(mailer.attempts(), 0);
}

#[test]
fn auth_failure_aborts_before_listing() {
    let directory = FakeDirectory {
        auth_failure: Some("invalid_client".to_string()),
        ..FakeDirectory::default()
    };
    let directory = Arc::new(directory);
    let mailer = Arc::new(RecordingMailer::default());
    let service = ExpiryAuditService::new(directory.clone(), mailer.clone(), settings());

    match service.run(now()) {
        Err(AuditError::Directory(DirectoryError::Auth(reason))) => {
            assert_eq!(reason, "invalid_client")
        }
        other => panic!("expected auth failure, got {other:?}"),
    }
    assert_eq!(directory.listings(), 0);
    assert!(directory.lookups().is_empty());
    assert_eq!(mailer.attempts(), 0);
}

#[test]
fn listing_failure_is_fatal() {
    let directory = FakeDirectory {
        listing_failure: Some("500: boom".to_string()),
        ..FakeDirectory::default()
    };
    let directory = Arc::new(directory);
    let service = ExpiryAuditService::new(
        directory.clone(),
        Arc::new(RecordingMailer::default()),
        settings(),
    );

    assert!(matches!(
        service.scan(now()),
        Err(AuditError::Directory(DirectoryError::Transport(_)))
    ));
    assert!(directory.lookups().is_empty());
}
