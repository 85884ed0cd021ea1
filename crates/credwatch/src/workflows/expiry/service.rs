use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::classifier::classify;
use super::directory::{DirectoryClient, DirectoryError};
use super::domain::{AccessToken, ExpirationRecord};
use super::grouper::group;
use super::mailer::{Mailer, OutboundMessage};
use super::notification::{format_notification, recipients, NotificationTemplate};

/// Run parameters supplied by the caller; the service does not read configuration.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub window_days: i64,
    pub alert_days: i64,
    pub operations_mailbox: String,
    pub sender: String,
    pub template: NotificationTemplate,
    pub dry_run: bool,
}

/// Result of the directory scan before any grouping.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub applications_scanned: usize,
    pub records: Vec<ExpirationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub applications_scanned: usize,
    pub expiring_credentials: usize,
    pub batches: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub dry_run: bool,
}

/// Service composing the directory scan, alert grouping, and mail delivery.
pub struct ExpiryAuditService<D, M> {
    directory: Arc<D>,
    mailer: Arc<M>,
    settings: AuditSettings,
}

impl<D, M> ExpiryAuditService<D, M>
where
    D: DirectoryClient,
    M: Mailer,
{
    pub fn new(directory: Arc<D>, mailer: Arc<M>, settings: AuditSettings) -> Self {
        Self {
            directory,
            mailer,
            settings,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Fetch every application and classify its credentials against the window.
    pub fn scan(&self, now: DateTime<Utc>) -> Result<ScanOutcome, AuditError> {
        self.collect(now).map(|(_, outcome)| outcome)
    }

    /// Full audit: scan, batch at the alert point, and deliver one message per
    /// batch. Delivery failures are logged and counted; the remaining batches
    /// are still attempted.
    pub fn run(&self, now: DateTime<Utc>) -> Result<AuditSummary, AuditError> {
        let (token, outcome) = self.collect(now)?;
        let batches = group(&outcome.records, self.settings.alert_days);

        let mut summary = AuditSummary {
            applications_scanned: outcome.applications_scanned,
            expiring_credentials: outcome.records.len(),
            batches: batches.len(),
            dry_run: self.settings.dry_run,
            ..AuditSummary::default()
        };

        if batches.is_empty() {
            info!(
                alert_days = self.settings.alert_days,
                "no keys expiring exactly at the alert point; no email sent"
            );
            return Ok(summary);
        }

        for batch in &batches {
            let rendered = format_notification(batch, &self.settings.template);
            let message = OutboundMessage {
                recipients: recipients(batch, &self.settings.operations_mailbox),
                subject: rendered.subject,
                html_body: rendered.html_body,
                sender: self.settings.sender.clone(),
            };

            if self.settings.dry_run {
                info!(
                    application = %batch.application_name,
                    recipients = %message.recipients.join(", "),
                    subject = %message.subject,
                    "dry run: notification not sent"
                );
                continue;
            }

            match self.mailer.send(&token, &message) {
                Ok(()) => {
                    summary.delivered += 1;
                    info!(
                        application = %batch.application_name,
                        recipients = %message.recipients.join(", "),
                        "notification sent"
                    );
                }
                Err(err) => {
                    summary.failed_deliveries += 1;
                    warn!(
                        application = %batch.application_name,
                        error = %err,
                        "notification delivery failed"
                    );
                }
            }
        }

        info!(?summary, "credential expiry audit finished");
        Ok(summary)
    }

    fn collect(&self, now: DateTime<Utc>) -> Result<(AccessToken, ScanOutcome), AuditError> {
        let token = self.directory.acquire_token()?;
        info!("access token obtained");

        let applications = self.directory.list_applications(&token)?;
        info!(count = applications.len(), "applications retrieved");

        let records = classify(
            self.directory.as_ref(),
            &token,
            &applications,
            now,
            self.settings.window_days,
        );
        info!(
            count = records.len(),
            window_days = self.settings.window_days,
            "credentials expiring within window"
        );

        Ok((
            token,
            ScanOutcome {
                applications_scanned: applications.len(),
                records,
            },
        ))
    }
}

/// Error raised by the audit service. Only fatal conditions reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
