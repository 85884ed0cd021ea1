use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::expiry::directory::{DirectoryClient, DirectoryError, OwnerLookupError};
use crate::workflows::expiry::domain::{
    AccessToken, ApplicationRecord, CredentialEntry, CredentialKind, DirectoryIdentity,
};
use crate::workflows::expiry::mailer::{DeliveryError, Mailer, OutboundMessage};
use crate::workflows::expiry::notification::NotificationTemplate;
use crate::workflows::expiry::service::AuditSettings;

pub(super) const OPS_MAILBOX: &str = "opsbox@example.com";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

pub(super) fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub(super) fn expiring_in(days: i64) -> String {
    stamp(now() + Duration::days(days))
}

pub(super) fn credential(key_id: &str, expires_at: Option<String>) -> CredentialEntry {
    CredentialEntry {
        key_id: Some(key_id.to_string()),
        kind: CredentialKind::Certificate,
        expires_at,
    }
}

pub(super) fn application(
    object_id: &str,
    name: &str,
    credentials: Vec<CredentialEntry>,
) -> ApplicationRecord {
    ApplicationRecord {
        id: Some(object_id.to_string()),
        app_id: Some(format!("{object_id}-client")),
        display_name: Some(name.to_string()),
        identifier_uris: vec![format!("api://{object_id}")],
        credentials,
    }
}

pub(super) fn mail_owner(address: &str) -> Result<Option<DirectoryIdentity>, String> {
    Ok(Some(DirectoryIdentity {
        mail: Some(address.to_string()),
        display_name: None,
    }))
}

pub(super) fn settings() -> AuditSettings {
    AuditSettings {
        window_days: 30,
        alert_days: 30,
        operations_mailbox: OPS_MAILBOX.to_string(),
        sender: "noreply@example.com".to_string(),
        template: NotificationTemplate {
            ticket_url: "https://tickets.example.com/new".to_string(),
        },
        dry_run: false,
    }
}

#[derive(Default)]
pub(super) struct FakeDirectory {
    pub(super) applications: Vec<ApplicationRecord>,
    pub(super) owners: HashMap<String, Result<Option<DirectoryIdentity>, String>>,
    pub(super) auth_failure: Option<String>,
    pub(super) listing_failure: Option<String>,
    pub(super) owner_lookups: Mutex<Vec<String>>,
    pub(super) listing_calls: Mutex<usize>,
}

impl FakeDirectory {
    pub(super) fn with_applications(applications: Vec<ApplicationRecord>) -> Self {
        Self {
            applications,
            ..Self::default()
        }
    }

    pub(super) fn owner(
        mut self,
        object_id: &str,
        owner: Result<Option<DirectoryIdentity>, String>,
    ) -> Self {
        self.owners.insert(object_id.to_string(), owner);
        self
    }

    pub(super) fn lookups(&self) -> Vec<String> {
        self.owner_lookups.lock().expect("lookup mutex").clone()
    }

    pub(super) fn listings(&self) -> usize {
        *self.listing_calls.lock().expect("listing mutex")
    }
}

impl DirectoryClient for FakeDirectory {
    fn acquire_token(&self) -> Result<AccessToken, DirectoryError> {
        match &self.auth_failure {
            Some(reason) => Err(DirectoryError::Auth(reason.clone())),
            None => Ok(AccessToken::new("test-token")),
        }
    }

    fn list_applications(
        &self,
        _token: &AccessToken,
    ) -> Result<Vec<ApplicationRecord>, DirectoryError> {
        *self.listing_calls.lock().expect("listing mutex") += 1;
        match &self.listing_failure {
            Some(reason) => Err(DirectoryError::Transport(reason.clone())),
            None => Ok(self.applications.clone()),
        }
    }

    fn primary_owner(
        &self,
        _token: &AccessToken,
        application_id: &str,
    ) -> Result<Option<DirectoryIdentity>, OwnerLookupError> {
        self.owner_lookups
            .lock()
            .expect("lookup mutex")
            .push(application_id.to_string());

        match self.owners.get(application_id) {
            Some(Ok(identity)) => Ok(identity.clone()),
            Some(Err(reason)) => Err(OwnerLookupError {
                application_id: application_id.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub(super) struct RecordingMailer {
    pub(super) failing_subjects: Vec<String>,
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: Mutex<usize>,
}

impl RecordingMailer {
    pub(super) fn failing_on(subject_fragment: &str) -> Self {
        Self {
            failing_subjects: vec![subject_fragment.to_string()],
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("mail mutex").clone()
    }

    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempt mutex")
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, _token: &AccessToken, message: &OutboundMessage) -> Result<(), DeliveryError> {
        *self.attempts.lock().expect("attempt mutex") += 1;
        if self
            .failing_subjects
            .iter()
            .any(|fragment| message.subject.contains(fragment))
        {
            return Err(DeliveryError::Rejected {
                status: 403,
                body: "ErrorAccessDenied".to_string(),
            });
        }
        self.sent.lock().expect("mail mutex").push(message.clone());
        Ok(())
    }
}
