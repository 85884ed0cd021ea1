use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NO_DISPLAY_NAME: &str = "No display name";
pub const NO_APP_ID: &str = "No appId";
pub const NO_KEY_ID: &str = "No keyId";
pub const NO_ENDPOINT: &str = "none";
pub const NO_OWNER: &str = "No owner";

/// Snapshot of one application registration as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    /// Directory-internal object id; owners are looked up by this value.
    pub id: Option<String>,
    pub app_id: Option<String>,
    pub display_name: Option<String>,
    pub identifier_uris: Vec<String>,
    pub credentials: Vec<CredentialEntry>,
}

impl ApplicationRecord {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(NO_DISPLAY_NAME)
    }

    pub fn external_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(NO_APP_ID)
    }

    pub fn endpoint_label(&self) -> &str {
        self.identifier_uris
            .first()
            .map(String::as_str)
            .unwrap_or(NO_ENDPOINT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Certificate,
    Secret,
}

impl CredentialKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Secret => "secret",
        }
    }
}

/// A key or secret attached to an application. `expires_at` is the raw
/// timestamp text so that unparseable values surface in the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub key_id: Option<String>,
    pub kind: CredentialKind,
    pub expires_at: Option<String>,
}

impl CredentialEntry {
    pub fn key_label(&self) -> &str {
        self.key_id.as_deref().unwrap_or(NO_KEY_ID)
    }
}

/// Owner entry as returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryIdentity {
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Resolved owner of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Owner {
    Mail(String),
    DisplayName(String),
    Missing,
}

impl Owner {
    /// Mail first, display name second; blank values count as absent.
    pub fn from_identity(identity: Option<DirectoryIdentity>) -> Self {
        let Some(identity) = identity else {
            return Self::Missing;
        };

        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        match (non_blank(identity.mail), non_blank(identity.display_name)) {
            (Some(mail), _) => Self::Mail(mail),
            (None, Some(name)) => Self::DisplayName(name),
            (None, None) => Self::Missing,
        }
    }

    /// Deliverable address, if the owner has one.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Mail(mail) => Some(mail),
            Self::DisplayName(_) | Self::Missing => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Mail(value) | Self::DisplayName(value) => value,
            Self::Missing => NO_OWNER,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A credential inside the look-ahead window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpirationRecord {
    pub application_name: String,
    pub application_external_id: String,
    pub key_id: String,
    pub credential_kind: CredentialKind,
    pub expires_at: DateTime<Utc>,
    pub days_remaining: i64,
    pub owner: Owner,
    pub endpoint_label: String,
}

impl ExpirationRecord {
    pub fn expiration_label(&self) -> String {
        self.expires_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

/// Records of one application that hit the alert point on the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    pub application_name: String,
    pub alert_days: i64,
    pub records: Vec<ExpirationRecord>,
}

impl NotificationBatch {
    /// The record the ticket template and owner recipient are taken from.
    /// `group` never yields an empty batch, but one can be built by hand.
    pub fn lead(&self) -> Option<&ExpirationRecord> {
        self.records.first()
    }
}

/// Bearer token for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
