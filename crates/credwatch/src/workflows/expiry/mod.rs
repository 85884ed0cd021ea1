//! Credential expiry audit for application registrations: directory scan,
//! window classification, per-application alert batching, and notification.

mod classifier;
pub mod directory;
pub mod domain;
pub mod graph;
mod grouper;
pub mod mailer;
pub mod notification;
pub mod report;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{classify, days_remaining, parse_expiry};
pub use directory::{DirectoryClient, DirectoryError, OwnerLookupError};
pub use domain::{
    AccessToken, ApplicationRecord, CredentialEntry, CredentialKind, DirectoryIdentity,
    ExpirationRecord, NotificationBatch, Owner,
};
pub use graph::{GraphClient, GraphSettings, GraphSetupError};
pub use grouper::group;
pub use mailer::{DeliveryError, Mailer, OutboundMessage};
pub use notification::{
    format_notification, recipients, NotificationTemplate, RenderedNotification,
};
pub use report::write_csv;
pub use service::{AuditError, AuditSettings, AuditSummary, ExpiryAuditService, ScanOutcome};
