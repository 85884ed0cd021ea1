use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::directory::DirectoryClient;
use super::domain::{AccessToken, ApplicationRecord, CredentialEntry, ExpirationRecord, Owner};

/// Collects every credential that expires within `window_days` of `now`.
///
/// Output follows application order, then credential order. Credentials without
/// a timestamp, with an unparseable one, or already expired are skipped. The
/// owner is looked up once per application, and only when one of its
/// credentials makes it into the window.
pub fn classify<D>(
    directory: &D,
    token: &AccessToken,
    applications: &[ApplicationRecord],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<ExpirationRecord>
where
    D: DirectoryClient + ?Sized,
{
    // A window past chrono's range leaves the scan unbounded.
    let horizon = Duration::try_days(window_days).and_then(|window| now.checked_add_signed(window));
    let mut records = Vec::new();

    for application in applications {
        let mut owner: Option<Owner> = None;

        for credential in &application.credentials {
            let Some(expires_at) = credential_expiry(application, credential) else {
                continue;
            };

            let Some(days_remaining) = days_remaining(expires_at, now) else {
                continue;
            };

            if horizon.is_some_and(|horizon| expires_at > horizon) {
                continue;
            }

            let owner = owner
                .get_or_insert_with(|| resolve_owner(directory, token, application))
                .clone();

            records.push(ExpirationRecord {
                application_name: application.name().to_string(),
                application_external_id: application.external_id().to_string(),
                key_id: credential.key_label().to_string(),
                credential_kind: credential.kind,
                expires_at,
                days_remaining,
                owner,
                endpoint_label: application.endpoint_label().to_string(),
            });
        }
    }

    records
}

/// Whole days until expiry, or `None` once the instant has passed. Partial days
/// are truncated, never rounded up.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    if expires_at < now {
        return None;
    }
    Some((expires_at - now).num_days())
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|dt| dt.with_timezone(&Utc))
}

fn credential_expiry(
    application: &ApplicationRecord,
    credential: &CredentialEntry,
) -> Option<DateTime<Utc>> {
    let raw = credential
        .expires_at
        .as_deref()
        .filter(|value| !value.trim().is_empty())?;

    match parse_expiry(raw) {
        Ok(expires_at) => Some(expires_at),
        Err(err) => {
            warn!(
                application = application.name(),
                key_id = credential.key_label(),
                value = raw,
                error = %err,
                "skipping credential with unparseable expiration"
            );
            None
        }
    }
}

fn resolve_owner<D>(directory: &D, token: &AccessToken, application: &ApplicationRecord) -> Owner
where
    D: DirectoryClient + ?Sized,
{
    let Some(object_id) = application.id.as_deref() else {
        debug!(
            application = application.name(),
            "no internal id, owner lookup skipped"
        );
        return Owner::Missing;
    };

    match directory.primary_owner(token, object_id) {
        Ok(identity) => Owner::from_identity(identity),
        Err(err) => {
            warn!(application = application.name(), error = %err, "owner lookup failed");
            Owner::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn truncates_partial_days() {
        let expires = now() + Duration::days(29) + Duration::hours(23);
        assert_eq!(days_remaining(expires, now()), Some(29));
    }

    #[test]
    fn rejects_instants_in_the_past() {
        let expires = now() - Duration::hours(1);
        assert_eq!(days_remaining(expires, now()), None);
        assert_eq!(days_remaining(now(), now()), Some(0));
    }

    #[test]
    fn parses_zulu_and_offset_timestamps() {
        let zulu = parse_expiry("2025-03-31T09:00:00Z").expect("zulu parses");
        let offset = parse_expiry("2025-03-31T11:00:00+02:00").expect("offset parses");
        let fractional = parse_expiry("2025-03-31T09:00:00.1234567Z").expect("fraction parses");
        assert_eq!(zulu, offset);
        assert_eq!(zulu.timestamp(), fractional.timestamp());
        assert!(parse_expiry("31/03/2025").is_err());
    }
}
