use super::domain::{ExpirationRecord, NotificationBatch};

/// Batches the records sitting exactly `exact_days` from expiry, one batch per
/// application name in order of first appearance. Applications with no such
/// record get no batch, so an empty result is a normal outcome.
pub fn group(records: &[ExpirationRecord], exact_days: i64) -> Vec<NotificationBatch> {
    let mut batches: Vec<NotificationBatch> = Vec::new();

    for record in records.iter().filter(|r| r.days_remaining == exact_days) {
        match batches
            .iter_mut()
            .find(|batch| batch.application_name == record.application_name)
        {
            Some(batch) => batch.records.push(record.clone()),
            None => batches.push(NotificationBatch {
                application_name: record.application_name.clone(),
                alert_days: exact_days,
                records: vec![record.clone()],
            }),
        }
    }

    batches
}
