use std::io::Write;

use serde::Serialize;

use super::domain::ExpirationRecord;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    app: &'a str,
    app_id: &'a str,
    key_id: &'a str,
    kind: &'static str,
    expires_at: String,
    days_left: i64,
    owner: &'a str,
    endpoint: &'a str,
}

impl<'a> From<&'a ExpirationRecord> for ReportRow<'a> {
    fn from(record: &'a ExpirationRecord) -> Self {
        Self {
            app: &record.application_name,
            app_id: &record.application_external_id,
            key_id: &record.key_id,
            kind: record.credential_kind.label(),
            expires_at: record.expiration_label(),
            days_left: record.days_remaining,
            owner: record.owner.label(),
            endpoint: &record.endpoint_label,
        }
    }
}

/// Writes one CSV row per record, headers included, in the order given.
pub fn write_csv<W: Write>(records: &[ExpirationRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    if records.is_empty() {
        csv_writer.write_record([
            "app",
            "app_id",
            "key_id",
            "kind",
            "expires_at",
            "days_left",
            "owner",
            "endpoint",
        ])?;
    }

    for record in records {
        csv_writer.serialize(ReportRow::from(record))?;
    }

    csv_writer.flush()?;
    Ok(())
}
