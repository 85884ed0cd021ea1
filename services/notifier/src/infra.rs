use chrono::{DateTime, Utc};
use credwatch::workflows::expiry::{parse_expiry, ExpirationRecord};

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_expiry(raw)
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

pub(crate) fn render_table(records: &[ExpirationRecord]) -> String {
    if records.is_empty() {
        return "No credentials expire inside the window.\n".to_string();
    }

    let headers = ["App", "AppId", "Key", "Kind", "Expiration", "Days", "Owner"];
    let rows: Vec<[String; 7]> = records
        .iter()
        .map(|record| {
            [
                record.application_name.clone(),
                record.application_external_id.clone(),
                record.key_id.clone(),
                record.credential_kind.label().to_string(),
                record.expiration_label(),
                record.days_remaining.to_string(),
                record.owner.label().to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_row(&mut output, headers.iter().copied(), &widths);
    for row in &rows {
        push_row(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

fn push_row<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    output.push_str(line.trim_end());
    output.push('\n');
}
