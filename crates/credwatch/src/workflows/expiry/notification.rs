use std::fmt::Write as _;

use super::domain::{ExpirationRecord, NotificationBatch};

/// Static parts of the alert message that come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub ticket_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub subject: String,
    pub html_body: String,
}

pub fn subject_for(application_name: &str, alert_days: i64) -> String {
    format!("Alert: Keys expiring in {alert_days} days for application: {application_name}")
}

/// Renders a batch into a subject and HTML body. The ticket template at the end
/// is built from the first record only and is left out of an empty batch.
pub fn format_notification(
    batch: &NotificationBatch,
    template: &NotificationTemplate,
) -> RenderedNotification {
    let mut html = String::new();

    writeln!(
        html,
        "<p>The following key(s) are scheduled to expire in exactly {} days:</p>",
        batch.alert_days
    )
    .expect("write intro");

    for record in &batch.records {
        writeln!(html, "<p>{}</p><hr>", render_record(record)).expect("write record block");
    }

    html.push_str(
        "<p>If you wish to extend the application's validity (i.e. generate a new secret), \
         please submit a ticket using the link below:</p>\n",
    );
    writeln!(
        html,
        "<p><a href=\"{}\">Submit Ticket</a></p>",
        escape_html(&template.ticket_url)
    )
    .expect("write ticket link");
    html.push_str("<hr>\n");
    if let Some(lead) = batch.lead() {
        html.push_str(&render_ticket_template(lead));
    }

    RenderedNotification {
        subject: subject_for(&batch.application_name, batch.alert_days),
        html_body: html,
    }
}

/// Owner address first (when the owner has one), then the operations mailbox.
pub fn recipients(batch: &NotificationBatch, operations_mailbox: &str) -> Vec<String> {
    let mut recipients = Vec::with_capacity(2);
    if let Some(address) = batch.lead().and_then(|lead| lead.owner.address()) {
        recipients.push(address.to_string());
    }
    recipients.push(operations_mailbox.to_string());
    recipients
}

fn render_record(record: &ExpirationRecord) -> String {
    format!(
        "<strong>App:</strong> {}<br>\
         <strong>AppId:</strong> {}<br>\
         <strong>Key:</strong> {}<br>\
         <strong>Expiration:</strong> {}<br>\
         <strong>Days Left:</strong> {}<br>\
         <strong>Owner:</strong> {}<br>",
        escape_html(&record.application_name),
        escape_html(&record.application_external_id),
        escape_html(&record.key_id),
        record.expiration_label(),
        record.days_remaining,
        escape_html(record.owner.label()),
    )
}

fn render_ticket_template(lead: &ExpirationRecord) -> String {
    let app = escape_html(&lead.application_name);
    format!(
        "<h3>Ticket Submission Template</h3>\
         <p><strong>Summary:</strong> Request to Generate New Secret for {app}</p>\
         <p><strong>Description:</strong><br>\
         <strong>Application Name:</strong> {app}<br>\
         <strong>AppId:</strong> {}<br>\
         <strong>Current Secret Expiration Date:</strong> {}<br>\
         <strong>Owner:</strong> {}<br><br>\
         Please generate a new secret for the above application to extend its validity. \
         If additional details are required, please contact the application owner.</p>",
        escape_html(&lead.application_external_id),
        lead.expiration_label(),
        escape_html(lead.owner.label()),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
