use chrono::{DateTime, Utc};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use credwatch::config::AppConfig;
use credwatch::error::AppError;
use credwatch::telemetry;
use credwatch::workflows::expiry::{write_csv, AuditSummary, ExpiryAuditService, GraphClient};

use crate::infra::{parse_timestamp, render_table};

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Render notifications and log them instead of sending mail
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Evaluate expirations as of this instant (RFC 3339, defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Override the configured look-ahead window in days
    #[arg(long)]
    pub(crate) window_days: Option<i64>,
    /// Override the configured alert point in days
    #[arg(long)]
    pub(crate) alert_days: Option<i64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Evaluate expirations as of this instant (RFC 3339, defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Override the configured look-ahead window in days
    #[arg(long)]
    pub(crate) window_days: Option<i64>,
    /// Print the records as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// Also write the records to a CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn run_audit(args: RunArgs) -> Result<(), AppError> {
    let RunArgs {
        dry_run,
        now,
        window_days,
        alert_days,
    } = args;

    let config = load_config(window_days, alert_days)?;
    let client = Arc::new(GraphClient::with_runtime(config.directory.graph_settings())?);
    let service = ExpiryAuditService::new(client.clone(), client, config.audit.settings(dry_run));

    let now = now.unwrap_or_else(Utc::now);
    info!(?config.environment, %now, dry_run, "credential expiry audit starting");

    let summary = service.run(now)?;
    render_summary(&summary);
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        now,
        window_days,
        json,
        csv,
    } = args;

    // The alert point plays no part in a report.
    let config = load_config(window_days, window_days)?;
    let client = Arc::new(GraphClient::with_runtime(config.directory.graph_settings())?);
    let service = ExpiryAuditService::new(client.clone(), client, config.audit.settings(true));

    let now = now.unwrap_or_else(Utc::now);
    info!(?config.environment, %now, "credential expiry report starting");

    let outcome = service.scan(now)?;

    if let Some(path) = csv {
        let file = File::create(&path)?;
        write_csv(&outcome.records, file)?;
        info!(path = %path.display(), rows = outcome.records.len(), "csv report written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    } else {
        println!(
            "Credentials expiring within {} days of {} ({} applications scanned)",
            service.settings().window_days,
            now.format("%Y-%m-%d %H:%M UTC"),
            outcome.applications_scanned
        );
        print!("{}", render_table(&outcome.records));
    }

    Ok(())
}

fn load_config(window_days: Option<i64>, alert_days: Option<i64>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(days) = window_days {
        config.audit.window_days = days;
    }
    if let Some(days) = alert_days {
        config.audit.alert_days = days;
    }
    config.audit.validate()?;

    telemetry::init(&config.telemetry, config.environment)?;
    Ok(config)
}

fn render_summary(summary: &AuditSummary) {
    println!("Credential expiry audit");
    println!("- {} applications scanned", summary.applications_scanned);
    println!(
        "- {} credentials inside the look-ahead window",
        summary.expiring_credentials
    );
    if summary.dry_run {
        println!(
            "- {} notification batches rendered (dry run, nothing sent)",
            summary.batches
        );
    } else {
        println!(
            "- {} notification batches: {} delivered, {} failed",
            summary.batches, summary.delivered, summary.failed_deliveries
        );
    }
}
