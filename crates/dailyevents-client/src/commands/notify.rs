//! Digest notification.

use chrono::Utc;
use tracing::debug;

use dailyevents_service::{DailyEventsService, Digest, NotifyOutcome, NotifyRequest, ServiceConfig};

use crate::error::{ClientError, ClientResult};

/// Builds the digest and sends it, or prints it with `dry_run`.
pub async fn run(config: ServiceConfig, days: Option<u32>, dry_run: bool) -> ClientResult<()> {
    let service = DailyEventsService::new(config)?;
    let request = NotifyRequest { num_of_days: days };

    if dry_run {
        let digest = service.prepare_digest(Utc::now(), &request).await?;
        print!("{}", render_dry_run(&digest, &service.channels()));
        return Ok(());
    }

    let outcome = service.notify(request).await?;
    debug!(message = %outcome.digest.message, "Digest sent");

    for line in warnings(&outcome.digest) {
        eprintln!("warning: {}", line);
    }
    for failure in &outcome.failed_channels {
        eprintln!("warning: channel {}: {}", failure.channel, failure.error);
    }

    if outcome.all_channels_failed() {
        return Err(ClientError::Delivery(format!(
            "no channel received the digest ({} tried)",
            outcome.failed_channels.len()
        )));
    }

    println!("{}", render_summary(&outcome));
    Ok(())
}

/// The digest followed by the channels it would go to.
pub fn render_dry_run(digest: &Digest, channels: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(&digest.message);
    if !digest.message.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("\n-- would send to: {}\n", channels.join(", ")));
    for line in warnings(digest) {
        out.push_str(&format!("-- warning: {}\n", line));
    }
    out
}

/// One-line report of a notify invocation.
pub fn render_summary(outcome: &NotifyOutcome) -> String {
    format!(
        "Sent {} event(s) to {}",
        outcome.digest.event_count,
        outcome.delivered_channels.join(", ")
    )
}

fn warnings(digest: &Digest) -> Vec<String> {
    digest
        .failed_calendars
        .iter()
        .map(|f| format!("calendar {} skipped: {}", f.calendar.id, f.error))
        .collect()
}
