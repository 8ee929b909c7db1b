//! Calendar listing.

use dailyevents_service::{CalendarListing, DailyEventsService, ServiceConfig};

use crate::error::ClientResult;

/// Lists the calendars of the instance, marking excluded ones.
pub async fn list(config: ServiceConfig) -> ClientResult<()> {
    let service = DailyEventsService::new(config)?;
    let listing = service.list_calendars().await?;
    print!("{}", render(&listing));
    Ok(())
}

/// Renders one line per calendar: id, display name, exclusion mark.
pub fn render(listing: &[CalendarListing]) -> String {
    if listing.is_empty() {
        return "No calendars found.\n".to_string();
    }

    let width = listing
        .iter()
        .map(|l| l.calendar.id.len())
        .max()
        .unwrap_or(0);

    listing
        .iter()
        .map(|l| {
            let mark = if l.excluded { "  (excluded)" } else { "" };
            format!(
                "{:width$}  {}{}\n",
                l.calendar.id,
                l.calendar.display_name,
                mark,
                width = width
            )
        })
        .collect()
}
