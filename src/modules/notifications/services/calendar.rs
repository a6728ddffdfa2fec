use chrono::{DateTime, Utc};

/// Google Calendar template deep link for a reservation. Instants are
/// rendered as UTC with the facility's IANA timezone passed via `ctz`
/// so the calendar displays local times.
pub fn calendar_link(
    title: &str,
    location: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    timezone: &str,
) -> String {
    let fmt = "%Y%m%dT%H%M%SZ";
    format!(
        "https://calendar.google.com/calendar/render?action=TEMPLATE&text={}&location={}&dates={}/{}&ctz={}",
        urlencoding::encode(title),
        urlencoding::encode(location),
        starts_at.format(fmt),
        ends_at.format(fmt),
        urlencoding::encode(timezone),
    )
}
