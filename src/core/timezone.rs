use chrono::{DateTime, FixedOffset, Utc};

/// Facility timezone handling: all timestamps are stored internally as
/// UTC and converted to the facility's fixed offset only for display
/// (email bodies, calendar links)
#[derive(Debug, Clone, Copy)]
pub struct FacilityTimezone {
    offset: FixedOffset,
}

impl FacilityTimezone {
    /// Build from a whole-hour UTC offset (e.g. 1 for Madrid in winter)
    pub fn from_utc_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(|offset| Self { offset })
    }

    /// Convert a UTC instant to facility-local time
    pub fn to_local(&self, utc_time: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc_time.with_timezone(&self.offset)
    }

    /// Human-readable local timestamp for email bodies
    pub fn format_local(&self, utc_time: DateTime<Utc>) -> String {
        self.to_local(utc_time).format("%d/%m/%Y %H:%M").to_string()
    }
}
