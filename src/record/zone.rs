//! Time zone used to read and display wall-clock timestamps.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Where local wall-clock time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneSource {
    /// The operating system's local zone
    #[default]
    System,
    /// A named IANA zone
    Named(Tz),
}

impl ZoneSource {
    /// Parse an IANA zone name such as `Europe/Berlin`.
    pub fn named(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(ZoneSource::Named)
    }

    /// Current instant in this zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.from_utc(&Utc::now())
    }

    /// Express a UTC instant with this zone's offset.
    pub fn from_utc(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            ZoneSource::System => instant.with_timezone(&Local).fixed_offset(),
            ZoneSource::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    /// Resolve a wall-clock time in this zone.
    ///
    /// Returns `None` for times skipped by a DST transition. Times repeated
    /// by a transition resolve to the earlier instant.
    pub fn resolve(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            ZoneSource::System => earliest(Local.from_local_datetime(naive)),
            ZoneSource::Named(tz) => earliest(tz.from_local_datetime(naive)),
        }
    }

    /// Zone name for display.
    pub fn name(&self) -> String {
        match self {
            ZoneSource::System => "system local".to_string(),
            ZoneSource::Named(tz) => tz.name().to_string(),
        }
    }
}

fn earliest<Z: TimeZone>(result: LocalResult<DateTime<Z>>) -> Option<DateTime<FixedOffset>> {
    match result {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(first, _) => Some(first.fixed_offset()),
        LocalResult::None => None,
    }
}
