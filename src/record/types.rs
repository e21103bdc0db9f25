//! Heart rate value types shared by the store and the sync controller.
//!
//! Samples are immutable once created. Records mirror the interval model of
//! platform health stores: a reading is stored as a one-millisecond interval.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lowest heart rate accepted from user input.
pub const MIN_BPM: u32 = 1;

/// Highest heart rate accepted from user input.
pub const MAX_BPM: u32 = 300;

/// Display pattern for sample timestamps (`yyyy-MM-dd HH:mm`).
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single heart rate reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Moment the reading was taken, with the offset it was recorded in
    pub timestamp: DateTime<FixedOffset>,
    /// Beats per minute
    pub beats_per_minute: u32,
}

impl HeartRateSample {
    pub fn new(timestamp: DateTime<FixedOffset>, beats_per_minute: u32) -> Self {
        Self {
            timestamp,
            beats_per_minute,
        }
    }

    /// Rate as shown in the history list, e.g. `72 bpm`.
    pub fn rate_label(&self) -> String {
        format!("{} bpm", self.beats_per_minute)
    }

    /// Timestamp as shown in the history list, in the sample's own offset.
    pub fn time_label(&self) -> String {
        self.timestamp.format(DISPLAY_FORMAT).to_string()
    }
}

impl fmt::Display for HeartRateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.time_label(), self.rate_label())
    }
}

/// Identity and provenance of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Unique record identifier
    pub id: Uuid,
    /// Device that wrote the record
    pub origin_device: String,
}

impl RecordMetadata {
    /// Create metadata for a record written from this machine.
    pub fn local() -> Self {
        let origin_device = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            id: Uuid::new_v4(),
            origin_device,
        }
    }
}

/// A stored heart rate record: an interval carrying one or more samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateRecord {
    pub metadata: RecordMetadata,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Local offset at the start of the interval, stored as seconds east of UTC
    #[serde(with = "offset_serde")]
    pub start_zone_offset: FixedOffset,
    #[serde(with = "offset_serde")]
    pub end_zone_offset: FixedOffset,
    pub samples: Vec<HeartRateSample>,
}

impl HeartRateRecord {
    /// Wrap a single instantaneous reading.
    ///
    /// The record spans `[t, t + 1ms]` and uses the sample's offset for both
    /// ends of the interval.
    pub fn instantaneous(sample: HeartRateSample) -> Self {
        let start_time = sample.timestamp.with_timezone(&Utc);
        let offset = *sample.timestamp.offset();

        Self {
            metadata: RecordMetadata::local(),
            start_time,
            end_time: start_time + Duration::milliseconds(1),
            start_zone_offset: offset,
            end_zone_offset: offset,
            samples: vec![sample],
        }
    }

    /// Check whether the record interval intersects the given range.
    pub fn overlaps(&self, range: &TimeRange) -> bool {
        self.start_time <= range.end && self.end_time >= range.start
    }
}

/// Inclusive time range used for store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, swapping the bounds if they are reversed.
    pub fn between(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// The `days` days leading up to `end`.
    ///
    /// Windows reaching past the earliest representable instant start there.
    pub fn lookback(end: DateTime<Utc>, days: u32) -> Self {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// Check if an instant falls within the range (both ends inclusive).
    pub fn contains<Tz: chrono::TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        instant >= self.start && instant <= self.end
    }
}

// Helper module for FixedOffset serialization
mod offset_serde {
    use chrono::FixedOffset;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(offset: &FixedOffset, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        offset.local_minus_utc().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<FixedOffset, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = i32::deserialize(deserializer)?;
        FixedOffset::east_opt(secs)
            .ok_or_else(|| D::Error::custom(format!("zone offset out of range: {secs}")))
    }
}
