//! Validation of the heart rate and date/time form inputs.

use crate::record::types::{HeartRateSample, DISPLAY_FORMAT, MAX_BPM, MIN_BPM};
use crate::record::zone::ZoneSource;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Malformed or out-of-range user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Heart rate text is not a whole number
    InvalidHeartRate(String),
    /// Heart rate parsed but falls outside 1-300
    HeartRateOutOfRange(u32),
    /// Date/time text does not match `yyyy-MM-dd HH:mm` or names a skipped local time
    InvalidDateTime(String),
}

impl ValidationError {
    /// Short message suitable for inline display next to the form.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::InvalidHeartRate(_) => "Invalid heart rate".to_string(),
            ValidationError::HeartRateOutOfRange(_) => {
                format!("Heart rate must be between {MIN_BPM} and {MAX_BPM} bpm")
            }
            ValidationError::InvalidDateTime(_) => "Invalid date/time".to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidHeartRate(input) => {
                write!(f, "Invalid heart rate: '{input}'")
            }
            ValidationError::HeartRateOutOfRange(bpm) => {
                write!(f, "Heart rate {bpm} out of range ({MIN_BPM}-{MAX_BPM} bpm)")
            }
            ValidationError::InvalidDateTime(input) => {
                write!(f, "Invalid date/time: '{input}' (expected yyyy-MM-dd HH:mm)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse heart rate text into a whole number of beats per minute.
pub fn parse_bpm(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();

    // u32::from_str accepts a leading '+'; the form only takes plain digits.
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidHeartRate(input.to_string()));
    }

    let bpm: u32 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidHeartRate(input.to_string()))?;

    if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
        return Err(ValidationError::HeartRateOutOfRange(bpm));
    }

    Ok(bpm)
}

/// Parse the optional date/time field.
///
/// Blank input means "now". Anything else must match `yyyy-MM-dd HH:mm`
/// exactly and is read as wall-clock time in `zone`.
pub fn parse_timestamp(
    input: &str,
    zone: &ZoneSource,
) -> Result<DateTime<FixedOffset>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(zone.now());
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, DISPLAY_FORMAT)
        .map_err(|_| ValidationError::InvalidDateTime(input.to_string()))?;

    zone.resolve(&naive)
        .ok_or_else(|| ValidationError::InvalidDateTime(input.to_string()))
}

/// Validate both form fields and build the sample to store.
pub fn parse_sample(
    bpm_input: &str,
    timestamp_input: &str,
    zone: &ZoneSource,
) -> Result<HeartRateSample, ValidationError> {
    let bpm = parse_bpm(bpm_input)?;
    let timestamp = parse_timestamp(timestamp_input, zone)?;
    Ok(HeartRateSample::new(timestamp, bpm))
}
