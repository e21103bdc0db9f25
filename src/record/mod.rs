//! Heart rate records and user input handling.
//!
//! This module defines the value types exchanged with the health store and
//! the validation applied to form input before anything is written.

pub mod input;
pub mod types;
pub mod zone;

// Re-export commonly used types
pub use input::{parse_bpm, parse_sample, parse_timestamp, ValidationError};
pub use types::{
    HeartRateRecord, HeartRateSample, RecordMetadata, TimeRange, DISPLAY_FORMAT, MAX_BPM, MIN_BPM,
};
pub use zone::ZoneSource;
