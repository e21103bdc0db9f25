//! Client-side filtering of loaded history.

use crate::record::HeartRateSample;
use serde::{Deserialize, Serialize};

/// How a filter query is matched against samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep samples whose rate label contains `"<query> bpm"`.
    ///
    /// A query of `90` matches both `90 bpm` and `190 bpm`.
    #[default]
    Substring,
    /// Query is a number `N` or an inclusive range `LOW-HIGH`.
    Exact,
}

impl FilterMode {
    /// Parse a mode name as used on the command line and in config.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "substring" => Some(FilterMode::Substring),
            "exact" => Some(FilterMode::Exact),
            _ => None,
        }
    }
}

/// A query is blank when it has no visible characters.
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

/// Select the samples matching `query`, preserving order.
///
/// A blank query returns every sample.
pub fn apply(mode: FilterMode, samples: &[HeartRateSample], query: &str) -> Vec<HeartRateSample> {
    if is_blank(query) {
        return samples.to_vec();
    }

    match mode {
        FilterMode::Substring => {
            let needle = format!("{query} bpm");
            samples
                .iter()
                .filter(|s| s.rate_label().contains(&needle))
                .copied()
                .collect()
        }
        FilterMode::Exact => match parse_bounds(query) {
            Some((low, high)) => samples
                .iter()
                .filter(|s| (low..=high).contains(&s.beats_per_minute))
                .copied()
                .collect(),
            None => Vec::new(),
        },
    }
}

fn parse_bounds(query: &str) -> Option<(u32, u32)> {
    let query = query.trim();
    match query.split_once('-') {
        Some((low, high)) => {
            let low: u32 = low.trim().parse().ok()?;
            let high: u32 = high.trim().parse().ok()?;
            (low <= high).then_some((low, high))
        }
        None => {
            let bpm: u32 = query.parse().ok()?;
            Some((bpm, bpm))
        }
    }
}
