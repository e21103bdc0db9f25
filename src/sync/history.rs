//! In-memory history state owned by the sync controller.

use crate::record::HeartRateSample;
use crate::store::Permission;
use crate::sync::filter::{self, FilterMode};
use serde::Serialize;

/// Text currently bound to the two form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormFields {
    pub bpm_input: String,
    pub timestamp_input: String,
}

impl FormFields {
    pub fn clear(&mut self) {
        self.bpm_input.clear();
        self.timestamp_input.clear();
    }
}

/// Whether load and save are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "missing")]
pub enum Availability {
    /// Permissions have not been checked yet
    #[default]
    Unchecked,
    /// All required permissions granted
    Ready,
    /// Load and save are disabled until these permissions are granted
    Blocked(Vec<Permission>),
}

/// Loaded heart rate history and the state of the form around it.
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    all_records: Vec<HeartRateSample>,
    filtered_records: Vec<HeartRateSample>,
    filter: Option<String>,
    pub form: FormFields,
    pub error_message: Option<String>,
}

impl HistoryView {
    /// Every loaded sample, most recent first.
    pub fn all_records(&self) -> &[HeartRateSample] {
        &self.all_records
    }

    /// Samples matching the active filter, or all of them without one.
    pub fn filtered_records(&self) -> &[HeartRateSample] {
        &self.filtered_records
    }

    /// The active filter query, if any.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Replace the loaded history.
    ///
    /// Samples are sorted most recent first and the active filter is applied
    /// to the new list.
    pub fn replace(&mut self, mut samples: Vec<HeartRateSample>, mode: FilterMode) {
        sort_descending(&mut samples);
        self.all_records = samples;
        self.reapply(mode);
    }

    /// Set or clear the active filter and recompute the filtered list.
    pub fn set_filter(&mut self, query: &str, mode: FilterMode) -> &[HeartRateSample] {
        self.filter = if filter::is_blank(query) {
            None
        } else {
            Some(query.to_string())
        };
        self.reapply(mode);
        &self.filtered_records
    }

    fn reapply(&mut self, mode: FilterMode) {
        self.filtered_records = match &self.filter {
            Some(query) => filter::apply(mode, &self.all_records, query),
            None => self.all_records.clone(),
        };
    }
}

/// Sort samples most recent first. Equal timestamps keep their order.
pub fn sort_descending(samples: &mut [HeartRateSample]) {
    samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Read-only copy of the view handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub all_records: Vec<HeartRateSample>,
    pub filtered_records: Vec<HeartRateSample>,
    pub filter: Option<String>,
    pub form: FormFields,
    pub error_message: Option<String>,
    /// A load or save is in flight; controls should be disabled
    pub busy: bool,
    pub availability: Availability,
}

impl HistorySnapshot {
    pub(crate) fn capture(view: &HistoryView, busy: bool, availability: Availability) -> Self {
        Self {
            all_records: view.all_records.clone(),
            filtered_records: view.filtered_records.clone(),
            filter: view.filter.clone(),
            form: view.form.clone(),
            error_message: view.error_message.clone(),
            busy,
            availability,
        }
    }

    /// Whether load and save controls should accept input.
    pub fn controls_enabled(&self) -> bool {
        !self.busy && self.availability == Availability::Ready
    }
}
