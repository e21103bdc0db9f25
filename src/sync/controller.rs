//! Record sync controller.
//!
//! Mediates between form input and the health store:
//! - Load reads the lookback window, flattens records into samples and
//!   replaces the history sorted most recent first
//! - Save validates input, writes one instantaneous record and reloads
//! - Filter narrows the loaded history without touching the store
//!
//! Only one load or save runs at a time. A request dispatched while another
//! is in flight is rejected with [`SyncError::Busy`]; the slot is taken when
//! `load`/`save` is called, before the returned future is first polled.

use crate::audit::SharedAccessLog;
use crate::record::{
    parse_sample, HeartRateRecord, HeartRateSample, TimeRange, ValidationError, ZoneSource,
};
use crate::store::{HealthStore, Permission, StoreError};
use crate::sync::filter::FilterMode;
use crate::sync::history::{Availability, HistorySnapshot, HistoryView};
use crate::sync::slot::{TaskGuard, TaskSlot};
use chrono::Utc;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lookback window used on screen entry and after a save.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Errors surfaced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Form input was rejected; nothing was sent to the store
    Validation(ValidationError),
    /// The store call failed
    Store(StoreError),
    /// The reading was stored but reloading history failed
    RefreshFailed {
        saved: HeartRateSample,
        error: StoreError,
    },
    /// Load and save are disabled until these permissions are granted
    NotAuthorized(Vec<Permission>),
    /// Another load or save is still in flight
    Busy,
}

impl SyncError {
    /// Message for inline display.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Validation(e) => e.user_message(),
            SyncError::Store(e) => e.to_string(),
            SyncError::RefreshFailed { error, .. } => {
                format!("Saved, but could not refresh history: {error}")
            }
            SyncError::NotAuthorized(missing) => format!(
                "Health data access not granted ({})",
                missing
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SyncError::Busy => "Another request is still running".to_string(),
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Validation(e) => write!(f, "{e}"),
            SyncError::Store(e) => write!(f, "{e}"),
            SyncError::RefreshFailed { saved, error } => {
                write!(f, "Saved {saved}, refresh failed: {error}")
            }
            SyncError::NotAuthorized(_) | SyncError::Busy => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<ValidationError> for SyncError {
    fn from(e: ValidationError) -> Self {
        SyncError::Validation(e)
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}

/// Owns the heart rate history and mediates access to the store.
pub struct RecordSyncController {
    store: Arc<dyn HealthStore>,
    zone: ZoneSource,
    filter_mode: FilterMode,
    lookback_days: u32,
    view: RwLock<HistoryView>,
    availability: RwLock<Availability>,
    slot: TaskSlot,
    access_log: Option<SharedAccessLog>,
}

impl RecordSyncController {
    /// Create a controller using the system zone and substring filtering.
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            store,
            zone: ZoneSource::default(),
            filter_mode: FilterMode::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            view: RwLock::new(HistoryView::default()),
            availability: RwLock::new(Availability::default()),
            slot: TaskSlot::new(),
            access_log: None,
        }
    }

    /// Read and display wall-clock times in `zone`.
    pub fn with_zone(mut self, zone: ZoneSource) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    /// Window used by `start` and by the reload after a save.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Count store traffic in `log`.
    pub fn with_access_log(mut self, log: SharedAccessLog) -> Self {
        self.access_log = Some(log);
        self
    }

    /// Screen entry: check consent once, then load the default window.
    ///
    /// Missing permissions block load and save until `start` is called again.
    pub async fn start(&self) -> Result<Vec<HeartRateSample>, SyncError> {
        let permissions = match self.store.granted_permissions().await {
            Ok(permissions) => permissions,
            Err(e) => return Err(self.store_failure("permission check", e)),
        };

        let missing = permissions.missing();
        if !missing.is_empty() {
            tracing::warn!(?missing, "health data permissions not granted");
            *self.availability_mut() = Availability::Blocked(missing.clone());
            let err = SyncError::NotAuthorized(missing);
            self.view_mut().error_message = Some(err.user_message());
            return Err(err);
        }

        *self.availability_mut() = Availability::Ready;
        self.load(self.lookback_days).await
    }

    /// Load the last `range_days` days of readings, replacing the history.
    ///
    /// On failure the previous history is kept and the error message is set.
    pub fn load(
        &self,
        range_days: u32,
    ) -> impl Future<Output = Result<Vec<HeartRateSample>, SyncError>> + Send + '_ {
        let dispatch = self.dispatch();
        async move {
            let _guard = dispatch?;
            self.load_dispatched(range_days).await
        }
    }

    /// Validate and store a reading, then reload the history.
    ///
    /// A blank `timestamp_input` means now. Input is validated when the
    /// request is dispatched; rejected input never reaches the store.
    pub fn save(
        &self,
        bpm_input: &str,
        timestamp_input: &str,
    ) -> impl Future<Output = Result<HeartRateSample, SyncError>> + Send + '_ {
        let dispatch = self.dispatch();
        let parsed = parse_sample(bpm_input, timestamp_input, &self.zone);
        async move {
            let _guard = dispatch?;
            let sample = match parsed {
                Ok(sample) => sample,
                Err(e) => {
                    tracing::debug!("rejected heart rate input: {e}");
                    let err = SyncError::Validation(e);
                    self.view_mut().error_message = Some(err.user_message());
                    return Err(err);
                }
            };

            let record = HeartRateRecord::instantaneous(sample);
            if let Err(e) = self.store.insert_records(vec![record]).await {
                return Err(self.store_failure("save", e));
            }

            tracing::info!(
                bpm = sample.beats_per_minute,
                at = %sample.timestamp,
                "saved heart rate"
            );
            if let Some(log) = &self.access_log {
                log.record_save(1);
            }

            match self.load_dispatched(self.lookback_days).await {
                Ok(_) => Ok(sample),
                Err(SyncError::Store(error)) => {
                    let err = SyncError::RefreshFailed {
                        saved: sample,
                        error,
                    };
                    self.view_mut().error_message = Some(err.user_message());
                    Err(err)
                }
                Err(other) => Err(other),
            }
        }
    }

    /// Save using the text bound to the form, clearing it once stored.
    pub fn save_form(
        &self,
    ) -> impl Future<Output = Result<HeartRateSample, SyncError>> + Send + '_ {
        let form = self.view().form.clone();
        let save = self.save(&form.bpm_input, &form.timestamp_input);
        async move {
            let result = save.await;
            if matches!(result, Ok(_) | Err(SyncError::RefreshFailed { .. })) {
                self.view_mut().form.clear();
            }
            result
        }
    }

    /// Narrow the history to samples matching `query`.
    ///
    /// A blank query clears the filter and returns every loaded sample.
    pub fn filter(&self, query: &str) -> Vec<HeartRateSample> {
        self.view_mut().set_filter(query, self.filter_mode).to_vec()
    }

    pub fn set_bpm_input(&self, text: impl Into<String>) {
        self.view_mut().form.bpm_input = text.into();
    }

    pub fn set_timestamp_input(&self, text: impl Into<String>) {
        self.view_mut().form.timestamp_input = text.into();
    }

    /// Read-only copy of the current state for rendering.
    pub fn snapshot(&self) -> HistorySnapshot {
        let availability = self.availability().clone();
        HistorySnapshot::capture(&self.view(), self.slot.is_busy(), availability)
    }

    /// Whether a load or save is in flight.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    fn dispatch(&self) -> Result<TaskGuard, SyncError> {
        if let Availability::Blocked(missing) = &*self.availability() {
            return Err(SyncError::NotAuthorized(missing.clone()));
        }
        self.slot.try_acquire().ok_or(SyncError::Busy)
    }

    async fn load_dispatched(&self, range_days: u32) -> Result<Vec<HeartRateSample>, SyncError> {
        let range = TimeRange::lookback(Utc::now(), range_days);
        tracing::debug!(start = %range.start, end = %range.end, "loading heart rate history");

        let records = match self.store.read_records(range).await {
            Ok(records) => records,
            Err(e) => return Err(self.store_failure("load", e)),
        };

        let samples: Vec<HeartRateSample> = records
            .into_iter()
            .flat_map(|r| r.samples)
            .filter(|s| range.contains(&s.timestamp))
            .map(|s| {
                HeartRateSample::new(
                    self.zone.from_utc(&s.timestamp.with_timezone(&Utc)),
                    s.beats_per_minute,
                )
            })
            .collect();

        let loaded = {
            let mut view = self.view_mut();
            view.replace(samples, self.filter_mode);
            view.error_message = None;
            view.all_records().to_vec()
        };

        tracing::info!(samples = loaded.len(), days = range_days, "loaded heart rate history");
        if let Some(log) = &self.access_log {
            log.record_load(loaded.len());
        }
        Ok(loaded)
    }

    fn store_failure(&self, action: &str, error: StoreError) -> SyncError {
        tracing::warn!("{action} failed: {error}");
        if let Some(log) = &self.access_log {
            log.record_failure();
        }
        if let StoreError::PermissionDenied(permission) = &error {
            *self.availability_mut() = Availability::Blocked(vec![*permission]);
        }

        let err = SyncError::Store(error);
        self.view_mut().error_message = Some(err.user_message());
        err
    }

    fn view(&self) -> RwLockReadGuard<'_, HistoryView> {
        self.view.read().unwrap_or_else(|e| e.into_inner())
    }

    fn view_mut(&self) -> RwLockWriteGuard<'_, HistoryView> {
        self.view.write().unwrap_or_else(|e| e.into_inner())
    }

    fn availability(&self) -> RwLockReadGuard<'_, Availability> {
        self.availability.read().unwrap_or_else(|e| e.into_inner())
    }

    fn availability_mut(&self) -> RwLockWriteGuard<'_, Availability> {
        self.availability.write().unwrap_or_else(|e| e.into_inner())
    }
}
