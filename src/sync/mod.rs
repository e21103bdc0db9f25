//! Heart rate history synchronization.
//!
//! This module contains:
//! - The controller that mediates load and save requests against the store
//! - The history view and the read-only snapshot handed to renderers
//! - Client-side filtering
//! - The single-slot token that keeps requests from overlapping

pub mod controller;
pub mod filter;
pub mod history;
pub mod slot;

// Re-export commonly used types
pub use controller::{RecordSyncController, SyncError, DEFAULT_LOOKBACK_DAYS};
pub use filter::FilterMode;
pub use history::{Availability, FormFields, HistorySnapshot, HistoryView};
pub use slot::{TaskGuard, TaskSlot};
