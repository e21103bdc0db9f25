//! Synheart Heart Rate - a consent-gated heart rate log.
//!
//! This library records and reviews heart rate readings kept in a health
//! data store. Reading and writing are separately consented, and every store
//! access is counted in an auditable log.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Synheart Heart Rate                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Form input │──▶│ Sync        │──▶│ HealthStore │       │
//! │  │ (validate)  │   │ Controller  │◀──│ (read/write)│       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                                 │
//! │              ┌────────────┴───────────┐                     │
//! │              ▼                        ▼                     │
//! │       ┌─────────────┐          ┌─────────────┐              │
//! │       │  History    │          │   Access    │              │
//! │       │  Snapshot   │          │    Log      │              │
//! │       └─────────────┘          └─────────────┘              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synheart_heart_rate::{InMemoryStore, RecordSyncController};
//!
//! # async fn demo() -> Result<(), synheart_heart_rate::SyncError> {
//! let store = Arc::new(InMemoryStore::new());
//! let controller = RecordSyncController::new(store);
//!
//! controller.start().await?;
//! controller.save("72", "").await?;
//! for sample in controller.snapshot().filtered_records {
//!     println!("{sample}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod record;
pub mod store;
pub mod sync;

// Re-export key types at crate root for convenience
pub use audit::{AccessLog, AccessStats, SharedAccessLog};
pub use config::{Config, ConfigError};
pub use record::{HeartRateRecord, HeartRateSample, TimeRange, ValidationError, ZoneSource};
pub use store::{
    HealthStore, InMemoryStore, JsonFileStore, Permission, PermissionSet, StoreError,
};
pub use sync::{
    Availability, FilterMode, HistorySnapshot, RecordSyncController, SyncError,
    DEFAULT_LOOKBACK_DAYS,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Consent declaration shown before access is granted.
pub const CONSENT_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          SYNHEART HEART RATE - HEALTH DATA ACCESS                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool keeps a log of your heart rate readings.              ║
║                                                                  ║
║  ✓ WITH READ ACCESS IT WILL:                                     ║
║    • Load heart rate readings from the last 30 days              ║
║                                                                  ║
║  ✓ WITH WRITE ACCESS IT WILL:                                    ║
║    • Store readings you enter (rate and time only)               ║
║                                                                  ║
║  ✗ IT NEVER:                                                     ║
║    • Reads any other kind of health data                         ║
║    • Sends readings off this device                              ║
║                                                                  ║
║  Every read and write is counted. Review the counts with:        ║
║    synheart-hr status                                            ║
║                                                                  ║
║  Grant access with `synheart-hr grant`, withdraw it with         ║
║  `synheart-hr revoke`.                                           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
