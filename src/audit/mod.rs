//! Audit module for health store access.
//!
//! Tracks how much heart rate data the application read and wrote, so that
//! consent can be reviewed against actual use.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, AccessLog, AccessStats,
    SharedAccessLog, ACCESS_LOG_FILE,
};
