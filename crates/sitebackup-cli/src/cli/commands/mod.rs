//! CLI command handlers.

mod backup;

pub use backup::run_backup;
