pub mod config;
pub mod logging;

pub mod error;
pub mod export;
pub mod filename;

pub use error::{ExportError, Result};
pub use export::{fetch, AdminCredential, ExportRequest, ExportResult};
pub use filename::resolve;
