//! Error taxonomy for one export invocation.
//!
//! Every variant carries the URL or path that was being worked on so the
//! message is actionable on its own. The admin credential never appears here:
//! URLs are built without userinfo and rejection bodies are redacted before
//! they are stored.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::filename::TemplateError;

/// Result alias used by the export pipeline.
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Filename template could not be rendered. Fix the configuration.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The export URL could not be turned into a request.
    #[error("can't make export request for {url}: {reason}")]
    RequestConstruction { url: String, reason: String },

    /// Connection, DNS, reset or protocol failure.
    #[error("request failed for {url}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },

    /// Deadline elapsed during connect, response or body copy.
    #[error("export from {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Remote answered with status >= 300.
    #[error("export from {url} rejected with HTTP {status}: {body}")]
    RemoteRejection {
        url: String,
        status: u32,
        body: String,
    },

    /// Creating, writing, syncing or renaming the local file failed.
    #[error("failed to write backup file {}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// True when a longer timeout might let the same export succeed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExportError::Timeout { .. })
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::LocalIo {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_has_status_and_body() {
        let e = ExportError::RemoteRejection {
            url: "http://h/api/v1/admin/export?mode=file&site=s".into(),
            status: 403,
            body: "access denied".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("access denied"));
        assert!(!e.is_timeout());
    }

    #[test]
    fn timeout_is_distinguished() {
        let e = ExportError::Timeout {
            url: "http://h/".into(),
            timeout: Duration::from_millis(50),
        };
        assert!(e.is_timeout());
        assert!(e.to_string().contains("50ms"));
    }

    #[test]
    fn local_io_names_the_path() {
        let e = ExportError::local_io(
            "/nope/out.gz",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(e.to_string().contains("/nope/out.gz"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
