//! Export fetcher: one authenticated GET against the admin export endpoint,
//! body streamed to disk.
//!
//! Uses the curl crate (libcurl easy interface). The configured timeout is a
//! single deadline for connect, response and body copy. The body goes to a
//! hidden temp file beside the destination which is fsynced and renamed into
//! place only after the transfer completed; on any failure the temp file is
//! removed and the destination is left as it was.
//!
//! Blocking; call from `spawn_blocking` if used from async code.

mod request;
mod sink;

pub use request::{AdminCredential, ExportRequest, ADMIN_USER, EXPORT_PATH};

use std::fs;
use std::path::{Path, PathBuf};

use curl::easy::{Auth, Easy2};
use tempfile::NamedTempFile;

use crate::error::{ExportError, Result};
use sink::ExportSink;

/// Redirects followed before giving up.
const MAX_REDIRECTS: u32 = 10;

/// A completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Fetch the export for `request` and write it to `destination`.
///
/// No retries: a failed attempt is final.
pub fn fetch(request: &ExportRequest, destination: &Path) -> Result<ExportResult> {
    let url = request.export_url()?;
    let url_str = url.to_string();
    if request.timeout().is_zero() {
        // libcurl reads a zero timeout as "no deadline".
        return Err(ExportError::RequestConstruction {
            url: url_str,
            reason: "timeout must be greater than zero".into(),
        });
    }

    let mut easy = Easy2::new(ExportSink::new(destination));
    configure(&mut easy, url.as_str(), request).map_err(|e| ExportError::RequestConstruction {
        url: url_str.clone(),
        reason: e.to_string(),
    })?;

    tracing::debug!(url = %url_str, timeout = ?request.timeout(), "export request");
    let performed = easy.perform();
    let sink = easy.get_mut();

    if let Some((path, source)) = sink.take_io_error() {
        discard(sink.take_temp());
        return Err(ExportError::LocalIo { path, source });
    }
    if let Err(e) = performed {
        discard(sink.take_temp());
        if e.is_operation_timedout() {
            return Err(ExportError::Timeout {
                url: url_str,
                timeout: request.timeout(),
            });
        }
        return Err(ExportError::Transport {
            url: url_str,
            source: e,
        });
    }

    let status = easy.response_code().map_err(|e| ExportError::Transport {
        url: url_str.clone(),
        source: e,
    })?;
    let sink = easy.get_mut();
    if status >= 300 {
        discard(sink.take_temp());
        let body = String::from_utf8_lossy(sink.diagnostic());
        let body = request.credential().redact(body.trim());
        tracing::debug!(status, "export rejected");
        return Err(ExportError::RemoteRejection {
            url: url_str,
            status,
            body,
        });
    }

    let bytes = sink.bytes_written();
    let temp = sink
        .take_or_create_temp()
        .map_err(|e| ExportError::local_io(destination, e))?;
    persist(temp, destination)?;

    tracing::info!("export completed, file {}, {} bytes", destination.display(), bytes);
    Ok(ExportResult {
        path: destination.to_path_buf(),
        bytes,
    })
}

fn configure(
    easy: &mut Easy2<ExportSink>,
    url: &str,
    request: &ExportRequest,
) -> std::result::Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.useragent(concat!("sitebackup/", env!("CARGO_PKG_VERSION")))?;
    easy.username(ADMIN_USER)?;
    easy.password(request.credential().expose())?;
    easy.http_auth(Auth::new().basic(true))?;
    // Whole-operation deadline: connect, request, response and body copy.
    easy.timeout(request.timeout())?;
    Ok(())
}

/// Flush to disk and atomically move the temp file onto `destination`.
/// An existing destination keeps its permission bits.
fn persist(temp: NamedTempFile, destination: &Path) -> Result<()> {
    if let Ok(meta) = fs::metadata(destination) {
        if let Err(e) = fs::set_permissions(temp.path(), meta.permissions()) {
            tracing::warn!(
                "failed to copy permissions of {} to new export, {}",
                destination.display(),
                e
            );
        }
    }
    if let Err(e) = temp.as_file().sync_all() {
        let path = temp.path().to_path_buf();
        discard(Some(temp));
        return Err(ExportError::local_io(path, e));
    }
    // On failure the returned PersistError owns the temp file and removes it on drop.
    temp.persist(destination)
        .map_err(|e| ExportError::local_io(destination, e.error))?;
    Ok(())
}

/// Remove a temp file left by a failed transfer. Removal problems are only warned about.
fn discard(temp: Option<NamedTempFile>) {
    let Some(temp) = temp else {
        return;
    };
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!("failed to remove partial export {}, {}", path.display(), e);
    }
}
