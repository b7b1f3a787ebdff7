//! Easy2 handler for the export transfer.
//!
//! Tracks the status line of the current response. Bodies of responses with
//! status < 300 are streamed into a temp file next to the destination, created
//! on the first body chunk. Anything else is kept (up to a limit) as
//! diagnostic text and the remainder is drained.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str;

use tempfile::NamedTempFile;

/// Max bytes of a rejection body kept for the error message.
pub(super) const DIAGNOSTIC_LIMIT: usize = 64 * 1024;

pub(super) struct ExportSink {
    destination: PathBuf,
    status: Option<u32>,
    temp: Option<NamedTempFile>,
    bytes_written: u64,
    diagnostic: Vec<u8>,
    io_error: Option<(PathBuf, io::Error)>,
}

impl ExportSink {
    pub(super) fn new(destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            status: None,
            temp: None,
            bytes_written: 0,
            diagnostic: Vec::new(),
            io_error: None,
        }
    }

    pub(super) fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub(super) fn take_temp(&mut self) -> Option<NamedTempFile> {
        self.temp.take()
    }

    /// Error raised inside the write callback, with the path it concerned.
    pub(super) fn take_io_error(&mut self) -> Option<(PathBuf, io::Error)> {
        self.io_error.take()
    }

    pub(super) fn diagnostic(&self) -> &[u8] {
        &self.diagnostic
    }

    /// Temp file holding the body; created empty if no body chunk arrived.
    pub(super) fn take_or_create_temp(&mut self) -> io::Result<NamedTempFile> {
        match self.temp.take() {
            Some(t) => Ok(t),
            None => create_temp(&self.destination),
        }
    }

    fn streaming(&self) -> bool {
        matches!(self.status, Some(code) if code < 300)
    }

    /// Record a write-side failure; returning 0 from the callback aborts the transfer.
    fn fail(&mut self, path: PathBuf, e: io::Error) -> usize {
        tracing::warn!("export write to {} failed: {}", path.display(), e);
        self.io_error = Some((path, e));
        0
    }

    fn keep_diagnostic(&mut self, data: &[u8]) {
        let room = DIAGNOSTIC_LIMIT.saturating_sub(self.diagnostic.len());
        self.diagnostic
            .extend_from_slice(&data[..data.len().min(room)]);
    }
}

impl curl::easy::Handler for ExportSink {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(line) = str::from_utf8(data) {
            if let Some(code) = parse_status_line(line.trim_end()) {
                // Every response in a redirect chain starts over.
                self.status = Some(code);
                self.diagnostic.clear();
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if !self.streaming() {
            self.keep_diagnostic(data);
            return Ok(data.len());
        }
        if self.temp.is_none() {
            match create_temp(&self.destination) {
                Ok(t) => self.temp = Some(t),
                Err(e) => return Ok(self.fail(self.destination.clone(), e)),
            }
        }
        let Some(file) = self.temp.as_mut() else {
            return Ok(0);
        };
        if let Err(e) = file.write_all(data) {
            let path = file.path().to_path_buf();
            return Ok(self.fail(path, e));
        }
        self.bytes_written += data.len() as u64;
        Ok(data.len())
    }
}

/// Status code from a `HTTP/x.y NNN reason` line.
pub(super) fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Hidden, uniquely named temp file in the destination's directory, so the
/// final rename stays on one filesystem.
///
/// Created with mode 0666 filtered by the umask, the same bits a plain
/// `File::create` of the destination would get.
fn create_temp(destination: &Path) -> io::Result<NamedTempFile> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let prefix = format!(".{}.", name);

    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
