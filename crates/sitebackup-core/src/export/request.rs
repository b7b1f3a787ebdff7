//! Export request values and endpoint URL construction.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{ExportError, Result};

/// Path of the admin export endpoint, appended to the remote base URL.
pub const EXPORT_PATH: &str = "/api/v1/admin/export";

/// Basic-auth user for the export endpoint.
pub const ADMIN_USER: &str = "admin";

/// Admin password. `Debug` is redacted and there is no `Display`, so the value
/// can't end up in a log line or error chain by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential(String);

impl AdminCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of the secret in `text`.
    pub(crate) fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "****")
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminCredential(****)")
    }
}

/// Everything needed to call the export endpoint once. Built at startup, never mutated.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    remote_url: String,
    site: String,
    credential: AdminCredential,
    timeout: Duration,
}

impl ExportRequest {
    pub fn new(
        remote_url: impl Into<String>,
        site: impl Into<String>,
        credential: AdminCredential,
        timeout: Duration,
    ) -> Self {
        Self {
            remote_url: remote_url.into(),
            site: site.into(),
            credential,
            timeout,
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn credential(&self) -> &AdminCredential {
        &self.credential
    }

    /// `<remote_url>/api/v1/admin/export?mode=file&site=<site>`.
    pub fn export_url(&self) -> Result<Url> {
        export_url(&self.remote_url, &self.site)
    }
}

fn export_url(remote_url: &str, site: &str) -> Result<Url> {
    let raw = format!("{}{}", remote_url.trim_end_matches('/'), EXPORT_PATH);
    let mut url = Url::parse(&raw).map_err(|e| ExportError::RequestConstruction {
        url: without_userinfo(&raw),
        reason: e.to_string(),
    })?;

    if !url.username().is_empty() || url.password().is_some() {
        let _ = url.set_username("");
        let _ = url.set_password(None);
        return Err(ExportError::RequestConstruction {
            url: url.to_string(),
            reason: "credentials in the remote URL are not allowed".into(),
        });
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExportError::RequestConstruction {
            reason: format!("unsupported scheme {:?}", url.scheme()),
            url: raw,
        });
    }

    url.query_pairs_mut()
        .clear()
        .append_pair("mode", "file")
        .append_pair("site", site);
    Ok(url)
}

/// Drop `user:password@` from the authority of an unparseable URL string.
fn without_userinfo(raw: &str) -> String {
    let Some(scheme_end) = raw.find("://") else {
        return raw.to_string();
    };
    let authority_start = scheme_end + 3;
    let authority_end = raw[authority_start..]
        .find(|c| c == '/' || c == '?' || c == '#')
        .map_or(raw.len(), |i| authority_start + i);
    match raw[authority_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}{}",
            &raw[..authority_start],
            &raw[authority_start + at + 1..]
        ),
        None => raw.to_string(),
    }
}
