//! Destination path resolution for an export.
//!
//! Renders the filename template, then applies the directory-override rule:
//! a rendered name containing a path separator is the whole destination and
//! the configured export directory is ignored; otherwise the name is joined
//! onto the export directory.

mod template;

pub use template::{FilenameTemplate, Placeholder, TemplateError, TS_FORMAT};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Resolve the destination path for one export.
///
/// Pure: the same inputs always produce the same path. Callers sample `now`
/// once per invocation and call this once.
pub fn resolve(
    export_dir: &Path,
    template: &str,
    site: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, TemplateError> {
    let template = FilenameTemplate::parse(template)?;
    Ok(resolve_parsed(export_dir, &template, site, now))
}

/// Same as [`resolve`] for an already parsed template.
pub fn resolve_parsed(
    export_dir: &Path,
    template: &FilenameTemplate,
    site: &str,
    now: DateTime<Utc>,
) -> PathBuf {
    let rendered = template.render(site, &now);
    if has_separator(&rendered) {
        PathBuf::from(rendered)
    } else {
        export_dir.join(rendered)
    }
}

fn has_separator(name: &str) -> bool {
    name.chars().any(std::path::is_separator)
}
