//! `{{.NAME}}` filename templates.
//!
//! A template is parsed once into literal and placeholder segments, then
//! rendered against a site and a single `now` sample. Rendering is a single
//! pass: substituted values are never scanned for further placeholders.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Timestamp layout for `{{.TS}}`: sortable, second granularity, no characters
/// that need escaping on common filesystems.
pub const TS_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("filename template is empty")]
    Empty,
    #[error("failed to parse {template:?}: unterminated tag at byte {offset}")]
    Unterminated { template: String, offset: usize },
    #[error("failed to parse {template:?}: invalid tag {tag:?}, expected {{{{.NAME}}}}")]
    InvalidTag { template: String, tag: String },
    #[error("failed to parse {template:?}: unknown placeholder {name:?}")]
    UnknownPlaceholder { template: String, name: String },
}

/// Values a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Site,
    Ts,
    Yyyymmdd,
    Yyyymm,
    Yyyy,
    Yy,
    Mm,
    Dd,
}

impl Placeholder {
    fn render(self, site: &str, now: &DateTime<Utc>) -> String {
        let layout = match self {
            Placeholder::Site => return site.to_string(),
            Placeholder::Ts => TS_FORMAT,
            Placeholder::Yyyymmdd => "%Y%m%d",
            Placeholder::Yyyymm => "%Y%m",
            Placeholder::Yyyy => "%Y",
            Placeholder::Yy => "%y",
            Placeholder::Mm => "%m",
            Placeholder::Dd => "%d",
        };
        now.format(layout).to_string()
    }

    fn name(self) -> &'static str {
        match self {
            Placeholder::Site => "SITE",
            Placeholder::Ts => "TS",
            Placeholder::Yyyymmdd => "YYYYMMDD",
            Placeholder::Yyyymm => "YYYYMM",
            Placeholder::Yyyy => "YYYY",
            Placeholder::Yy => "YY",
            Placeholder::Mm => "MM",
            Placeholder::Dd => "DD",
        }
    }
}

impl FromStr for Placeholder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SITE" => Placeholder::Site,
            "TS" => Placeholder::Ts,
            "YYYYMMDD" => Placeholder::Yyyymmdd,
            "YYYYMM" => Placeholder::Yyyymm,
            "YYYY" => Placeholder::Yyyy,
            "YY" => Placeholder::Yy,
            "MM" => Placeholder::Mm,
            "DD" => Placeholder::Dd,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value(Placeholder),
}

/// A parsed filename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut rest = template;
        let mut consumed = 0usize;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or_else(|| TemplateError::Unterminated {
                    template: template.to_string(),
                    offset: consumed + start,
                })?;
            let tag = after_open[..end].trim();
            let name = tag
                .strip_prefix('.')
                .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
                .ok_or_else(|| TemplateError::InvalidTag {
                    template: template.to_string(),
                    tag: tag.to_string(),
                })?;
            let placeholder =
                name.parse::<Placeholder>()
                    .map_err(|()| TemplateError::UnknownPlaceholder {
                        template: template.to_string(),
                        name: name.to_string(),
                    })?;
            segments.push(Segment::Value(placeholder));

            let advance = start + OPEN.len() + end + CLOSE.len();
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Render with the given site and timestamp.
    pub fn render(&self, site: &str, now: &DateTime<Utc>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Value(p) => out.push_str(&p.render(site, now)),
            }
        }
        out
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => f.write_str(s)?,
                Segment::Value(p) => write!(f, "{{{{.{}}}}}", p.name())?,
            }
        }
        Ok(())
    }
}

impl FromStr for FilenameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
