//! Capture records and the snapshot key scheme.
//!
//! Every capture is keyed by the full `https://` URL it was crawled from.
//! Redirects are first-class records rather than a magic mimetype, so a
//! capture is either content bytes with a media type or a redirect target.

use crate::error::ArchiveError;
use surrealdb::types::{Bytes, SurrealValue};

/// Scheme every snapshot key is stored under. The offline converter
/// normalizes `http://` crawls to this form.
pub const KEY_SCHEME: &str = "https://";

/// Name of the record table inside the snapshot.
pub(crate) const CAPTURE_TABLE: &str = "capture";

/// One archived response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// A stored body with its original media type.
    Content { body: Vec<u8>, mime: String },
    /// An archived redirect; `location` is a scheme-less mirror path
    /// (`domain/rest/of/path`).
    Redirect { location: String },
}

impl Capture {
    /// Whether the capture carries a rewritable HTML body.
    #[must_use]
    pub fn is_html(&self) -> bool {
        match self {
            Self::Content { mime, .. } => mime == "text/html" || mime.starts_with("text/html;"),
            Self::Redirect { .. } => false,
        }
    }
}

/// On-disk shape of a capture. Kept flat so the engine's value mapping stays
/// trivial; exactly one of (`mime` + `body`) or `redirect` is populated.
#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct CaptureRecord {
    pub mime: Option<String>,
    pub body: Option<Bytes>,
    pub redirect: Option<String>,
}

impl From<Capture> for CaptureRecord {
    fn from(capture: Capture) -> Self {
        match capture {
            Capture::Content { body, mime } => {
                Self { mime: Some(mime), body: Some(Bytes::from(body)), redirect: None }
            },
            Capture::Redirect { location } => {
                Self { mime: None, body: None, redirect: Some(location) }
            },
        }
    }
}

impl CaptureRecord {
    /// Interprets the stored record, rejecting half-written shapes.
    pub(crate) fn into_capture(self, url: &str) -> Result<Capture, ArchiveError> {
        if let Some(location) = self.redirect {
            return Ok(Capture::Redirect { location });
        }
        match (self.body, self.mime) {
            (Some(body), Some(mime)) => Ok(Capture::Content { body: body.into_inner().to_vec(), mime }),
            _ => Err(ArchiveError::MalformedRecord { url: url.to_owned() }),
        }
    }
}

/// Builds the primary snapshot key for a normalized, scheme-less path.
pub(crate) fn primary_key(path: &str) -> String {
    format!("{KEY_SCHEME}{path}")
}

/// Builds the secondary key tried after a primary miss.
///
/// Crawlers disagree on trailing slashes, so the fallback toggles the slash
/// in front of the query string (`a/b/?q` <-> `a/b?q`) and appends one to
/// query-less paths.
pub(crate) fn fallback_key(path: &str) -> String {
    match path.split_once('?') {
        Some((base, query)) => match base.strip_suffix('/') {
            Some(trimmed) => format!("{KEY_SCHEME}{trimmed}?{query}"),
            None => format!("{KEY_SCHEME}{base}/?{query}"),
        },
        None => format!("{KEY_SCHEME}{path}/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_toggles_slash_before_query() {
        assert_eq!(
            fallback_key("www.cdc.gov/flu/?page=2"),
            "https://www.cdc.gov/flu?page=2"
        );
        assert_eq!(
            fallback_key("www.cdc.gov/flu?page=2"),
            "https://www.cdc.gov/flu/?page=2"
        );
    }

    #[test]
    fn fallback_appends_slash_without_query() {
        assert_eq!(fallback_key("www.cdc.gov/flu"), "https://www.cdc.gov/flu/");
    }

    #[test]
    fn html_detection_includes_parameterized_mimes() {
        let html = Capture::Content { body: b"<p>".to_vec(), mime: "text/html".to_owned() };
        let charset = Capture::Content {
            body: b"<p>".to_vec(),
            mime: "text/html; charset=utf-8".to_owned(),
        };
        let icon = Capture::Content { body: vec![0], mime: "image/x-icon".to_owned() };

        assert!(html.is_html());
        assert!(charset.is_html());
        assert!(!icon.is_html());
        assert!(!Capture::Redirect { location: "www.cdc.gov/".to_owned() }.is_html());
    }

    #[test]
    fn malformed_records_are_rejected() {
        let record =
            CaptureRecord { mime: Some("text/html".to_owned()), body: None, redirect: None };
        assert!(matches!(
            record.into_capture("https://www.cdc.gov/"),
            Err(ArchiveError::MalformedRecord { .. })
        ));
    }
}
