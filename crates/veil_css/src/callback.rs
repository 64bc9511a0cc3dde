//! The boundary to the uri policy. Every address found in a stylesheet (`url(...)` values and
//! `@import` targets) is handed to a [`UriCallback`], which either returns the address to write
//! or rejects it, in which case the value or rule holding it is dropped.
use url::{ParseError, Url};

use crate::errors::UriError;

/// Mime type passed as hint for `@import` targets
pub const STYLESHEET_MIME: &str = "text/css";

pub trait UriCallback {
    /// Returns the (possibly rewritten) address to use in place of `uri`
    fn process_uri(&self, uri: &str, mime_hint: Option<&str>) -> Result<String, UriError>;
}

impl<F> UriCallback for F
where
    F: Fn(&str, Option<&str>) -> Result<String, UriError>,
{
    fn process_uri(&self, uri: &str, mime_hint: Option<&str>) -> Result<String, UriError> {
        self(uri, mime_hint)
    }
}

/// Rejects every address
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectAllCallback;

impl UriCallback for RejectAllCallback {
    fn process_uri(&self, uri: &str, _mime_hint: Option<&str>) -> Result<String, UriError> {
        Err(UriError::Rejected(uri.to_string()))
    }
}

/// Accepts relative references only. Anything with a scheme of its own, or a network path
/// reference (`//host/...`) that would leave the current site, is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelativeUriCallback;

/// Base that relative references are resolved against while checking them
const PLACEHOLDER_BASE: &str = "http://relative.invalid/dir/";

impl RelativeUriCallback {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl UriCallback for RelativeUriCallback {
    fn process_uri(&self, uri: &str, _mime_hint: Option<&str>) -> Result<String, UriError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(UriError::Malformed(uri.to_string()));
        }

        match Url::parse(uri) {
            Ok(_) => return Err(UriError::Rejected(uri.to_string())),
            Err(ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => return Err(UriError::Malformed(format!("{uri}: {e}"))),
        }

        let base =
            Url::parse(PLACEHOLDER_BASE).map_err(|e| UriError::Malformed(e.to_string()))?;
        let resolved = base
            .join(uri)
            .map_err(|e| UriError::Malformed(format!("{uri}: {e}")))?;
        if resolved.scheme() != base.scheme() || resolved.host() != base.host() {
            return Err(UriError::Rejected(uri.to_string()));
        }

        Ok(uri.to_string())
    }
}

/// Appends the charset hint that tells the fetcher which charset the importing sheet used
#[must_use]
pub fn with_charset_hint(uri: &str, charset: Option<&str>) -> String {
    match charset {
        Some(charset) if uri.contains('?') => format!("{uri}&maybecharset={charset}"),
        Some(charset) => format!("{uri}?maybecharset={charset}"),
        None => uri.to_string(),
    }
}
