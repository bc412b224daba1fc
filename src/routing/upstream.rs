//! Upstream origin and target URI construction.

use std::fmt;

use axum::http::uri::InvalidUri;
use axum::http::Uri;

use crate::config::validation::is_valid_origin;

/// The statically configured upstream origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Scheme and authority, without a trailing slash.
    origin: String,
}

impl Upstream {
    /// Create an upstream from an origin such as `http://127.0.0.1:8000`.
    ///
    /// Returns `None` if the origin is not an absolute `http` origin.
    pub fn new(origin: &str) -> Option<Self> {
        if !is_valid_origin(origin) {
            return None;
        }
        Some(Self {
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    /// Build the upstream URI for a translated path and the inbound query string.
    pub fn uri_for(&self, path: &str, query: Option<&str>) -> Result<Uri, InvalidUri> {
        let mut target = String::with_capacity(self.origin.len() + path.len() + 16);
        target.push_str(&self.origin);
        target.push_str(path);
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }
        target.parse()
    }

    /// The origin as configured, without a trailing slash.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin)
    }
}
