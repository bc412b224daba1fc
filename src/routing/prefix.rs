//! Routing prefix matching and stripping.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - The prefix must end on a segment boundary: `/api/proxy` matches
//!   `/api/proxy` and `/api/proxy/x` but not `/api/proxyx`
//! - Empty prefix = always matches (wildcard)

/// The fixed prefix in front of every relayed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePrefix {
    prefix: String,
}

impl RoutePrefix {
    /// Create a new route prefix. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Returns true if the path falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// Translate an inbound path into the upstream path.
    ///
    /// Returns `None` when the path is not under the prefix. The result always
    /// starts with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// The normalized prefix.
    pub fn as_str(&self) -> &str {
        &self.prefix
    }
}
