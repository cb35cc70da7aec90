//! Header-based API versioning.
//!
//! A client selects a version by sending a vendor media type in `Accept`:
//!
//! ```text
//! Accept: application/vnd.zombies.v1+json
//! ```
//!
//! Requests without one fall through to the version flagged as default, if
//! any. Paths carry no version prefix.

use serde::Deserialize;

use crate::request::Request;

/// One declared API version.
///
/// Built once at router setup and never changed afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ApiVersion {
    identifier: String,
    #[serde(default, rename = "default")]
    is_default: bool,
}

impl ApiVersion {
    /// A non-default version.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), is_default: false }
    }

    /// Flags this version as the catch-all for requests that do not name one.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn identifier(&self) -> &str { &self.identifier }
    pub fn is_default(&self) -> bool { self.is_default }
}

/// Decides whether a request belongs to an [`ApiVersion`].
#[derive(Clone, Debug)]
pub struct VersionMatcher {
    namespace: String,
}

impl VersionMatcher {
    /// `namespace` is the vendor segment of the media type, e.g. `zombies`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    /// `application/vnd.<namespace>.<identifier>+json`
    pub fn media_type(&self, version: &ApiVersion) -> String {
        format!("application/vnd.{}.{}+json", self.namespace, version.identifier)
    }

    /// A default version always matches. Any other version matches only when
    /// `Accept` (every field line of it) contains its vendor media type verbatim (case-sensitive
    /// substring, no parsing of the header).
    pub fn matches(&self, version: &ApiVersion, req: &Request) -> bool {
        if version.is_default {
            return true;
        }
        req.header_list("accept")
            .is_some_and(|accept| accept.contains(&self.media_type(version)))
    }
}
