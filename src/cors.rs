//! Cross-origin access policy
//!
//! Browsers from an explicit allow-list of frontend origins, or from any origin
//! matching a wildcard subdomain pattern such as `*.vercel.app`, get their
//! origin reflected back with credentials allowed.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Which browser origins may call the API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    exact: Vec<String>,
    /// Stored without the leading `*`, e.g. `.vercel.app`
    suffixes: Vec<String>,
}

impl OriginPolicy {
    /// Builds a policy from exact origins and `*.domain` patterns
    ///
    /// Patterns must already be validated to start with `*.`; anything else is
    /// treated as an exact origin.
    pub fn new<E, P>(exact: E, patterns: P) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut policy = Self {
            exact: exact.into_iter().map(Into::into).collect(),
            suffixes: Vec::new(),
        };
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match pattern.strip_prefix('*') {
                Some(suffix) if suffix.starts_with('.') => policy.suffixes.push(suffix.to_string()),
                _ => policy.exact.push(pattern.to_string()),
            }
        }
        policy
    }

    /// Whether a request `Origin` header value is allowed
    pub fn allows(&self, origin: &str) -> bool {
        if self.exact.iter().any(|allowed| allowed == origin) {
            return true;
        }
        self.suffixes.iter().any(|suffix| {
            origin
                .strip_suffix(suffix.as_str())
                .is_some_and(|rest| !rest.is_empty() && !rest.ends_with("://"))
        })
    }

    /// Converts the policy into a CORS layer that reflects allowed origins
    pub fn into_layer(self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
                origin.to_str().is_ok_and(|origin| self.allows(origin))
            }))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }
}
