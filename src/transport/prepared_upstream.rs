use http::header::{HeaderName, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};

use crate::config::{UpstreamConfig, UpstreamFamily};
use crate::error::GatewayError;
use crate::query::QueryParams;

/// Precomputed upstream metadata used by every request to one family.
#[derive(Debug, Clone)]
pub struct PreparedUpstream {
    family: UpstreamFamily,
    base_url: String,
    /// Path component of `base_url`; every endpoint must stay beneath it.
    base_path: String,
    request_headers: HeaderMap,
    relay_headers: Vec<HeaderName>,
}

impl PreparedUpstream {
    /// Build a prepared upstream from configuration.
    #[must_use]
    pub fn new(family: UpstreamFamily, upstream: &UpstreamConfig) -> Self {
        let base_url = upstream.base_url.trim().trim_end_matches('/').to_string();
        let base_path = url::Url::parse(&base_url)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        let request_headers = Self::build_request_headers(family, upstream);
        let relay_headers = upstream
            .relay_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .collect();

        Self {
            family,
            base_url,
            base_path,
            request_headers,
            relay_headers,
        }
    }

    fn build_request_headers(family: UpstreamFamily, upstream: &UpstreamConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(credential) = upstream.auth_header.expose() else {
            return headers;
        };
        match HeaderValue::from_str(credential) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::error!(%family, "credential is not a valid header value; sending requests without it");
            }
        }
        headers
    }

    #[must_use]
    pub fn family(&self) -> UpstreamFamily {
        self.family
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.request_headers.contains_key(AUTHORIZATION)
    }

    /// Headers sent on every upstream call for this family (the credential only).
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// Upstream response headers copied back to the caller when present.
    #[must_use]
    pub fn relay_headers(&self) -> &[HeaderName] {
        &self.relay_headers
    }

    /// Resolve `<base_url><path>?<params>`. `path` must start with `/`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UpstreamUrl`] when the joined URL does not parse
    /// or resolves outside the family's base path.
    pub fn endpoint_url(&self, path: &str, params: &QueryParams) -> Result<url::Url, GatewayError> {
        let mut url = url::Url::parse(&format!("{}{path}", self.base_url)).map_err(|err| {
            GatewayError::UpstreamUrl(format!("{} upstream path '{path}': {err}", self.family))
        })?;
        let within_base = url
            .path()
            .strip_prefix(self.base_path.as_str())
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'));
        if !within_base {
            return Err(GatewayError::UpstreamUrl(format!(
                "{} upstream path '{path}' escapes {}",
                self.family, self.base_path
            )));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }
}
