//! Per-request context passed explicitly into validation and response code

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Uri},
};
use std::convert::Infallible;
use url::{form_urlencoded, Url};

use crate::ids::RequestId;

/// W3C trace context header
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Correlation id header set by the request-id layer
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity of the current request: trace id and the URL it arrived on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    trace_id: String,
    base_url: String,
    path: String,
}

impl RequestContext {
    /// Build the context from request headers and URI
    ///
    /// The trace id is the `traceparent` header when it is well formed,
    /// otherwise the `x-request-id` correlation id, otherwise a fresh id.
    pub fn from_request_head(headers: &HeaderMap, uri: &Uri) -> Self {
        let trace_id = header_str(headers, TRACEPARENT_HEADER)
            .filter(|value| is_traceparent(value))
            .or_else(|| header_str(headers, REQUEST_ID_HEADER))
            .map(str::to_string)
            .unwrap_or_else(|| RequestId::new().into());

        let scheme = header_str(headers, "x-forwarded-proto")
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");
        let host = header_str(headers, "x-forwarded-host")
            .or_else(|| header_str(headers, header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");

        Self {
            trace_id,
            base_url: format!("{}://{}", scheme, host),
            path: uri.path().to_string(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute URL of the current path with `pairs` as its query string
    pub fn url_with_query(&self, pairs: &[(String, String)]) -> String {
        match Url::parse(&self.base_url).and_then(|base| base.join(&self.path)) {
            Ok(mut url) => {
                url.set_query(None);
                if !pairs.is_empty() {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
                url.into()
            }
            Err(_) => {
                if pairs.is_empty() {
                    return self.path.clone();
                }
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                format!("{}?{}", self.path, query)
            }
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// `version-traceid-parentid-flags`, all lowercase hex
fn is_traceparent(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 4
        && [2, 32, 16, 2]
            .iter()
            .zip(&parts)
            .all(|(len, part)| part.len() == *len && part.bytes().all(|b| b.is_ascii_hexdigit()))
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        Ok(Self::from_request_head(&parts.headers, &parts.uri))
    }
}
