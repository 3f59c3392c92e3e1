//! Response envelope and cache profiles
//!
//! Every catalog endpoint answers with a [`RestDto`]: the data, the paging
//! metadata that produced it and exactly one `self` link.

use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;

use super::context::RequestContext;

/// Navigation link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDto {
    pub href: String,
    pub rel: String,
    pub method: String,
}

impl LinkDto {
    pub fn new(href: impl Into<String>, rel: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            method: method.into(),
        }
    }

    /// Link that reproduces the current request
    pub fn self_link(ctx: &RequestContext, method: &Method, pairs: &[(String, String)]) -> Self {
        Self::new(ctx.url_with_query(pairs), "self", method.as_str())
    }
}

/// Uniform response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestDto<D> {
    pub data: D,
    pub page_index: Option<u32>,
    pub page_size: Option<u32>,
    pub record_count: Option<u64>,
    pub links: Vec<LinkDto>,
}

impl<D> RestDto<D> {
    /// One page of a list query
    pub fn page(data: D, page_index: u32, page_size: u32, record_count: u64, link: LinkDto) -> Self {
        Self {
            data,
            page_index: Some(page_index),
            page_size: Some(page_size),
            record_count: Some(record_count),
            links: vec![link],
        }
    }

    /// Result of a write or delete; paging metadata is left empty
    pub fn write(data: D, link: LinkDto) -> Self {
        Self {
            data,
            page_index: None,
            page_size: None,
            record_count: None,
            links: vec![link],
        }
    }
}

impl<T> RestDto<Option<T>> {
    /// Single-record lookup: page 0 of size 1 holding zero or one record
    pub fn single(data: Option<T>, link: LinkDto) -> Self {
        let record_count = u64::from(data.is_some());
        Self {
            data,
            page_index: Some(0),
            page_size: Some(1),
            record_count: Some(record_count),
            links: vec![link],
        }
    }
}

impl<D: Serialize> IntoResponse for RestDto<D> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Flatten the top-level fields of a serializable value into query pairs
///
/// Null fields are skipped; strings are used verbatim and any other value
/// in its JSON form.
pub fn query_pairs<S: Serialize>(value: &S) -> Vec<(String, String)> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Named `Cache-Control` policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheProfile {
    /// Shared caches may keep the response for 60 seconds
    Any60,
    /// Only the client may keep the response, for 120 seconds
    Client120,
    /// Never store
    NoCache,
}

impl CacheProfile {
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::Any60 => "public,max-age=60",
            Self::Client120 => "private,max-age=120",
            Self::NoCache => "no-store",
        }
    }
}

impl IntoResponseParts for CacheProfile {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(self.header_value()),
        );
        Ok(res)
    }
}
