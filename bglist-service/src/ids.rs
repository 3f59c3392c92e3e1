//! Correlation identifiers for inbound requests
//!
//! Every request that reaches the service without an upstream `x-request-id`
//! gets one minted here. The id doubles as the `traceId` of problem documents
//! when no W3C `traceparent` header is present.

use http::{HeaderValue, Request};
use mti::prelude::*;
use std::fmt;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Time-sortable request identifier in TypeID form, e.g. `req_01h455vb4pex5vsknk084sn02q`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// Prefix shared by every request id
    pub const PREFIX: &'static str = "req";

    /// Mint a new UUIDv7-backed request id
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0.to_string()
    }
}

/// `MakeRequestId` for tower-http's `SetRequestIdLayer`
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_has_prefix() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        // prefix (3) + underscore (1) + base32 suffix (26)
        assert_eq!(id.as_str().len(), 30);
    }

    #[test]
    fn test_request_ids_are_time_ordered() {
        let first = RequestId::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = RequestId::new();
        assert!(first < second);
    }

    #[test]
    fn test_make_typed_request_id() {
        let mut maker = MakeTypedRequestId;
        let request = Request::builder().body(()).unwrap();

        let id = maker.make_request_id(&request).unwrap();
        let header = id.into_header_value();
        assert!(header.to_str().unwrap().starts_with("req_"));
    }
}
