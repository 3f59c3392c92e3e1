//! Request id generation, propagation and sensitive-header masking

use axum::http::HeaderName;
use tower_http::{
    propagate_header::PropagateHeaderLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::handlers::TRACEPARENT_HEADER;
use crate::ids::MakeTypedRequestId;

/// Sensitive headers that should be masked in logs
pub const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Create a request ID layer that generates type-safe request IDs
///
/// Example format: `req_01h455vb4pex5vsknk084sn02q`
pub fn request_id_layer() -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::x_request_id(MakeTypedRequestId)
}

/// Echo `x-request-id` on the response
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Echo the W3C `traceparent` header on the response
pub fn traceparent_propagation_layer() -> PropagateHeaderLayer {
    PropagateHeaderLayer::new(HeaderName::from_static(TRACEPARENT_HEADER))
}

/// Mark credentials as sensitive so trace output redacts them
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(
        SENSITIVE_HEADERS
            .iter()
            .map(|h| HeaderName::from_static(h))
            .collect::<Vec<_>>(),
    )
}
