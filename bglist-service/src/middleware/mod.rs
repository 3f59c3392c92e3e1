//! Middleware for authentication, authorization and request tracking

pub mod authorize;
pub mod jwt;
pub mod request_tracking;
pub mod security_headers;
pub mod token;

pub use authorize::{
    AdministratorOrAbove, Authenticated, Authorized, ModeratorOrAbove, RoleRequirement,
    SuperAdminOnly,
};
pub use jwt::JwtAuth;
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    traceparent_propagation_layer, SENSITIVE_HEADERS,
};
pub use security_headers::{apply_security_headers, CONTENT_SECURITY_POLICY, SCRIPT_NONCE};
pub use token::{extract_token, Claims, Role, TokenValidator};
