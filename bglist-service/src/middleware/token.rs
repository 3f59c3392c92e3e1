//! Bearer token claims and extraction

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Role tiers, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Basic,
    Moderator,
    Administrator,
    SuperAdmin,
}

impl Role {
    /// Parse a role claim value (exact match)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Basic" => Some(Self::Basic),
            "Moderator" => Some(Self::Moderator),
            "Administrator" => Some(Self::Administrator),
            "SuperAdmin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Moderator => "Moderator",
            Self::Administrator => "Administrator",
            Self::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for authenticated requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user name or id)
    pub sub: String,

    /// Role names held by the subject
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Highest tier held; every authenticated caller is at least `Basic`
    ///
    /// Unknown role names are ignored.
    pub fn tier(&self) -> Role {
        self.roles
            .iter()
            .filter_map(|name| Role::from_name(name))
            .max()
            .unwrap_or(Role::Basic)
    }
}

/// Token validator trait
pub trait TokenValidator: Send + Sync + Clone {
    /// Validate a token and extract claims
    fn validate_token(&self, token: &str) -> Result<Claims, Error>;
}

/// Extract a bearer token from the Authorization header
///
/// `Ok(None)` when the header is absent; a header with another scheme is an
/// error.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, Error> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| Error::Unauthorized("Invalid Authorization header".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(Error::Unauthorized(
            "Invalid Authorization header format".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn claims(roles: &[&str]) -> Claims {
        Claims {
            sub: "player1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 0,
            iat: None,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_roles_are_ordered() {
        assert!(Role::Basic < Role::Moderator);
        assert!(Role::Moderator < Role::Administrator);
        assert!(Role::Administrator < Role::SuperAdmin);
    }

    #[test]
    fn test_tier_is_highest_role() {
        assert_eq!(claims(&[]).tier(), Role::Basic);
        assert_eq!(claims(&["Moderator"]).tier(), Role::Moderator);
        assert_eq!(
            claims(&["Moderator", "SuperAdmin", "Administrator"]).tier(),
            Role::SuperAdmin
        );
        assert_eq!(claims(&["moderator", "Wizard"]).tier(), Role::Basic);
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers).unwrap(), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).unwrap().as_deref(), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(extract_token(&headers), Err(Error::Unauthorized(_))));
    }
}
