//! Role-gated access for route handlers
//!
//! The JWT middleware only attaches [`Claims`]; whether a route needs them,
//! and at which tier, is declared by taking an [`Authorized<R>`] argument.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use super::token::{Claims, Role};
use crate::handlers::{ProblemDetails, RequestContext};

/// Minimum tier a route requires
pub trait RoleRequirement: Send + Sync + 'static {
    const MINIMUM: Role;
}

/// Any authenticated caller
#[derive(Debug)]
pub struct Authenticated;

/// Moderators and above
#[derive(Debug)]
pub struct ModeratorOrAbove;

/// Administrators and above
#[derive(Debug)]
pub struct AdministratorOrAbove;

/// Super admins only
#[derive(Debug)]
pub struct SuperAdminOnly;

impl RoleRequirement for Authenticated {
    const MINIMUM: Role = Role::Basic;
}

impl RoleRequirement for ModeratorOrAbove {
    const MINIMUM: Role = Role::Moderator;
}

impl RoleRequirement for AdministratorOrAbove {
    const MINIMUM: Role = Role::Administrator;
}

impl RoleRequirement for SuperAdminOnly {
    const MINIMUM: Role = Role::SuperAdmin;
}

/// Claims of a caller that meets requirement `R`
///
/// Rejects with a 401 problem when no verified identity is attached and
/// with a 403 problem when the caller's tier is too low.
#[derive(Debug)]
pub struct Authorized<R: RoleRequirement> {
    pub claims: Claims,
    _requirement: PhantomData<R>,
}

impl<R: RoleRequirement> Authorized<R> {
    /// Check `claims` against the requirement
    pub fn check(claims: Option<&Claims>, ctx: &RequestContext) -> Result<Self, ProblemDetails> {
        let Some(claims) = claims else {
            tracing::warn!(trace_id = %ctx.trace_id(), path = %ctx.path(), "missing bearer token");
            return Err(ProblemDetails::unauthorized(
                "Authentication is required to access this resource.",
                ctx,
            ));
        };

        let tier = claims.tier();
        if tier < R::MINIMUM {
            tracing::warn!(
                trace_id = %ctx.trace_id(),
                sub = %claims.sub,
                %tier,
                required = %R::MINIMUM,
                "insufficient role"
            );
            return Err(ProblemDetails::forbidden(
                format!("The {} role or higher is required.", R::MINIMUM),
                ctx,
            ));
        }

        Ok(Self {
            claims: claims.clone(),
            _requirement: PhantomData,
        })
    }
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = ProblemDetails;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = match RequestContext::from_request_parts(parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };
        Self::check(parts.extensions.get::<Claims>(), &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode, Uri};

    fn ctx() -> RequestContext {
        RequestContext::from_request_head(&HeaderMap::new(), &Uri::from_static("/auth/test/2"))
    }

    fn claims(roles: &[&str]) -> Claims {
        Claims {
            sub: "player1".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 0,
            iat: None,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_missing_claims_is_unauthorized() {
        let problem = Authorized::<Authenticated>::check(None, &ctx()).unwrap_err();
        assert_eq!(problem.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_low_tier_is_forbidden() {
        let basic = claims(&[]);
        let problem = Authorized::<ModeratorOrAbove>::check(Some(&basic), &ctx()).unwrap_err();
        assert_eq!(problem.status_code(), StatusCode::FORBIDDEN);

        let moderator = claims(&["Moderator"]);
        assert!(Authorized::<AdministratorOrAbove>::check(Some(&moderator), &ctx()).is_err());
        assert!(Authorized::<ModeratorOrAbove>::check(Some(&moderator), &ctx()).is_ok());
    }

    #[test]
    fn test_higher_tier_satisfies_lower_requirement() {
        let admin = claims(&["SuperAdmin"]);
        assert!(Authorized::<Authenticated>::check(Some(&admin), &ctx()).is_ok());
        assert!(Authorized::<AdministratorOrAbove>::check(Some(&admin), &ctx()).is_ok());
        assert!(Authorized::<SuperAdminOnly>::check(Some(&admin), &ctx()).is_ok());
    }
}
