//! Problem documents and the validation-to-status gate
//!
//! Every error response is a [`ProblemDetails`] body
//! (`application/problem+json`) carrying the request's trace id. Validation
//! failures become 400 by default; resources that need a finer mapping run
//! their failures through a [`ValidationGate`].

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::context::RequestContext;
use crate::error::Error;
use crate::validation::ValidationErrors;

/// Content type of problem documents
pub const PROBLEM_JSON: &str = "application/problem+json";

/// Category URIs for the `type` member
pub mod problem_types {
    pub const BAD_REQUEST: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.1";
    pub const UNAUTHORIZED: &str = "https://tools.ietf.org/html/rfc7235#section-3.1";
    pub const FORBIDDEN: &str = "https://datatracker.ietf.org/doc/html/rfc7231#section-6.5.3";
    pub const INTERNAL_SERVER_ERROR: &str = "https://tools.ietf.org/html/rfc7231#section-6.6.1";
    pub const NOT_IMPLEMENTED: &str = "https://tools.ietf.org/html/rfc7231#section-6.6.2";
    pub const GATEWAY_TIMEOUT: &str = "https://tools.ietf.org/html/rfc7231#section-6.6.5";
}

/// Title of every validation problem
pub const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

/// Structured error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl ProblemDetails {
    pub fn new(
        status: StatusCode,
        type_uri: &str,
        title: impl Into<String>,
        ctx: &RequestContext,
    ) -> Self {
        Self {
            type_uri: type_uri.to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            trace_id: ctx.trace_id().to_string(),
            errors: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Default validation rejection (400)
    pub fn validation(errors: ValidationErrors, ctx: &RequestContext) -> Self {
        Self::validation_with_status(
            StatusCode::BAD_REQUEST,
            problem_types::BAD_REQUEST,
            errors,
            ctx,
        )
    }

    /// Validation problem with an explicit status and category
    pub fn validation_with_status(
        status: StatusCode,
        type_uri: &str,
        errors: ValidationErrors,
        ctx: &RequestContext,
    ) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(status, type_uri, VALIDATION_TITLE, ctx)
        }
    }

    pub fn unauthorized(detail: impl Into<String>, ctx: &RequestContext) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            problem_types::UNAUTHORIZED,
            "Unauthorized",
            ctx,
        )
        .with_detail(detail)
    }

    pub fn forbidden(detail: impl Into<String>, ctx: &RequestContext) -> Self {
        Self::new(StatusCode::FORBIDDEN, problem_types::FORBIDDEN, "Forbidden", ctx)
            .with_detail(detail)
    }

    /// Map a runtime failure onto 401/403/501/504/500 and log it
    ///
    /// Only [`Error::public_message`] reaches the client.
    pub fn from_error(err: &Error, ctx: &RequestContext) -> Self {
        let status = err.status_code();
        let (type_uri, title) = match status {
            StatusCode::UNAUTHORIZED => (problem_types::UNAUTHORIZED, "Unauthorized"),
            StatusCode::FORBIDDEN => (problem_types::FORBIDDEN, "Forbidden"),
            StatusCode::NOT_IMPLEMENTED => (problem_types::NOT_IMPLEMENTED, "Not Implemented"),
            StatusCode::GATEWAY_TIMEOUT => (problem_types::GATEWAY_TIMEOUT, "Gateway Timeout"),
            _ => (
                problem_types::INTERNAL_SERVER_ERROR,
                "An error occurred while processing your request.",
            ),
        };

        if status.is_server_error() {
            tracing::error!(trace_id = %ctx.trace_id(), status = status.as_u16(), error = %err, "request failed");
        } else {
            tracing::warn!(trace_id = %ctx.trace_id(), status = status.as_u16(), error = %err, "request rejected");
        }

        Self::new(status, type_uri, title, ctx).with_detail(err.public_message())
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
            Json(self),
        )
            .into_response()
    }
}

/// Attach a request context to fallible results
pub trait ResultExt<T> {
    /// Turn the error side into a logged [`ProblemDetails`]
    fn or_problem(self, ctx: &RequestContext) -> Result<T, ProblemDetails>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn or_problem(self, ctx: &RequestContext) -> Result<T, ProblemDetails> {
        self.map_err(|e| ProblemDetails::from_error(&e.into(), ctx))
    }
}

/// Resource-specific mapping of validation failures to HTTP statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationGate {
    /// List reads: a `pageSize` failure is reported as 501
    Read,
    /// Writes: an `id` or `name` failure is reported as 403
    Write,
}

impl ValidationGate {
    /// Problem document for a failed validation
    pub fn problem(self, errors: ValidationErrors, ctx: &RequestContext) -> ProblemDetails {
        match self {
            Self::Read if errors.contains("pageSize") => ProblemDetails::validation_with_status(
                StatusCode::NOT_IMPLEMENTED,
                problem_types::NOT_IMPLEMENTED,
                errors,
                ctx,
            ),
            Self::Write if errors.contains("id") || errors.contains("name") => {
                ProblemDetails::validation_with_status(
                    StatusCode::FORBIDDEN,
                    problem_types::FORBIDDEN,
                    errors,
                    ctx,
                )
            }
            _ => ProblemDetails::validation(errors, ctx),
        }
    }

    /// Pass a valid value through, or short-circuit with the mapped problem
    pub fn check<T>(
        self,
        result: Result<T, ValidationErrors>,
        ctx: &RequestContext,
    ) -> Result<T, ProblemDetails> {
        result.map_err(|errors| {
            tracing::debug!(trace_id = %ctx.trace_id(), gate = ?self, ?errors, "validation failed");
            self.problem(errors, ctx)
        })
    }
}
