//! Request pipeline building blocks shared by the catalog routes
//!
//! A list request flows through these pieces in order:
//!
//! 1. [`RequestDto::bind`] turns raw [`RequestParams`] into a validated,
//!    typed request (or a [`ValidationErrors`](crate::validation::ValidationErrors) map)
//! 2. a [`ValidationGate`] (or the default 400 mapping) turns failures into a
//!    [`ProblemDetails`] document carrying the [`RequestContext`] trace id
//! 3. [`QueryExecutor`] counts, then reads the page through an optional
//!    [`CacheGate`](crate::cache::CacheGate)
//! 4. [`RestDto`] wraps the page with its paging metadata and `self` link

mod context;
mod executor;
mod problem;
mod query;
mod response;

pub use context::{RequestContext, REQUEST_ID_HEADER, TRACEPARENT_HEADER};
pub use executor::QueryExecutor;
pub use problem::{
    problem_types, ProblemDetails, ResultExt, ValidationGate, PROBLEM_JSON, VALIDATION_TITLE,
};
pub use query::{
    decode_body, DeleteParams, RequestDto, RequestParams, BODY_ERROR_KEY, DEFAULT_PAGE_INDEX,
    DEFAULT_PAGE_SIZE, DEFAULT_SORT_COLUMN, DEFAULT_SORT_ORDER, MAX_PAGE_SIZE,
};
pub use response::{query_pairs, CacheProfile, LinkDto, RestDto};
