//! `/Domains` endpoints
//!
//! Reads and writes run their validation failures through a
//! [`ValidationGate`]; pages are never cached.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};

use super::{delete_records, list_page, update_record};
use crate::catalog::{Domain, DomainDto, UpdateDto};
use crate::handlers::{
    decode_body, CacheProfile, DeleteParams, ProblemDetails, RequestContext, RequestDto,
    RequestParams, RestDto, ValidationGate,
};
use crate::middleware::{AdministratorOrAbove, Authorized, ModeratorOrAbove};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/Domains", get(list).post(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<RequestParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Vec<Domain>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Get method started");

    let request = ValidationGate::Read.check(RequestDto::<DomainDto>::from_query(params), &ctx)?;
    let body = list_page(state.catalog().domains.as_ref(), None, request, &ctx).await?;

    Ok((CacheProfile::Any60, body))
}

async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<ModeratorOrAbove>,
    body: Bytes,
) -> Result<(CacheProfile, RestDto<Option<Domain>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Post method started");

    let dto = decode_body::<DomainDto>(&body).and_then(|dto| dto.validate().map(|()| dto));
    let dto = ValidationGate::Write.check(dto, &ctx)?;
    let body = update_record(state.catalog().domains.as_ref(), dto, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}

async fn remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<AdministratorOrAbove>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Option<Vec<Domain>>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Delete method started");

    let ids = ValidationGate::Write.check(DeleteParams::from_query(params), &ctx)?;
    let body = delete_records(state.catalog().domains.as_ref(), &ids, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}
