//! `/Mechanics` endpoints
//!
//! Names are filtered by substring, and list pages go through the
//! distributed cache tier.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};

use super::{delete_records, list_page, update_record};
use crate::catalog::{Mechanic, MechanicDto, UpdateDto};
use crate::handlers::{
    decode_body, CacheProfile, DeleteParams, ProblemDetails, RequestContext, RequestDto,
    RequestParams, RestDto,
};
use crate::middleware::{AdministratorOrAbove, Authorized, ModeratorOrAbove};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/Mechanics", get(list).post(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<RequestParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Vec<Mechanic>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Get method started");

    let request = RequestDto::<MechanicDto>::from_query(params)
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = list_page(
        state.catalog().mechanics.as_ref(),
        Some(state.mechanic_cache()),
        request,
        &ctx,
    )
    .await?;

    Ok((CacheProfile::Client120, body))
}

async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<ModeratorOrAbove>,
    body: Bytes,
) -> Result<(CacheProfile, RestDto<Option<Mechanic>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Post method started");

    let dto = decode_body::<MechanicDto>(&body)
        .and_then(|dto| dto.validate().map(|()| dto))
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = update_record(state.catalog().mechanics.as_ref(), dto, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}

async fn remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<AdministratorOrAbove>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Option<Vec<Mechanic>>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Delete method started");

    let ids = DeleteParams::from_query(params)
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = delete_records(state.catalog().mechanics.as_ref(), &ids, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}
