//! `/BoardGames` endpoints
//!
//! Validation failures use the default 400 mapping. List pages and single
//! lookups are cached in the process-local tier.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::Method,
    routing::get,
    Router,
};

use super::{delete_records, list_page, update_record};
use crate::catalog::{BoardGame, BoardGameDto, UpdateDto};
use crate::handlers::{
    decode_body, CacheProfile, DeleteParams, LinkDto, ProblemDetails, RequestContext, RequestDto,
    RequestParams, RestDto, ResultExt,
};
use crate::middleware::{AdministratorOrAbove, Authorized, ModeratorOrAbove};
use crate::state::AppState;
use crate::validation::ValidationErrors;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/BoardGames", get(list).post(update).delete(remove))
        .route("/BoardGames/{id}", get(find))
}

/// Cache key of a single-record lookup
fn lookup_key(id: i32) -> String {
    format!("GetBoardGame-{}", id)
}

async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<RequestParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Vec<BoardGame>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Get method started");

    let request = RequestDto::<BoardGameDto>::from_query(params)
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = list_page(
        state.catalog().board_games.as_ref(),
        Some(state.board_game_cache()),
        request,
        &ctx,
    )
    .await?;

    Ok((CacheProfile::Any60, body))
}

async fn find(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<i32>, PathRejection>,
) -> Result<(CacheProfile, RestDto<Option<BoardGame>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "GetBoardGame method started");

    let Path(id) = id.map_err(|rejection| {
        ProblemDetails::validation(ValidationErrors::single("id", rejection.body_text()), &ctx)
    })?;

    let cache = state.board_game_cache();
    let key = lookup_key(id);
    let record = match cache.get::<Option<BoardGame>>(&key).await.or_problem(&ctx)? {
        Some(cached) => cached,
        None => {
            let record = state
                .catalog()
                .board_games
                .find_by_id(id)
                .await
                .or_problem(&ctx)?;
            cache.set(&key, &record).await.or_problem(&ctx)?;
            record
        }
    };

    let link = LinkDto::self_link(&ctx, &Method::GET, &[]);
    Ok((CacheProfile::Any60, RestDto::single(record, link)))
}

async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<ModeratorOrAbove>,
    body: Bytes,
) -> Result<(CacheProfile, RestDto<Option<BoardGame>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Post method started");

    let dto = decode_body::<BoardGameDto>(&body)
        .and_then(|dto| dto.validate().map(|()| dto))
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = update_record(state.catalog().board_games.as_ref(), dto, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}

async fn remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    _auth: Authorized<AdministratorOrAbove>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<(CacheProfile, RestDto<Option<Vec<BoardGame>>>), ProblemDetails> {
    tracing::info!(trace_id = %ctx.trace_id(), "Delete method started");

    let ids = DeleteParams::from_query(params)
        .map_err(|errors| ProblemDetails::validation(errors, &ctx))?;
    let body = delete_records(state.catalog().board_games.as_ref(), &ids, &ctx).await?;

    Ok((CacheProfile::NoCache, body))
}
