//! HTTP routes of the catalog service
//!
//! Each resource module wires its endpoints to the shared pipeline helpers
//! below, choosing the validation mapping, cache tier and cache profile
//! that resource uses.

mod board_games;
mod domains;
mod mechanics;
mod probes;

use axum::{http::Method, routing::get, Router};
use chrono::Utc;

use crate::cache::CacheGate;
use crate::catalog::{Resource, UpdateDto};
use crate::handlers::{
    query_pairs, LinkDto, ProblemDetails, QueryExecutor, RequestContext, RequestDto, RestDto,
    ResultExt,
};
use crate::health::health;
use crate::repository::CatalogRepository;
use crate::state::AppState;

/// Message shared by the "You are authorized" probes and the wire tests
pub const AUTHORIZED_MESSAGE: &str = "You are authorized!";

/// All routes, bound to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(board_games::routes())
        .merge(domains::routes())
        .merge(mechanics::routes())
        .merge(probes::routes())
        .with_state(state)
}

/// Count, read (through `cache` when given) and wrap one page
pub(crate) async fn list_page<R: Resource>(
    repository: &dyn CatalogRepository<R>,
    cache: Option<&CacheGate>,
    request: RequestDto<R::Schema>,
    ctx: &RequestContext,
) -> Result<RestDto<Vec<R>>, ProblemDetails> {
    let mut executor = QueryExecutor::new(repository);
    if let Some(cache) = cache {
        executor = executor.with_cache(cache);
    }
    let page = executor.execute(&request).await.or_problem(ctx)?;

    let link = LinkDto::self_link(ctx, &Method::GET, &request.link_pairs());
    Ok(RestDto::page(
        page.items,
        request.page_index,
        request.page_size,
        page.record_count,
        link,
    ))
}

/// Apply a validated update body to the record it targets
///
/// A missing record is not an error: the envelope carries `data: null`.
pub(crate) async fn update_record<R, D>(
    repository: &dyn CatalogRepository<R>,
    dto: D,
    ctx: &RequestContext,
) -> Result<RestDto<Option<R>>, ProblemDetails>
where
    R: Resource,
    D: UpdateDto<R>,
{
    let record = match repository.find_by_id(dto.target_id()).await.or_problem(ctx)? {
        Some(mut record) => {
            dto.apply_to(&mut record, Utc::now());
            repository.update(&record).await.or_problem(ctx)?;
            tracing::info!(table = R::TABLE, id = record.id(), "record updated");
            Some(record)
        }
        None => None,
    };

    let link = LinkDto::self_link(ctx, &Method::POST, &query_pairs(&dto));
    Ok(RestDto::write(record, link))
}

/// Delete each id in turn, one lookup and one delete per id
///
/// Ids that match nothing are skipped. A failure stops the loop; deletions
/// already made stay committed.
pub(crate) async fn delete_records<R: Resource>(
    repository: &dyn CatalogRepository<R>,
    ids: &[i32],
    ctx: &RequestContext,
) -> Result<RestDto<Option<Vec<R>>>, ProblemDetails> {
    let mut deleted = Vec::new();
    for &id in ids {
        let Some(record) = repository.find_by_id(id).await.or_problem(ctx)? else {
            continue;
        };
        if repository.delete(id).await.or_problem(ctx)? {
            deleted.push(record);
        }
    }

    tracing::info!(
        table = R::TABLE,
        requested = ids.len(),
        deleted = deleted.len(),
        "records deleted"
    );

    let ids_param = ids
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let link = LinkDto::self_link(ctx, &Method::DELETE, &[("ids".to_string(), ids_param)]);
    Ok(RestDto::write((!deleted.is_empty()).then_some(deleted), link))
}


#[cfg(test)]
pub(crate) mod test_support {
    //! Router fixtures shared by the route tests

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::catalog::{BoardGame, Domain, Mechanic};
    use crate::config::{Config, JwtConfig};
    use crate::middleware::Claims;
    use crate::server::app;
    use crate::state::{AppState, Catalog};

    pub const SECRET: &str = "route-test-secret";

    pub fn board_games() -> Vec<BoardGame> {
        let mut games = vec![
            BoardGame::new(1, "Wargames"),
            BoardGame::new(2, "Starwar"),
            BoardGame::new(3, "Carcassonne"),
            BoardGame::new(4, "War of the Ring"),
            BoardGame::new(5, "Azul"),
        ];
        for (game, year) in games.iter_mut().zip([1983, 1999, 2000, 2004, 2017]) {
            game.year = year;
        }
        games
    }

    pub fn domains() -> Vec<Domain> {
        vec![
            Domain::new(1, "Abstract Games"),
            Domain::new(2, "Family Games"),
            Domain::new(3, "Wargames"),
            Domain::new(4, "Strategy Games"),
        ]
    }

    pub fn mechanics() -> Vec<Mechanic> {
        vec![
            Mechanic::new(1, "Wargame Movement"),
            Mechanic::new(2, "Starwar Trading"),
            Mechanic::new(3, "Dice Rolling"),
        ]
    }

    pub async fn test_app() -> Router {
        app_with_catalog(Catalog::from_records(board_games(), domains(), mechanics())).await
    }

    pub async fn app_with_catalog(catalog: Catalog) -> Router {
        let mut config = Config::default();
        config.jwt = Some(JwtConfig {
            signing_key: Some(SECRET.to_string()),
            public_key_path: None,
            algorithm: "HS256".to_string(),
            issuer: None,
            audience: None,
        });

        let state = AppState::builder()
            .config(config)
            .catalog(catalog)
            .build()
            .await
            .unwrap();
        app(state)
    }

    pub fn token(roles: &[&str]) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: None,
            iss: None,
            aud: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: axum::http::HeaderMap,
        pub body: Value,
    }

    pub async fn send(
        app: Router,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(app: Router, uri: &str) -> TestResponse {
        send(app, Method::GET, uri, None, None).await
    }

    /// Names in the `data` array of an envelope
    pub fn names(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
