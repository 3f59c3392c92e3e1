//! HTTP server with graceful shutdown

use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::{Error, Result},
    handlers::{ProblemDetails, RequestContext},
    middleware::{
        apply_security_headers, request_id_layer, request_id_propagation_layer,
        sensitive_headers_layer, traceparent_propagation_layer, JwtAuth,
    },
    routes,
    state::AppState,
};

/// Cache-Control for responses whose handler did not choose a profile
const DEFAULT_CACHE_CONTROL: &str = "no-cache, no-store";

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the catalog service until SIGINT/SIGTERM
    pub async fn serve(self, state: AppState) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config(&state);

        let app = app(state);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn log_middleware_config(&self, state: &AppState) {
        let middleware = &self.config.middleware;
        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: enabled");
        tracing::info!("  - Request ID tracking: enabled");
        tracing::info!("  - Request body limit: {} MB", middleware.body_limit_mb);
        tracing::info!("  - CORS mode: {}", middleware.cors_mode);
        tracing::info!(
            "  - Request timeout: {} seconds",
            self.config.service.timeout_secs
        );
        tracing::info!(
            "  - Security headers: {}",
            security_headers_enabled(&self.config)
        );
        tracing::info!(
            "  - JWT authentication: {}",
            if state.jwt().is_some() { "enabled" } else { "not configured" }
        );
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Catalog routes wrapped in the full middleware stack
pub fn app(state: AppState) -> Router {
    let router = routes::router(state.clone());
    apply_layers(router, &state)
}

/// Wrap `router` in the middleware stack
///
/// Each `layer` call wraps everything added before it, so the list below
/// runs from innermost (closest to the handler) to outermost.
pub fn apply_layers(router: Router, state: &AppState) -> Router {
    let config = state.config();

    let mut app = router;

    if let Some(jwt) = state.jwt() {
        app = app.layer(from_fn_with_state(jwt.clone(), JwtAuth::middleware));
    }

    app = app.layer(SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
    ));

    if security_headers_enabled(config) {
        app = apply_security_headers(app, true);
    }

    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(attach_request_context))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(RequestBodyLimitLayer::new(config.body_limit()))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timeout_response))
                .timeout(config.service.timeout()),
        )
        .layer(CompressionLayer::new())
        .layer(sensitive_headers_layer())
        .layer(traceparent_propagation_layer())
        .layer(request_id_propagation_layer())
        .layer(request_id_layer())
        .layer(build_cors_layer(config))
}

/// Security headers are sent outside development when enabled
fn security_headers_enabled(config: &Config) -> bool {
    config.middleware.security_headers && !config.service.is_development()
}

/// Build CORS layer based on configuration
fn build_cors_layer(config: &Config) -> CorsLayer {
    match config.middleware.cors_mode.as_str() {
        "permissive" => {
            tracing::debug!("Enabling permissive CORS");
            CorsLayer::permissive()
        }
        "restrictive" => {
            let origins: Vec<HeaderValue> = config
                .middleware
                .allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            tracing::debug!("Enabling restrictive CORS for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        "disabled" => {
            tracing::debug!("CORS disabled (using restrictive)");
            CorsLayer::new()
        }
        mode => {
            tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", mode);
            CorsLayer::permissive()
        }
    }
}

/// Message of a panic caught below [`attach_request_context`]
#[derive(Debug, Clone)]
struct HandlerPanic(String);

/// Bare 500 tagged with the panic message
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(HandlerPanic(message));
    response
}

/// Share the request's context with handlers and turn a caught panic into
/// a problem document carrying that request's trace id
async fn attach_request_context(ctx: RequestContext, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(ctx.clone());
    let response = next.run(request).await;

    match response.extensions().get::<HandlerPanic>() {
        Some(HandlerPanic(message)) => ProblemDetails::from_error(
            &Error::Internal(format!("handler panicked: {}", message)),
            &ctx,
        )
        .into_response(),
        None => response,
    }
}

/// Problem document for a request that outran the service timeout
async fn timeout_response(ctx: RequestContext, err: BoxError) -> Response {
    let err = if err.is::<Elapsed>() {
        Error::Timeout(format!("request to {} timed out", ctx.path()))
    } else {
        Error::Internal(format!("unhandled middleware error: {}", err))
    };
    ProblemDetails::from_error(&err, &ctx).into_response()
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}
