// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{evaluate, health, practice},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Rate-limits the routes that execute caller-supplied SQL.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (evaluator, practice database, config).
///
/// The rate limiter keys on the peer address, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    // Both routes execute caller-supplied SQL.
    let mut sql_routes: Router<AppState> = Router::new()
        .route("/api/evaluate", post(evaluate::evaluate))
        .route("/api/practice/fingerprint", post(practice::fingerprint_query));

    if state.config.rate_limit_replenish_secs > 0 {
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(state.config.rate_limit_replenish_secs)
            .burst_size(state.config.rate_limit_burst.max(1))
            .finish();

        match governor_conf {
            Some(conf) => {
                sql_routes = sql_routes.layer(GovernorLayer::new(Arc::new(conf)));
            }
            None => tracing::warn!("Invalid rate limit settings; SQL routes are not rate limited"),
        }
    }

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/practice/schema", get(practice::get_schema))
        .merge(sql_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
