// Library exports for linkfeed
// This allows integration tests and external code to use linkfeed modules

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod session;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::auth::login_page))
        .route("/signup", get(routes::auth::signup_page))
        .route("/home", get(routes::home::index))
        .route("/assets/{*path}", get(routes::assets::serve))
        .merge(routes::auth::router())
        .merge(routes::profile::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
