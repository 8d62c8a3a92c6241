mod organizations;
mod persons;
mod publications;

use axum::Router;

use crate::AppState;

/// Assembles the full `/api` surface from the per-resource routers.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(organizations::router())
        .merge(persons::router())
        .merge(publications::router())
}
