use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{AppState, handlers};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/publications", get(handlers::get_publications))
        .route("/publications", post(handlers::create_publication))
        .route("/publications/{uuid}", get(handlers::get_publication))
        .route("/publications/{uuid}", put(handlers::update_publication))
        .route("/publications/{uuid}", delete(handlers::delete_publication))
}
