use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{AppState, handlers};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/organizations", get(handlers::get_organizations))
        .route("/organizations", post(handlers::create_organization))
        .route("/organizations/{uuid}", get(handlers::get_organization))
        .route("/organizations/{uuid}", put(handlers::update_organization))
        .route(
            "/organizations/{uuid}",
            delete(handlers::delete_organization),
        )
        .route(
            "/organizations/{uuid}/subscribers",
            get(handlers::get_subscribers),
        )
        .route("/organizations/{uuid}/subscribers", post(handlers::subscribe))
        .route(
            "/organizations/{uuid}/subscribers",
            delete(handlers::unsubscribe),
        )
}
