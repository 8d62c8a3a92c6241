use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{AppState, handlers};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/persons", get(handlers::get_persons))
        .route("/persons", post(handlers::create_person))
        .route("/persons/current", get(handlers::get_current_person))
        .route("/persons/{uuid}", get(handlers::get_person))
        .route("/persons/{uuid}", put(handlers::update_person))
        .route("/persons/{uuid}", delete(handlers::delete_person))
        .route(
            "/persons/{uuid}/publications",
            get(handlers::get_person_publications),
        )
        .route("/persons/{uuid}/roles", post(handlers::add_person_role))
        .route(
            "/persons/{uuid}/roles/{name}",
            delete(handlers::delete_person_role),
        )
}
