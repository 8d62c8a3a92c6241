use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// Per-resource route tables, nested under /api.
pub mod routes;

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use service::{OrganizationService, PersonService, PublicationService, RoleService};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_organizations, handlers::create_organization, handlers::get_organization,
        handlers::update_organization, handlers::delete_organization, handlers::get_subscribers,
        handlers::subscribe, handlers::unsubscribe,
        handlers::get_persons, handlers::create_person, handlers::get_current_person,
        handlers::get_person, handlers::update_person, handlers::delete_person,
        handlers::get_person_publications, handlers::add_person_role, handlers::delete_person_role,
        handlers::get_publications, handlers::create_publication, handlers::get_publication,
        handlers::update_publication, handlers::delete_publication
    ),
    components(
        schemas(
            models::OrganizationDto, models::CreateOrganizationRequest,
            models::UpdateOrganizationRequest, models::PersonDto, models::CreatePersonRequest,
            models::UpdatePersonRequest, models::RoleAssignmentRequest, models::Sex,
            models::PublicationDto, models::CreatePublicationRequest,
            models::UpdatePublicationRequest,
        )
    ),
    tags(
        (name = "jobfinder", description = "Job Finder API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding the repository, the
/// domain services built on top of it, and the loaded configuration. Shared
/// across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    pub organizations: OrganizationService,
    pub persons: PersonService,
    pub publications: PublicationService,
    pub roles: RoleService,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the service layer around a repository.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let roles = RoleService::new(repo.clone());
        Self {
            organizations: OrganizationService::new(repo.clone()),
            persons: PersonService::new(repo.clone(), roles.clone()),
            publications: PublicationService::new(repo.clone()),
            roles,
            repo,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These allow extractors to selectively pull components from the shared
// AppState. The AuthUser extractor only needs the repository.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// bootstrap_admin
///
/// Ensures the configured administrator account exists on startup. Safe to
/// call on every boot: once the username is taken nothing happens.
pub async fn bootstrap_admin(state: &AppState) {
    if state.repo.person_exists(&state.config.admin_username).await {
        return;
    }
    let request = models::CreatePersonRequest {
        username: Some(state.config.admin_username.clone()),
        password: Some(state.config.admin_password.clone()),
        first_name: None,
        last_name: None,
        sex: None,
        country: None,
    };
    match state.persons.create_admin(request).await {
        Ok(admin) => tracing::info!("Bootstrapped administrator account {}", admin.username),
        Err(err) => tracing::error!("Failed to bootstrap administrator account: {err}"),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Authorization is enforced per handler: the AuthUser extractor
        // rejects unauthenticated calls, and admin-only handlers check the
        // resolved role set themselves.
        .nest("/api", routes::api_router())
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in
                // a span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span: pulls the `x-request-id` header (if
/// present) into the structured logging metadata alongside method and URI, so
/// every log line of a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
