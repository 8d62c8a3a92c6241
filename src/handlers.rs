use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        CreateOrganizationRequest, CreatePersonRequest, CreatePublicationRequest, OrganizationDto,
        PersonDto, PublicationDto, RoleAssignmentRequest, UpdateOrganizationRequest,
        UpdatePersonRequest, UpdatePublicationRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

// --- Organizations ---

/// get_organizations
///
/// [Admin Route] Lists all organizations that are not soft-deleted.
#[utoipa::path(
    get,
    path = "/api/organizations",
    responses(
        (status = 200, description = "Organizations", body = [OrganizationDto]),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn get_organizations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationDto>>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.organizations.find_all().await))
}

/// create_organization
///
/// [Authenticated Route] Creates an organization owned by the caller.
#[utoipa::path(
    post,
    path = "/api/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 200, description = "Created", body = OrganizationDto),
        (status = 400, description = "Missing Title")
    )
)]
pub async fn create_organization(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.create(&auth, payload).await?))
}

/// get_organization
///
/// [Authenticated Route] Retrieves one organization by uuid. Soft-deleted
/// records answer 404.
#[utoipa::path(
    get,
    path = "/api/organizations/{uuid}",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Found", body = OrganizationDto),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_organization(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.find(uuid).await?))
}

/// update_organization
///
/// [Authenticated Route] Owner-only partial update.
#[utoipa::path(
    put,
    path = "/api/organizations/{uuid}",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Updated", body = OrganizationDto),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_organization(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.update(&auth, uuid, payload).await?))
}

/// delete_organization
///
/// [Authenticated Route] Owner-only soft delete. The response body mirrors the
/// record's last visible state.
#[utoipa::path(
    delete,
    path = "/api/organizations/{uuid}",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Deleted", body = OrganizationDto),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_organization(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.delete(&auth, uuid).await?))
}

/// get_subscribers
///
/// [Authenticated Route] Lists the persons subscribed to an organization.
#[utoipa::path(
    get,
    path = "/api/organizations/{uuid}/subscribers",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Subscribers", body = [PersonDto]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_subscribers(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<PersonDto>>, ApiError> {
    Ok(Json(state.organizations.subscribers(uuid).await?))
}

/// subscribe
///
/// [Authenticated Route] Subscribes the caller to an organization. A second
/// subscription of the same pair answers 409.
#[utoipa::path(
    post,
    path = "/api/organizations/{uuid}/subscribers",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Subscribed", body = OrganizationDto),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Already Subscribed")
    )
)]
pub async fn subscribe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.subscribe(&auth, uuid).await?))
}

/// unsubscribe
///
/// [Authenticated Route] Removes the caller's subscription; an absent pair
/// answers 404.
#[utoipa::path(
    delete,
    path = "/api/organizations/{uuid}/subscribers",
    params(("uuid" = Uuid, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Unsubscribed", body = OrganizationDto),
        (status = 404, description = "Not Found or Not Subscribed")
    )
)]
pub async fn unsubscribe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<OrganizationDto>, ApiError> {
    Ok(Json(state.organizations.unsubscribe(&auth, uuid).await?))
}

// --- Persons ---

/// get_persons
///
/// [Admin Route] Lists all visible accounts.
#[utoipa::path(
    get,
    path = "/api/persons",
    responses(
        (status = 200, description = "Persons", body = [PersonDto]),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn get_persons(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonDto>>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.persons.find_all().await))
}

/// create_person
///
/// [Public Route] Registration. Creates an account carrying the USER role.
#[utoipa::path(
    post,
    path = "/api/persons",
    request_body = CreatePersonRequest,
    responses(
        (status = 200, description = "Registered", body = PersonDto),
        (status = 400, description = "Missing Credentials"),
        (status = 409, description = "Username Taken")
    )
)]
pub async fn create_person(
    State(state): State<AppState>,
    Json(payload): Json<CreatePersonRequest>,
) -> Result<Json<PersonDto>, ApiError> {
    Ok(Json(state.persons.create_user(payload).await?))
}

/// get_current_person
///
/// [Authenticated Route] Resolves the caller's own account.
#[utoipa::path(
    get,
    path = "/api/persons/current",
    responses(
        (status = 200, description = "Profile", body = PersonDto),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_current_person(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PersonDto>, ApiError> {
    Ok(Json(state.persons.current(&auth).await?))
}

/// get_person
///
/// [Authenticated Route] Retrieves one account by uuid.
#[utoipa::path(
    get,
    path = "/api/persons/{uuid}",
    params(("uuid" = Uuid, Path, description = "Person UUID")),
    responses(
        (status = 200, description = "Found", body = PersonDto),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_person(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<PersonDto>, ApiError> {
    Ok(Json(state.persons.find(uuid).await?))
}

/// update_person
///
/// [Authenticated Route] Self-service profile update; password changes
/// require the current password.
#[utoipa::path(
    put,
    path = "/api/persons/{uuid}",
    params(("uuid" = Uuid, Path, description = "Person UUID")),
    request_body = UpdatePersonRequest,
    responses(
        (status = 200, description = "Updated", body = PersonDto),
        (status = 403, description = "Not Account Holder"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_person(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<UpdatePersonRequest>,
) -> Result<Json<PersonDto>, ApiError> {
    Ok(Json(state.persons.update(&auth, uuid, payload).await?))
}

/// delete_person
///
/// [Authenticated Route] Soft-deletes an account: the holder themselves, or
/// any account when the caller holds ADMIN.
#[utoipa::path(
    delete,
    path = "/api/persons/{uuid}",
    params(("uuid" = Uuid, Path, description = "Person UUID")),
    responses(
        (status = 200, description = "Deleted", body = PersonDto),
        (status = 403, description = "Not Holder or Admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_person(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<PersonDto>, ApiError> {
    Ok(Json(state.persons.delete(&auth, uuid).await?))
}

/// get_person_publications
///
/// [Authenticated Route] Lists the visible publications authored by a person.
#[utoipa::path(
    get,
    path = "/api/persons/{uuid}/publications",
    params(("uuid" = Uuid, Path, description = "Person UUID")),
    responses(
        (status = 200, description = "Publications", body = [PublicationDto]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_person_publications(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<PublicationDto>>, ApiError> {
    Ok(Json(state.persons.publications(uuid).await?))
}

/// add_person_role
///
/// [Admin Route] Grants a catalog role to an account.
#[utoipa::path(
    post,
    path = "/api/persons/{uuid}/roles",
    params(("uuid" = Uuid, Path, description = "Person UUID")),
    request_body = RoleAssignmentRequest,
    responses(
        (status = 200, description = "Granted", body = PersonDto),
        (status = 403, description = "Not Admin"),
        (status = 404, description = "Unknown Person or Role"),
        (status = 409, description = "Already Granted")
    )
)]
pub async fn add_person_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> Result<Json<PersonDto>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::PermissionDenied);
    }
    let role = payload
        .role
        .ok_or(ApiError::MissingRequiredParameters("role"))?;
    Ok(Json(state.persons.add_role(uuid, &role).await?))
}

/// delete_person_role
///
/// [Admin Route] Revokes a catalog role from an account.
#[utoipa::path(
    delete,
    path = "/api/persons/{uuid}/roles/{name}",
    params(
        ("uuid" = Uuid, Path, description = "Person UUID"),
        ("name" = String, Path, description = "Role name")
    ),
    responses(
        (status = 200, description = "Revoked", body = PersonDto),
        (status = 403, description = "Not Admin"),
        (status = 404, description = "Unknown Person, Role or Assignment")
    )
)]
pub async fn delete_person_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((uuid, name)): Path<(Uuid, String)>,
) -> Result<Json<PersonDto>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.persons.remove_role(uuid, &name).await?))
}

// --- Publications ---

/// get_publications
///
/// [Admin Route] Lists all publications that are not soft-deleted.
#[utoipa::path(
    get,
    path = "/api/publications",
    responses(
        (status = 200, description = "Publications", body = [PublicationDto]),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn get_publications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicationDto>>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.publications.find_all().await))
}

/// create_publication
///
/// [Authenticated Route] Creates a publication authored by the caller.
#[utoipa::path(
    post,
    path = "/api/publications",
    request_body = CreatePublicationRequest,
    responses(
        (status = 200, description = "Created", body = PublicationDto),
        (status = 400, description = "Missing Fields")
    )
)]
pub async fn create_publication(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePublicationRequest>,
) -> Result<Json<PublicationDto>, ApiError> {
    Ok(Json(state.publications.create(&auth, payload).await?))
}

/// get_publication
///
/// [Authenticated Route] Retrieves one publication by uuid.
#[utoipa::path(
    get,
    path = "/api/publications/{uuid}",
    params(("uuid" = Uuid, Path, description = "Publication UUID")),
    responses(
        (status = 200, description = "Found", body = PublicationDto),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_publication(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<PublicationDto>, ApiError> {
    Ok(Json(state.publications.find(uuid).await?))
}

/// update_publication
///
/// [Authenticated Route] Author-only partial update.
#[utoipa::path(
    put,
    path = "/api/publications/{uuid}",
    params(("uuid" = Uuid, Path, description = "Publication UUID")),
    request_body = UpdatePublicationRequest,
    responses(
        (status = 200, description = "Updated", body = PublicationDto),
        (status = 403, description = "Not Author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_publication(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<UpdatePublicationRequest>,
) -> Result<Json<PublicationDto>, ApiError> {
    Ok(Json(state.publications.update(&auth, uuid, payload).await?))
}

/// delete_publication
///
/// [Authenticated Route] Author-only soft delete, answering with the last
/// visible state.
#[utoipa::path(
    delete,
    path = "/api/publications/{uuid}",
    params(("uuid" = Uuid, Path, description = "Publication UUID")),
    responses(
        (status = 200, description = "Deleted", body = PublicationDto),
        (status = 403, description = "Not Author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_publication(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<PublicationDto>, ApiError> {
    Ok(Json(state.publications.delete(&auth, uuid).await?))
}
