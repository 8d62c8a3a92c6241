use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Persistence Entities ---

/// Organization
///
/// A record from the `organizations` table. The subscriber set lives in the
/// `organization_subscribers` join table and is loaded alongside the row.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Organization {
    pub uuid: Uuid,
    // Owner of the record; only this principal may update or delete it.
    pub creator_uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub subscribers: HashSet<Uuid>,
}

/// Person
///
/// The canonical account record from the `persons` table. `password` holds the
/// argon2 hash, never the plaintext. Role names and organization subscriptions
/// come from their join tables.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Person {
    pub uuid: Uuid,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<Sex>,
    pub country: Option<String>,
    pub deleted: bool,
    pub locked: bool,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub roles: HashSet<String>,
    #[sqlx(skip)]
    pub subscriptions: HashSet<Uuid>,
}

/// Publication
///
/// A record from the `publications` table, owned by its author.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Publication {
    pub uuid: Uuid,
    pub author_uuid: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub visible: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Role
///
/// A named privilege from the fixed role catalog, with its member set loaded
/// from the `person_roles` join table.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Role {
    pub name: String,
    #[sqlx(skip)]
    pub members: HashSet<Uuid>,
}

/// Sex
///
/// Stored as the `sex` Postgres enum, serialized as "MALE"/"FEMALE".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "sex", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

// --- Transport DTOs (Output Schemas) ---

/// OrganizationDto
///
/// The external representation of an Organization. The subscriber set is
/// exposed only as a count; the deleted flag never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct OrganizationDto {
    pub uuid: Uuid,
    pub creator_uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subscribers_count: usize,
}

/// PersonDto
///
/// The external representation of a Person. `password` and `old_password` are
/// input-only: they deserialize from request bodies but are never serialized
/// back, so a credential can not leak through a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct PersonDto {
    pub uuid: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    #[serde(skip_serializing, default)]
    pub old_password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<Sex>,
    pub country: Option<String>,
    pub roles: Vec<String>,
}

/// PublicationDto
///
/// The external representation of a Publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct PublicationDto {
    pub uuid: Uuid,
    pub author_uuid: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub visible: bool,
}

// --- Request Payloads (Input Schemas) ---

/// CreateOrganizationRequest
///
/// Input payload for POST /api/organizations. `title` is mandatory; the
/// service rejects its absence with a missing-required-parameters error
/// rather than letting deserialization fail with an opaque 422.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateOrganizationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// UpdateOrganizationRequest
///
/// Partial update payload: only provided fields overwrite the record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateOrganizationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreatePersonRequest
///
/// Input payload for the registration endpoint (POST /api/persons).
/// `username` and `password` are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePersonRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<Sex>,
    pub country: Option<String>,
}

/// UpdatePersonRequest
///
/// Partial update payload for PUT /api/persons/{uuid}. Changing the password
/// requires `old_password` to verify against the stored hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePersonRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// RoleAssignmentRequest
///
/// Input payload for POST /api/persons/{uuid}/roles.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RoleAssignmentRequest {
    pub role: Option<String>,
}

/// CreatePublicationRequest
///
/// Input payload for POST /api/publications. Title, description and content
/// are all mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePublicationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// UpdatePublicationRequest
///
/// Partial update payload for PUT /api/publications/{uuid}.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePublicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

// --- Soft-Delete Visibility ---

/// A record that can be hidden from the visible lifecycle. Once hidden, every
/// read/update/delete/subscribe operation must treat it as not-found.
pub trait SoftDelete {
    fn is_hidden(&self) -> bool;
}

impl SoftDelete for Organization {
    fn is_hidden(&self) -> bool {
        self.deleted
    }
}

impl SoftDelete for Publication {
    fn is_hidden(&self) -> bool {
        self.deleted
    }
}

impl SoftDelete for Person {
    // A locked or disabled account is invisible to the CRUD surface, not just
    // a deleted one.
    fn is_hidden(&self) -> bool {
        self.deleted || self.locked || !self.enabled
    }
}

// --- Entity/DTO Mappers ---

impl Organization {
    pub fn to_dto(&self) -> OrganizationDto {
        OrganizationDto {
            uuid: self.uuid,
            creator_uuid: self.creator_uuid,
            title: self.title.clone(),
            description: self.description.clone(),
            subscribers_count: self.subscribers.len(),
        }
    }
}

impl OrganizationDto {
    pub fn to_entity(&self) -> Organization {
        Organization {
            uuid: self.uuid,
            creator_uuid: self.creator_uuid,
            title: self.title.clone(),
            description: self.description.clone(),
            deleted: false,
            created_at: Utc::now(),
            subscribers: HashSet::new(),
        }
    }
}

impl Person {
    pub fn to_dto(&self) -> PersonDto {
        let mut roles: Vec<String> = self.roles.iter().cloned().collect();
        roles.sort();
        PersonDto {
            uuid: self.uuid,
            username: self.username.clone(),
            password: None,
            old_password: None,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            sex: self.sex,
            country: self.country.clone(),
            roles,
        }
    }
}

impl PersonDto {
    pub fn to_entity(&self) -> Person {
        Person {
            uuid: self.uuid,
            username: self.username.clone(),
            // The hash is not part of the DTO; callers fill it in separately.
            password: String::new(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            sex: self.sex,
            country: self.country.clone(),
            deleted: false,
            locked: false,
            enabled: true,
            created_at: Utc::now(),
            roles: self.roles.iter().cloned().collect(),
            subscriptions: HashSet::new(),
        }
    }
}

impl Publication {
    pub fn to_dto(&self) -> PublicationDto {
        PublicationDto {
            uuid: self.uuid,
            author_uuid: self.author_uuid,
            title: self.title.clone(),
            description: self.description.clone(),
            content: self.content.clone(),
            visible: self.visible,
        }
    }
}

impl PublicationDto {
    pub fn to_entity(&self) -> Publication {
        Publication {
            uuid: self.uuid,
            author_uuid: self.author_uuid,
            title: self.title.clone(),
            description: self.description.clone(),
            content: self.content.clone(),
            visible: self.visible,
            deleted: false,
            created_at: Utc::now(),
        }
    }
}
