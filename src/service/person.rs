use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, hash_password, verify_password},
    error::ApiError,
    models::{
        CreatePersonRequest, Person, PersonDto, Publication, PublicationDto, SoftDelete,
        UpdatePersonRequest,
    },
    repository::RepositoryState,
    service::{RoleService, ensure_owner, visible},
};

/// PersonService
///
/// Account CRUD plus role assignment. Visibility is stricter here than for the
/// other entities: a locked or disabled account is treated as not-found, not
/// just a deleted one.
#[derive(Clone)]
pub struct PersonService {
    repo: RepositoryState,
    roles: RoleService,
}

impl PersonService {
    pub fn new(repo: RepositoryState, roles: RoleService) -> Self {
        Self { repo, roles }
    }

    pub async fn find_all(&self) -> Vec<PersonDto> {
        self.repo
            .find_persons()
            .await
            .iter()
            .filter(|person| !person.is_hidden())
            .map(|person| person.to_dto())
            .collect()
    }

    pub async fn find(&self, uuid: Uuid) -> Result<PersonDto, ApiError> {
        let person = visible(self.repo.find_person(uuid).await, "person")?;
        Ok(person.to_dto())
    }

    /// Resolves the calling principal's own account.
    pub async fn current(&self, principal: &AuthUser) -> Result<PersonDto, ApiError> {
        self.find(principal.uuid).await
    }

    /// Registers a regular account carrying the USER role.
    pub async fn create_user(&self, request: CreatePersonRequest) -> Result<PersonDto, ApiError> {
        self.create(request, "USER").await
    }

    /// Creates an account carrying the ADMIN role. Reserved for the startup
    /// bootstrap and admin tooling; not reachable from the public surface.
    pub async fn create_admin(&self, request: CreatePersonRequest) -> Result<PersonDto, ApiError> {
        self.create(request, "ADMIN").await
    }

    async fn create(
        &self,
        request: CreatePersonRequest,
        role_name: &str,
    ) -> Result<PersonDto, ApiError> {
        let username = request
            .username
            .filter(|username| !username.trim().is_empty())
            .ok_or(ApiError::MissingRequiredParameters("username"))?;
        let password = request
            .password
            .filter(|password| !password.is_empty())
            .ok_or(ApiError::MissingRequiredParameters("password"))?;

        if self.repo.person_exists(&username).await {
            return Err(ApiError::AlreadyExists("username"));
        }

        // The granted role comes from the fixed catalog; its absence means a
        // broken deployment, not a client mistake.
        let role = self.roles.find(role_name).await.ok_or(ApiError::Internal)?;

        let mut person = Person {
            uuid: Uuid::new_v4(),
            username,
            password: hash_password(&password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            sex: request.sex,
            country: request.country,
            deleted: false,
            locked: false,
            enabled: true,
            created_at: Utc::now(),
            roles: HashSet::new(),
            subscriptions: HashSet::new(),
        };
        if !self.repo.save_person(&person).await {
            return Err(ApiError::Internal);
        }
        if !self.repo.add_person_role(person.uuid, &role.name).await {
            // Roll the account back rather than leaving a role-less record
            // squatting on the username.
            self.repo.remove_person(person.uuid).await;
            return Err(ApiError::Internal);
        }
        person.roles.insert(role.name);
        Ok(person.to_dto())
    }

    /// Self-service profile update. Only the account holder may call this;
    /// changing the password additionally requires the current one.
    pub async fn update(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
        request: UpdatePersonRequest,
    ) -> Result<PersonDto, ApiError> {
        let mut person = visible(self.repo.find_person(uuid).await, "person")?;
        ensure_owner(person.uuid, principal.uuid)?;

        if let Some(new_password) = request.password {
            let old_password = request.old_password.ok_or(ApiError::PermissionDenied)?;
            if !verify_password(&old_password, &person.password) {
                return Err(ApiError::PermissionDenied);
            }
            person.password = hash_password(&new_password)?;
        }
        if let Some(username) = request.username {
            if username != person.username && self.repo.person_exists(&username).await {
                return Err(ApiError::AlreadyExists("username"));
            }
            person.username = username;
        }
        if let Some(first_name) = request.first_name {
            person.first_name = Some(first_name);
        }
        if let Some(last_name) = request.last_name {
            person.last_name = Some(last_name);
        }
        if let Some(sex) = request.sex {
            person.sex = Some(sex);
        }
        if let Some(country) = request.country {
            person.country = Some(country);
        }
        if !self.repo.save_person(&person).await {
            return Err(ApiError::Internal);
        }
        Ok(person.to_dto())
    }

    /// Soft-deletes an account. The holder may delete themselves; deleting
    /// anyone else requires the ADMIN role.
    pub async fn delete(&self, principal: &AuthUser, uuid: Uuid) -> Result<PersonDto, ApiError> {
        let mut person = visible(self.repo.find_person(uuid).await, "person")?;
        if person.uuid != principal.uuid && !principal.is_admin() {
            return Err(ApiError::PermissionDenied);
        }

        let confirmation = person.to_dto();
        person.deleted = true;
        if !self.repo.save_person(&person).await {
            return Err(ApiError::Internal);
        }
        Ok(confirmation)
    }

    /// Grants a catalog role to an account. Unknown role names are not-found;
    /// granting a role the account already holds is a conflict.
    pub async fn add_role(&self, uuid: Uuid, role_name: &str) -> Result<PersonDto, ApiError> {
        let mut person = visible(self.repo.find_person(uuid).await, "person")?;
        let role = self
            .roles
            .find(role_name)
            .await
            .ok_or(ApiError::NotFound("role"))?;

        if person.roles.contains(&role.name) {
            return Err(ApiError::AlreadyExists("role assignment"));
        }
        if !self.repo.add_person_role(person.uuid, &role.name).await {
            return Err(ApiError::Internal);
        }
        person.roles.insert(role.name);
        Ok(person.to_dto())
    }

    /// Revokes a catalog role. Unknown role names and unheld assignments are
    /// both not-found.
    pub async fn remove_role(&self, uuid: Uuid, role_name: &str) -> Result<PersonDto, ApiError> {
        let mut person = visible(self.repo.find_person(uuid).await, "person")?;
        let role = self
            .roles
            .find(role_name)
            .await
            .ok_or(ApiError::NotFound("role"))?;

        if !person.roles.contains(&role.name) {
            return Err(ApiError::NotFound("role assignment"));
        }
        if !self.repo.remove_person_role(person.uuid, &role.name).await {
            return Err(ApiError::Internal);
        }
        person.roles.remove(&role.name);
        Ok(person.to_dto())
    }

    /// Lists the visible publications authored by the given person.
    pub async fn publications(&self, uuid: Uuid) -> Result<Vec<PublicationDto>, ApiError> {
        let person = visible(self.repo.find_person(uuid).await, "person")?;
        Ok(self
            .repo
            .find_publications_by_author(person.uuid)
            .await
            .iter()
            .filter(|publication| !publication.is_hidden())
            .map(Publication::to_dto)
            .collect())
    }
}
