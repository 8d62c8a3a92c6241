use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{
        CreateOrganizationRequest, Organization, OrganizationDto, PersonDto, SoftDelete,
        UpdateOrganizationRequest,
    },
    repository::RepositoryState,
    service::{ensure_owner, visible},
};

/// OrganizationService
///
/// Composes the soft-delete and ownership guards around organization CRUD and
/// the subscription pair management.
#[derive(Clone)]
pub struct OrganizationService {
    repo: RepositoryState,
}

impl OrganizationService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Lists every organization that has not been soft-deleted.
    pub async fn find_all(&self) -> Vec<OrganizationDto> {
        self.repo
            .find_organizations()
            .await
            .iter()
            .filter(|organization| !organization.is_hidden())
            .map(Organization::to_dto)
            .collect()
    }

    pub async fn find(&self, uuid: Uuid) -> Result<OrganizationDto, ApiError> {
        let organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        Ok(organization.to_dto())
    }

    /// Creates an organization owned by the calling principal. `title` is the
    /// only mandatory field.
    pub async fn create(
        &self,
        principal: &AuthUser,
        request: CreateOrganizationRequest,
    ) -> Result<OrganizationDto, ApiError> {
        let title = request
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or(ApiError::MissingRequiredParameters("title"))?;

        let organization = Organization {
            uuid: Uuid::new_v4(),
            creator_uuid: principal.uuid,
            title,
            description: request.description,
            deleted: false,
            created_at: Utc::now(),
            subscribers: HashSet::new(),
        };
        if !self.repo.save_organization(&organization).await {
            return Err(ApiError::Internal);
        }
        Ok(organization.to_dto())
    }

    /// Overwrites the mutable fields provided in the request. Only the creator
    /// may update, and only while the record is visible.
    pub async fn update(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
        request: UpdateOrganizationRequest,
    ) -> Result<OrganizationDto, ApiError> {
        let mut organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        ensure_owner(organization.creator_uuid, principal.uuid)?;

        if let Some(title) = request.title {
            organization.title = title;
        }
        if let Some(description) = request.description {
            organization.description = Some(description);
        }
        if !self.repo.save_organization(&organization).await {
            return Err(ApiError::Internal);
        }
        Ok(organization.to_dto())
    }

    /// Flips the deleted flag and returns the last visible state as
    /// confirmation. The record stays in the store.
    pub async fn delete(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
    ) -> Result<OrganizationDto, ApiError> {
        let mut organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        ensure_owner(organization.creator_uuid, principal.uuid)?;

        let confirmation = organization.to_dto();
        organization.deleted = true;
        if !self.repo.save_organization(&organization).await {
            return Err(ApiError::Internal);
        }
        Ok(confirmation)
    }

    /// Lists the subscribed persons, hiding accounts that are themselves
    /// deleted, locked or disabled.
    pub async fn subscribers(&self, uuid: Uuid) -> Result<Vec<PersonDto>, ApiError> {
        let organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        Ok(self
            .repo
            .find_subscribers(organization.uuid)
            .await
            .iter()
            .filter(|person| !person.is_hidden())
            .map(|person| person.to_dto())
            .collect())
    }

    /// Subscribes the calling principal. A (person, organization) pair is
    /// unique; subscribing twice fails.
    pub async fn subscribe(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
    ) -> Result<OrganizationDto, ApiError> {
        let mut organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        if organization.subscribers.contains(&principal.uuid) {
            return Err(ApiError::AlreadyExists("subscription"));
        }
        if !self.repo.add_subscription(uuid, principal.uuid).await {
            return Err(ApiError::Internal);
        }
        organization.subscribers.insert(principal.uuid);
        Ok(organization.to_dto())
    }

    /// Removes the calling principal's subscription; an absent pair is
    /// not-found.
    pub async fn unsubscribe(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
    ) -> Result<OrganizationDto, ApiError> {
        let mut organization = visible(self.repo.find_organization(uuid).await, "organization")?;
        if !organization.subscribers.contains(&principal.uuid) {
            return Err(ApiError::NotFound("subscription"));
        }
        if !self.repo.remove_subscription(uuid, principal.uuid).await {
            return Err(ApiError::Internal);
        }
        organization.subscribers.remove(&principal.uuid);
        Ok(organization.to_dto())
    }
}
