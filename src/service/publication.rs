use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{
        CreatePublicationRequest, Publication, PublicationDto, SoftDelete,
        UpdatePublicationRequest,
    },
    repository::RepositoryState,
    service::{ensure_owner, visible},
};

/// PublicationService
///
/// Same guard composition as organizations, with the author as owner.
#[derive(Clone)]
pub struct PublicationService {
    repo: RepositoryState,
}

impl PublicationService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn find_all(&self) -> Vec<PublicationDto> {
        self.repo
            .find_publications()
            .await
            .iter()
            .filter(|publication| !publication.is_hidden())
            .map(Publication::to_dto)
            .collect()
    }

    pub async fn find(&self, uuid: Uuid) -> Result<PublicationDto, ApiError> {
        let publication = visible(self.repo.find_publication(uuid).await, "publication")?;
        Ok(publication.to_dto())
    }

    /// Creates a publication authored by the calling principal. Title,
    /// description and content are all mandatory; new publications start
    /// visible.
    pub async fn create(
        &self,
        principal: &AuthUser,
        request: CreatePublicationRequest,
    ) -> Result<PublicationDto, ApiError> {
        let title = request
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or(ApiError::MissingRequiredParameters("title"))?;
        let description = request
            .description
            .filter(|description| !description.trim().is_empty())
            .ok_or(ApiError::MissingRequiredParameters("description"))?;
        let content = request
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or(ApiError::MissingRequiredParameters("content"))?;

        let publication = Publication {
            uuid: Uuid::new_v4(),
            author_uuid: principal.uuid,
            title,
            description,
            content,
            visible: true,
            deleted: false,
            created_at: Utc::now(),
        };
        if !self.repo.save_publication(&publication).await {
            return Err(ApiError::Internal);
        }
        Ok(publication.to_dto())
    }

    pub async fn update(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
        request: UpdatePublicationRequest,
    ) -> Result<PublicationDto, ApiError> {
        let mut publication = visible(self.repo.find_publication(uuid).await, "publication")?;
        ensure_owner(publication.author_uuid, principal.uuid)?;

        if let Some(title) = request.title {
            publication.title = title;
        }
        if let Some(description) = request.description {
            publication.description = description;
        }
        if let Some(content) = request.content {
            publication.content = content;
        }
        if let Some(visible) = request.visible {
            publication.visible = visible;
        }
        if !self.repo.save_publication(&publication).await {
            return Err(ApiError::Internal);
        }
        Ok(publication.to_dto())
    }

    /// Flips the deleted flag and returns the last visible state as
    /// confirmation.
    pub async fn delete(
        &self,
        principal: &AuthUser,
        uuid: Uuid,
    ) -> Result<PublicationDto, ApiError> {
        let mut publication = visible(self.repo.find_publication(uuid).await, "publication")?;
        ensure_owner(publication.author_uuid, principal.uuid)?;

        let confirmation = publication.to_dto();
        publication.deleted = true;
        if !self.repo.save_publication(&publication).await {
            return Err(ApiError::Internal);
        }
        Ok(confirmation)
    }
}
