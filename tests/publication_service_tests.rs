use jobfinder::{
    ApiError,
    auth::AuthUser,
    models::{CreatePersonRequest, CreatePublicationRequest, UpdatePublicationRequest},
    repository::{InMemoryRepository, RepositoryState},
    service::{PersonService, PublicationService, RoleService},
};
use std::sync::Arc;
use uuid::Uuid;

fn services() -> (PublicationService, PersonService) {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let roles = RoleService::new(repo.clone());
    (
        PublicationService::new(repo.clone()),
        PersonService::new(repo, roles),
    )
}

async fn principal(persons: &PersonService, username: &str) -> AuthUser {
    let dto = persons
        .create_user(CreatePersonRequest {
            username: Some(username.to_string()),
            password: Some("s3cret".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    AuthUser {
        uuid: dto.uuid,
        username: dto.username,
        roles: dto.roles.into_iter().collect(),
    }
}

fn full_request() -> CreatePublicationRequest {
    CreatePublicationRequest {
        title: Some("Hiring".into()),
        description: Some("Junior role".into()),
        content: Some("Apply within".into()),
    }
}

#[tokio::test]
async fn create_requires_every_field() {
    let (publications, persons) = services();
    let author = principal(&persons, "author").await;

    let mut request = full_request();
    request.title = None;
    assert_eq!(
        publications.create(&author, request).await.unwrap_err(),
        ApiError::MissingRequiredParameters("title")
    );

    let mut request = full_request();
    request.description = None;
    assert_eq!(
        publications.create(&author, request).await.unwrap_err(),
        ApiError::MissingRequiredParameters("description")
    );

    let mut request = full_request();
    request.content = None;
    assert_eq!(
        publications.create(&author, request).await.unwrap_err(),
        ApiError::MissingRequiredParameters("content")
    );
}

#[tokio::test]
async fn create_starts_visible_and_owned_by_author() {
    let (publications, persons) = services();
    let author = principal(&persons, "author").await;

    let publication = publications.create(&author, full_request()).await.unwrap();
    assert!(publication.visible);
    assert_eq!(publication.author_uuid, author.uuid);
    assert_ne!(publication.uuid, Uuid::nil());
}

#[tokio::test]
async fn update_is_author_only() {
    let (publications, persons) = services();
    let author = principal(&persons, "author").await;
    let stranger = principal(&persons, "stranger").await;
    let publication = publications.create(&author, full_request()).await.unwrap();

    let err = publications
        .update(
            &stranger,
            publication.uuid,
            UpdatePublicationRequest {
                title: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::PermissionDenied);

    // The author can also pull a publication from view without deleting it.
    let updated = publications
        .update(
            &author,
            publication.uuid,
            UpdatePublicationRequest {
                visible: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.visible);
    assert_eq!(updated.title, "Hiring");
}

#[tokio::test]
async fn delete_returns_prior_state_then_hides_record() {
    let (publications, persons) = services();
    let author = principal(&persons, "author").await;
    let publication = publications.create(&author, full_request()).await.unwrap();

    let confirmation = publications.delete(&author, publication.uuid).await.unwrap();
    assert_eq!(confirmation, publication);

    assert_eq!(
        publications.find(publication.uuid).await.unwrap_err(),
        ApiError::NotFound("publication")
    );
    assert!(publications.find_all().await.is_empty());

    let err = publications
        .update(
            &author,
            publication.uuid,
            UpdatePublicationRequest::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::NotFound("publication"));
}

#[tokio::test]
async fn listing_skips_deleted_publications_only() {
    let (publications, persons) = services();
    let author = principal(&persons, "author").await;

    let keep = publications.create(&author, full_request()).await.unwrap();
    let drop = publications
        .create(
            &author,
            CreatePublicationRequest {
                title: Some("Old".into()),
                description: Some("Stale".into()),
                content: Some("Expired".into()),
            },
        )
        .await
        .unwrap();
    publications.delete(&author, drop.uuid).await.unwrap();

    let listed = publications.find_all().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].uuid, keep.uuid);
}
