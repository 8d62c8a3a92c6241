use jobfinder::{
    AppConfig, AppState, InMemoryRepository, bootstrap_admin, create_router,
    models::{OrganizationDto, PersonDto, PublicationDto},
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

const ADMIN_USER: &str = "admin";
const ADMIN_PASS: &str = "password";

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let state = AppState::new(repo, AppConfig::default());
    bootstrap_admin(&state).await;

    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// Registers an account through the public endpoint and returns its DTO.
async fn register(app: &TestApp, client: &reqwest::Client, username: &str) -> PersonDto {
    let response = client
        .post(format!("{}/api/persons", app.address))
        .json(&serde_json::json!({ "username": username, "password": "s3cret" }))
        .send()
        .await
        .expect("register fail");
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_missing_credentials_rejected_with_challenge() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/organizations", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert!(response.headers().contains_key("www-authenticate"));

    // Wrong password fails the same way.
    let response = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth(ADMIN_USER, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_registration_and_current_profile() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let created = register(&app, &client, "walter").await;
    assert_eq!(created.username, "walter");
    assert_eq!(created.roles, vec!["USER".to_string()]);

    let me: PersonDto = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth("walter", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.uuid, created.uuid);

    // Credentials never come back in a response body.
    let raw = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth("walter", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!raw.contains("password"));
}

#[tokio::test]
async fn test_registration_rejects_duplicates_and_blanks() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register(&app, &client, "jesse").await;

    let dup = client
        .post(format!("{}/api/persons", app.address))
        .json(&serde_json::json!({ "username": "jesse", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 409);

    let no_password = client
        .post(format!("{}/api/persons", app.address))
        .json(&serde_json::json!({ "username": "gus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(no_password.status(), 400);
}

#[tokio::test]
async fn test_organization_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register(&app, &client, "owner").await;

    // Create with the single mandatory field.
    let response = client
        .post(format!("{}/api/organizations", app.address))
        .basic_auth("owner", Some("s3cret"))
        .json(&serde_json::json!({ "title": "Title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let org: OrganizationDto = response.json().await.unwrap();
    assert_ne!(org.uuid, Uuid::nil());
    assert_eq!(org.title, "Title");

    // Missing title is a 400, not a 422.
    let bad = client
        .post(format!("{}/api/organizations", app.address))
        .basic_auth("owner", Some("s3cret"))
        .json(&serde_json::json!({ "description": "no title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);

    // Partial update only overwrites what was sent.
    let updated: OrganizationDto = client
        .put(format!("{}/api/organizations/{}", app.address, org.uuid))
        .basic_auth("owner", Some("s3cret"))
        .json(&serde_json::json!({ "description": "updated" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.title, "Title");
    assert_eq!(updated.description.as_deref(), Some("updated"));

    // Delete answers with the last visible state.
    let deleted: OrganizationDto = client
        .delete(format!("{}/api/organizations/{}", app.address, org.uuid))
        .basic_auth("owner", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted, updated);

    // And the record is gone from the visible surface.
    let gone = client
        .get(format!("{}/api/organizations/{}", app.address, org.uuid))
        .basic_auth("owner", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn test_organization_ownership_enforced() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register(&app, &client, "alice").await;
    register(&app, &client, "bob").await;

    let org: OrganizationDto = client
        .post(format!("{}/api/organizations", app.address))
        .basic_auth("alice", Some("s3cret"))
        .json(&serde_json::json!({ "title": "Alice Org" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let forbidden = client
        .put(format!("{}/api/organizations/{}", app.address, org.uuid))
        .basic_auth("bob", Some("s3cret"))
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let forbidden = client
        .delete(format!("{}/api/organizations/{}", app.address, org.uuid))
        .basic_auth("bob", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);
}

#[tokio::test]
async fn test_admin_only_listing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register(&app, &client, "pleb").await;

    for path in ["organizations", "persons", "publications"] {
        let response = client
            .get(format!("{}/api/{}", app.address, path))
            .basic_auth("pleb", Some("s3cret"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 403, "{path} should be admin-only");

        let response = client
            .get(format!("{}/api/{}", app.address, path))
            .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "{path} should open for admin");
    }
}

#[tokio::test]
async fn test_subscription_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register(&app, &client, "owner").await;
    let fan = register(&app, &client, "fan").await;

    let org: OrganizationDto = client
        .post(format!("{}/api/organizations", app.address))
        .basic_auth("owner", Some("s3cret"))
        .json(&serde_json::json!({ "title": "Band" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let subscribers_url = format!("{}/api/organizations/{}/subscribers", app.address, org.uuid);

    let subscribed: OrganizationDto = client
        .post(&subscribers_url)
        .basic_auth("fan", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(subscribed.subscribers_count, 1);

    // The pair is unique.
    let dup = client
        .post(&subscribers_url)
        .basic_auth("fan", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 409);

    let listed: Vec<PersonDto> = client
        .get(&subscribers_url)
        .basic_auth("owner", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].uuid, fan.uuid);

    let unsubscribed: OrganizationDto = client
        .delete(&subscribers_url)
        .basic_auth("fan", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unsubscribed.subscribers_count, 0);

    // Removing an absent pair is not-found, not idempotent success.
    let absent = client
        .delete(&subscribers_url)
        .basic_auth("fan", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(absent.status(), 404);
}

#[tokio::test]
async fn test_publication_lifecycle_and_author_listing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let author = register(&app, &client, "author").await;

    let missing_content = client
        .post(format!("{}/api/publications", app.address))
        .basic_auth("author", Some("s3cret"))
        .json(&serde_json::json!({ "title": "T", "description": "D" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_content.status(), 400);

    let publication: PublicationDto = client
        .post(format!("{}/api/publications", app.address))
        .basic_auth("author", Some("s3cret"))
        .json(&serde_json::json!({
            "title": "Hiring",
            "description": "Junior role",
            "content": "Apply within"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(publication.visible);
    assert_eq!(publication.author_uuid, author.uuid);

    let by_author: Vec<PublicationDto> = client
        .get(format!(
            "{}/api/persons/{}/publications",
            app.address, author.uuid
        ))
        .basic_auth("author", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_author.len(), 1);

    let deleted: PublicationDto = client
        .delete(format!(
            "{}/api/publications/{}",
            app.address, publication.uuid
        ))
        .basic_auth("author", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted.uuid, publication.uuid);

    // Soft-deleted publications disappear from the author listing too.
    let by_author: Vec<PublicationDto> = client
        .get(format!(
            "{}/api/persons/{}/publications",
            app.address, author.uuid
        ))
        .basic_auth("author", Some("s3cret"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(by_author.is_empty());
}

#[tokio::test]
async fn test_role_management_is_admin_territory() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let person = register(&app, &client, "promotee").await;
    let roles_url = format!("{}/api/persons/{}/roles", app.address, person.uuid);

    // Non-admin callers are rejected before anything is looked up.
    let forbidden = client
        .post(&roles_url)
        .basic_auth("promotee", Some("s3cret"))
        .json(&serde_json::json!({ "role": "MODERATOR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let promoted: PersonDto = client
        .post(&roles_url)
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .json(&serde_json::json!({ "role": "MODERATOR" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(promoted.roles.contains(&"MODERATOR".to_string()));

    // Granting a held role is a conflict.
    let dup = client
        .post(&roles_url)
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .json(&serde_json::json!({ "role": "MODERATOR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 409);

    // Unknown role names are not-found.
    let unknown = client
        .post(&roles_url)
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .json(&serde_json::json!({ "role": "SUPERUSER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 404);

    let demoted: PersonDto = client
        .delete(format!("{}/MODERATOR", roles_url))
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!demoted.roles.contains(&"MODERATOR".to_string()));

    // Revoking an unheld role is not-found.
    let unheld = client
        .delete(format!("{}/MODERATOR", roles_url))
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .send()
        .await
        .unwrap();
    assert_eq!(unheld.status(), 404);
}

#[tokio::test]
async fn test_person_password_change_requires_current_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let person = register(&app, &client, "careful").await;
    let url = format!("{}/api/persons/{}", app.address, person.uuid);

    let wrong_old = client
        .put(&url)
        .basic_auth("careful", Some("s3cret"))
        .json(&serde_json::json!({ "password": "newpass", "old_password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_old.status(), 403);

    let changed = client
        .put(&url)
        .basic_auth("careful", Some("s3cret"))
        .json(&serde_json::json!({ "password": "newpass", "old_password": "s3cret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(changed.status(), 200);

    // Old credentials are dead, new ones work.
    let stale = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth("careful", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), 401);

    let fresh = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth("careful", Some("newpass"))
        .send()
        .await
        .unwrap();
    assert_eq!(fresh.status(), 200);
}

#[tokio::test]
async fn test_person_delete_self_and_by_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let victim = register(&app, &client, "victim").await;
    let other = register(&app, &client, "other").await;

    // A regular account may not delete someone else.
    let forbidden = client
        .delete(format!("{}/api/persons/{}", app.address, victim.uuid))
        .basic_auth("other", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // An admin may.
    let deleted: PersonDto = client
        .delete(format!("{}/api/persons/{}", app.address, victim.uuid))
        .basic_auth(ADMIN_USER, Some(ADMIN_PASS))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted.uuid, victim.uuid);

    // The deleted account can no longer authenticate.
    let locked_out = client
        .get(format!("{}/api/persons/current", app.address))
        .basic_auth("victim", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(locked_out.status(), 401);

    // Self-delete works for everyone.
    let self_deleted = client
        .delete(format!("{}/api/persons/{}", app.address, other.uuid))
        .basic_auth("other", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(self_deleted.status(), 200);
}
