use crate::models::{Organization, Person, Publication, Role};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// The fixed role catalog. In Postgres it is seeded by the initial migration;
/// the in-memory store seeds it on construction.
pub const ROLE_CATALOG: [&str; 5] = [
    "USER",
    "ORGANIZATION_MANAGER",
    "CONTENT_MAKER",
    "MODERATOR",
    "ADMIN",
];

/// Repository Trait
///
/// The abstract contract for all persistence operations. Lookups return the
/// raw records including soft-deleted ones; visibility and ownership rules
/// live in the service layer, not here.
///
/// Reads swallow database errors into empty results after logging them; writes
/// report success as a bool so the services can surface a 500.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Organizations ---
    async fn find_organizations(&self) -> Vec<Organization>;
    async fn find_organization(&self, uuid: Uuid) -> Option<Organization>;
    // Insert-or-update keyed on uuid. Does not touch the subscriber set.
    async fn save_organization(&self, organization: &Organization) -> bool;
    async fn find_subscribers(&self, organization_uuid: Uuid) -> Vec<Person>;
    // Returns false when the pair already exists.
    async fn add_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool;
    async fn remove_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool;

    // --- Persons ---
    async fn find_persons(&self) -> Vec<Person>;
    async fn find_person(&self, uuid: Uuid) -> Option<Person>;
    async fn find_person_by_username(&self, username: &str) -> Option<Person>;
    async fn person_exists(&self, username: &str) -> bool;
    async fn save_person(&self, person: &Person) -> bool;
    // Hard delete, used to roll back a registration whose role grant failed.
    async fn remove_person(&self, uuid: Uuid) -> bool;
    async fn add_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool;
    async fn remove_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool;

    // --- Publications ---
    async fn find_publications(&self) -> Vec<Publication>;
    async fn find_publication(&self, uuid: Uuid) -> Option<Publication>;
    async fn find_publications_by_author(&self, author_uuid: Uuid) -> Vec<Publication>;
    async fn save_publication(&self, publication: &Publication) -> bool;

    // --- Roles ---
    async fn find_roles(&self) -> Vec<Role>;
    async fn find_role(&self, name: &str) -> Option<Role>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by the PostgreSQL
/// connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

const ORGANIZATION_COLUMNS: &str =
    "uuid, creator_uuid, title, description, deleted, created_at";
const PERSON_COLUMNS: &str = "uuid, username, password, first_name, last_name, sex, country, \
                              deleted, locked, enabled, created_at";
const PUBLICATION_COLUMNS: &str =
    "uuid, author_uuid, title, description, content, visible, deleted, created_at";

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the subscriber set for one organization.
    async fn load_subscribers(&self, uuid: Uuid) -> HashSet<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT person_uuid FROM organization_subscribers WHERE organization_uuid = $1",
        )
        .bind(uuid)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("load_subscribers error: {:?}", e);
            vec![]
        })
        .into_iter()
        .collect()
    }

    /// Loads the role and subscription sets for one person.
    async fn fill_person(&self, person: &mut Person) {
        person.roles = sqlx::query_scalar::<_, String>(
            "SELECT role_name FROM person_roles WHERE person_uuid = $1",
        )
        .bind(person.uuid)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("fill_person roles error: {:?}", e);
            vec![]
        })
        .into_iter()
        .collect();

        person.subscriptions = sqlx::query_scalar::<_, Uuid>(
            "SELECT organization_uuid FROM organization_subscribers WHERE person_uuid = $1",
        )
        .bind(person.uuid)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("fill_person subscriptions error: {:?}", e);
            vec![]
        })
        .into_iter()
        .collect();
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_organizations(&self) -> Vec<Organization> {
        let mut organizations = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_organizations error: {:?}", e);
            vec![]
        });
        for organization in &mut organizations {
            organization.subscribers = self.load_subscribers(organization.uuid).await;
        }
        organizations
    }

    async fn find_organization(&self, uuid: Uuid) -> Option<Organization> {
        let mut organization = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_organization error: {:?}", e);
            None
        })?;
        organization.subscribers = self.load_subscribers(uuid).await;
        Some(organization)
    }

    async fn save_organization(&self, organization: &Organization) -> bool {
        let result = sqlx::query(
            "INSERT INTO organizations (uuid, creator_uuid, title, description, deleted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (uuid) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 description = EXCLUDED.description, \
                 deleted = EXCLUDED.deleted",
        )
        .bind(organization.uuid)
        .bind(organization.creator_uuid)
        .bind(&organization.title)
        .bind(&organization.description)
        .bind(organization.deleted)
        .bind(organization.created_at)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("save_organization error: {:?}", e);
                false
            }
        }
    }

    async fn find_subscribers(&self, organization_uuid: Uuid) -> Vec<Person> {
        let mut persons = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons p \
             JOIN organization_subscribers s ON p.uuid = s.person_uuid \
             WHERE s.organization_uuid = $1 ORDER BY p.username"
        ))
        .bind(organization_uuid)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_subscribers error: {:?}", e);
            vec![]
        });
        for person in &mut persons {
            self.fill_person(person).await;
        }
        persons
    }

    async fn add_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool {
        let result = sqlx::query(
            "INSERT INTO organization_subscribers (organization_uuid, person_uuid) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(organization_uuid)
        .bind(person_uuid)
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_subscription error: {:?}", e);
                false
            }
        }
    }

    async fn remove_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool {
        let result = sqlx::query(
            "DELETE FROM organization_subscribers \
             WHERE organization_uuid = $1 AND person_uuid = $2",
        )
        .bind(organization_uuid)
        .bind(person_uuid)
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_subscription error: {:?}", e);
                false
            }
        }
    }

    async fn find_persons(&self) -> Vec<Person> {
        let mut persons = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_persons error: {:?}", e);
            vec![]
        });
        for person in &mut persons {
            self.fill_person(person).await;
        }
        persons
    }

    async fn find_person(&self, uuid: Uuid) -> Option<Person> {
        let mut person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_person error: {:?}", e);
            None
        })?;
        self.fill_person(&mut person).await;
        Some(person)
    }

    async fn find_person_by_username(&self, username: &str) -> Option<Person> {
        let mut person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_person_by_username error: {:?}", e);
            None
        })?;
        self.fill_person(&mut person).await;
        Some(person)
    }

    async fn person_exists(&self, username: &str) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM persons WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("person_exists error: {:?}", e);
                false
            })
    }

    async fn save_person(&self, person: &Person) -> bool {
        let result = sqlx::query(
            "INSERT INTO persons (uuid, username, password, first_name, last_name, sex, country, \
                                  deleted, locked, enabled, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (uuid) DO UPDATE SET \
                 username = EXCLUDED.username, \
                 password = EXCLUDED.password, \
                 first_name = EXCLUDED.first_name, \
                 last_name = EXCLUDED.last_name, \
                 sex = EXCLUDED.sex, \
                 country = EXCLUDED.country, \
                 deleted = EXCLUDED.deleted, \
                 locked = EXCLUDED.locked, \
                 enabled = EXCLUDED.enabled",
        )
        .bind(person.uuid)
        .bind(&person.username)
        .bind(&person.password)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(person.sex)
        .bind(&person.country)
        .bind(person.deleted)
        .bind(person.locked)
        .bind(person.enabled)
        .bind(person.created_at)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("save_person error: {:?}", e);
                false
            }
        }
    }

    async fn remove_person(&self, uuid: Uuid) -> bool {
        let result = sqlx::query("DELETE FROM persons WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_person error: {:?}", e);
                false
            }
        }
    }

    async fn add_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool {
        let result = sqlx::query(
            "INSERT INTO person_roles (person_uuid, role_name) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(person_uuid)
        .bind(role_name)
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_person_role error: {:?}", e);
                false
            }
        }
    }

    async fn remove_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool {
        let result =
            sqlx::query("DELETE FROM person_roles WHERE person_uuid = $1 AND role_name = $2")
                .bind(person_uuid)
                .bind(role_name)
                .execute(&self.pool)
                .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_person_role error: {:?}", e);
                false
            }
        }
    }

    async fn find_publications(&self) -> Vec<Publication> {
        sqlx::query_as::<_, Publication>(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_publications error: {:?}", e);
            vec![]
        })
    }

    async fn find_publication(&self, uuid: Uuid) -> Option<Publication> {
        sqlx::query_as::<_, Publication>(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_publication error: {:?}", e);
            None
        })
    }

    async fn find_publications_by_author(&self, author_uuid: Uuid) -> Vec<Publication> {
        sqlx::query_as::<_, Publication>(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications \
             WHERE author_uuid = $1 ORDER BY created_at"
        ))
        .bind(author_uuid)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_publications_by_author error: {:?}", e);
            vec![]
        })
    }

    async fn save_publication(&self, publication: &Publication) -> bool {
        let result = sqlx::query(
            "INSERT INTO publications (uuid, author_uuid, title, description, content, visible, \
                                       deleted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (uuid) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 description = EXCLUDED.description, \
                 content = EXCLUDED.content, \
                 visible = EXCLUDED.visible, \
                 deleted = EXCLUDED.deleted",
        )
        .bind(publication.uuid)
        .bind(publication.author_uuid)
        .bind(&publication.title)
        .bind(&publication.description)
        .bind(&publication.content)
        .bind(publication.visible)
        .bind(publication.deleted)
        .bind(publication.created_at)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("save_publication error: {:?}", e);
                false
            }
        }
    }

    async fn find_roles(&self) -> Vec<Role> {
        let mut roles = sqlx::query_as::<_, Role>("SELECT name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_roles error: {:?}", e);
                vec![]
            });
        let pairs = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT person_uuid, role_name FROM person_roles",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_roles members error: {:?}", e);
            vec![]
        });
        let mut members: HashMap<String, HashSet<Uuid>> = HashMap::new();
        for (person_uuid, role_name) in pairs {
            members.entry(role_name).or_default().insert(person_uuid);
        }
        for role in &mut roles {
            if let Some(set) = members.remove(&role.name) {
                role.members = set;
            }
        }
        roles
    }

    async fn find_role(&self, name: &str) -> Option<Role> {
        let mut role = sqlx::query_as::<_, Role>("SELECT name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_role error: {:?}", e);
                None
            })?;
        role.members =
            sqlx::query_scalar::<_, Uuid>("SELECT person_uuid FROM person_roles WHERE role_name = $1")
                .bind(name)
                .fetch_all(&self.pool)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("find_role members error: {:?}", e);
                    vec![]
                })
                .into_iter()
                .collect();
        Some(role)
    }
}

/// InMemoryRepository
///
/// A HashMap-backed implementation of the same contract. Used by the test
/// suites so the full HTTP stack can run without a database, and useful for
/// local experiments.
#[derive(Default)]
pub struct InMemoryRepository {
    organizations: RwLock<HashMap<Uuid, Organization>>,
    persons: RwLock<HashMap<Uuid, Person>>,
    publications: RwLock<HashMap<Uuid, Publication>>,
    roles: RwLock<HashMap<String, Role>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        let repo = Self::default();
        {
            let mut roles = repo.roles.write().unwrap();
            for name in ROLE_CATALOG {
                roles.insert(
                    name.to_string(),
                    Role {
                        name: name.to_string(),
                        members: HashSet::new(),
                    },
                );
            }
        }
        repo
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_organizations(&self) -> Vec<Organization> {
        self.organizations.read().unwrap().values().cloned().collect()
    }

    async fn find_organization(&self, uuid: Uuid) -> Option<Organization> {
        self.organizations.read().unwrap().get(&uuid).cloned()
    }

    async fn save_organization(&self, organization: &Organization) -> bool {
        let mut organizations = self.organizations.write().unwrap();
        // Preserve the subscriber set across row updates, mirroring the SQL
        // upsert which does not touch the join table.
        let subscribers = organizations
            .get(&organization.uuid)
            .map(|existing| existing.subscribers.clone())
            .unwrap_or_else(|| organization.subscribers.clone());
        let mut stored = organization.clone();
        stored.subscribers = subscribers;
        organizations.insert(stored.uuid, stored);
        true
    }

    async fn find_subscribers(&self, organization_uuid: Uuid) -> Vec<Person> {
        let subscribers = match self.organizations.read().unwrap().get(&organization_uuid) {
            Some(organization) => organization.subscribers.clone(),
            None => return vec![],
        };
        let persons = self.persons.read().unwrap();
        subscribers
            .iter()
            .filter_map(|uuid| persons.get(uuid).cloned())
            .collect()
    }

    async fn add_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool {
        let mut organizations = self.organizations.write().unwrap();
        let Some(organization) = organizations.get_mut(&organization_uuid) else {
            return false;
        };
        if !organization.subscribers.insert(person_uuid) {
            return false;
        }
        if let Some(person) = self.persons.write().unwrap().get_mut(&person_uuid) {
            person.subscriptions.insert(organization_uuid);
        }
        true
    }

    async fn remove_subscription(&self, organization_uuid: Uuid, person_uuid: Uuid) -> bool {
        let mut organizations = self.organizations.write().unwrap();
        let Some(organization) = organizations.get_mut(&organization_uuid) else {
            return false;
        };
        if !organization.subscribers.remove(&person_uuid) {
            return false;
        }
        if let Some(person) = self.persons.write().unwrap().get_mut(&person_uuid) {
            person.subscriptions.remove(&organization_uuid);
        }
        true
    }

    async fn find_persons(&self) -> Vec<Person> {
        self.persons.read().unwrap().values().cloned().collect()
    }

    async fn find_person(&self, uuid: Uuid) -> Option<Person> {
        self.persons.read().unwrap().get(&uuid).cloned()
    }

    async fn find_person_by_username(&self, username: &str) -> Option<Person> {
        self.persons
            .read()
            .unwrap()
            .values()
            .find(|person| person.username == username)
            .cloned()
    }

    async fn person_exists(&self, username: &str) -> bool {
        self.persons
            .read()
            .unwrap()
            .values()
            .any(|person| person.username == username)
    }

    async fn save_person(&self, person: &Person) -> bool {
        self.persons
            .write()
            .unwrap()
            .insert(person.uuid, person.clone());
        true
    }

    async fn remove_person(&self, uuid: Uuid) -> bool {
        self.persons.write().unwrap().remove(&uuid).is_some()
    }

    async fn add_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool {
        let mut persons = self.persons.write().unwrap();
        let Some(person) = persons.get_mut(&person_uuid) else {
            return false;
        };
        if !person.roles.insert(role_name.to_string()) {
            return false;
        }
        if let Some(role) = self.roles.write().unwrap().get_mut(role_name) {
            role.members.insert(person_uuid);
        }
        true
    }

    async fn remove_person_role(&self, person_uuid: Uuid, role_name: &str) -> bool {
        let mut persons = self.persons.write().unwrap();
        let Some(person) = persons.get_mut(&person_uuid) else {
            return false;
        };
        if !person.roles.remove(role_name) {
            return false;
        }
        if let Some(role) = self.roles.write().unwrap().get_mut(role_name) {
            role.members.remove(&person_uuid);
        }
        true
    }

    async fn find_publications(&self) -> Vec<Publication> {
        self.publications.read().unwrap().values().cloned().collect()
    }

    async fn find_publication(&self, uuid: Uuid) -> Option<Publication> {
        self.publications.read().unwrap().get(&uuid).cloned()
    }

    async fn find_publications_by_author(&self, author_uuid: Uuid) -> Vec<Publication> {
        self.publications
            .read()
            .unwrap()
            .values()
            .filter(|publication| publication.author_uuid == author_uuid)
            .cloned()
            .collect()
    }

    async fn save_publication(&self, publication: &Publication) -> bool {
        self.publications
            .write()
            .unwrap()
            .insert(publication.uuid, publication.clone());
        true
    }

    async fn find_roles(&self) -> Vec<Role> {
        self.roles.read().unwrap().values().cloned().collect()
    }

    async fn find_role(&self, name: &str) -> Option<Role> {
        self.roles.read().unwrap().get(name).cloned()
    }
}
