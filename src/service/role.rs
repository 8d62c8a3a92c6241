use crate::{models::Role, repository::RepositoryState};

// Tier policy: each tier is the full catalog minus the names above it.
// The superset chain user < moderator < admin holds by construction.
const MODERATOR_EXCLUDES: &[&str] = &["ADMIN"];
const USER_EXCLUDES: &[&str] = &["MODERATOR", "ADMIN"];

/// RoleService
///
/// Role-set queries over the fixed catalog for the three privilege tiers.
#[derive(Clone)]
pub struct RoleService {
    repo: RepositoryState,
}

impl RoleService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn find(&self, name: &str) -> Option<Role> {
        self.repo.find_role(name).await
    }

    /// The role set a regular user tier may carry.
    pub async fn user_roles(&self) -> Vec<Role> {
        self.catalog_except(USER_EXCLUDES).await
    }

    /// The moderator tier: everything a user has, plus MODERATOR.
    pub async fn moderator_roles(&self) -> Vec<Role> {
        self.catalog_except(MODERATOR_EXCLUDES).await
    }

    /// The admin tier: the full catalog.
    pub async fn admin_roles(&self) -> Vec<Role> {
        self.catalog_except(&[]).await
    }

    async fn catalog_except(&self, excludes: &[&str]) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .repo
            .find_roles()
            .await
            .into_iter()
            .filter(|role| !excludes.contains(&role.name.as_str()))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}
