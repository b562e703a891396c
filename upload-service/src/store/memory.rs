use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Commit, OrganizationLevelToken, Owner, Repository, RepositoryToken, Service};

use super::{CredentialStore, StoreError};

/// Map-backed credential store for tests and standalone runs.
///
/// Lookups go through the same trait the service uses in production, so
/// chain tests exercise the real strategy code paths.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    owners: HashMap<i64, Owner>,
    repositories: HashMap<i64, Repository>,
    repository_tokens: Vec<RepositoryToken>,
    org_tokens: Vec<OrganizationLevelToken>,
    commits: HashMap<String, Commit>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_owner(&self, owner: Owner) {
        self.inner.write().unwrap().owners.insert(owner.ownerid, owner);
    }

    pub fn insert_repository(&self, repository: Repository) {
        self.inner
            .write()
            .unwrap()
            .repositories
            .insert(repository.repoid, repository);
    }

    pub fn insert_repository_token(&self, token: RepositoryToken) {
        self.inner.write().unwrap().repository_tokens.push(token);
    }

    pub fn insert_org_token(&self, token: OrganizationLevelToken) {
        self.inner.write().unwrap().org_tokens.push(token);
    }

    pub fn insert_commit(&self, commit: Commit) {
        self.inner
            .write()
            .unwrap()
            .commits
            .insert(commit.commitid.clone(), commit);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn repository_token(
        &self,
        key: &str,
    ) -> Result<Option<(RepositoryToken, Repository)>, StoreError> {
        let inner = self.read();
        let token = inner.repository_tokens.iter().find(|t| t.key == key);
        Ok(token.and_then(|token| {
            inner
                .repositories
                .get(&token.repository_id)
                .map(|repo| (token.clone(), repo.clone()))
        }))
    }

    async fn org_token(
        &self,
        token: Uuid,
    ) -> Result<Option<(OrganizationLevelToken, Owner)>, StoreError> {
        let inner = self.read();
        let record = inner.org_tokens.iter().find(|t| t.token == token);
        Ok(record.and_then(|record| {
            inner
                .owners
                .get(&record.owner_id)
                .map(|owner| (record.clone(), owner.clone()))
        }))
    }

    async fn repository_by_slug(
        &self,
        service: Service,
        slug: &str,
    ) -> Result<Option<Repository>, StoreError> {
        let inner = self.read();
        Ok(inner
            .repositories
            .values()
            .find(|r| r.service == service && r.slug() == slug)
            .cloned())
    }

    async fn repository_by_upload_token(
        &self,
        token: Uuid,
    ) -> Result<Option<Repository>, StoreError> {
        let inner = self.read();
        Ok(inner
            .repositories
            .values()
            .find(|r| r.upload_token == Some(token))
            .cloned())
    }

    async fn repository_by_owner_and_id(
        &self,
        service: Service,
        owner_username: &str,
        repoid: i64,
    ) -> Result<Option<Repository>, StoreError> {
        let inner = self.read();
        Ok(inner
            .repositories
            .get(&repoid)
            .filter(|r| r.service == service && r.owner_username == owner_username)
            .cloned())
    }

    async fn commit(&self, commitid: &str) -> Result<Option<Commit>, StoreError> {
        Ok(self.read().commits.get(commitid).cloned())
    }
}
