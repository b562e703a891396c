//! Read-only lookup contract against the credential store.
//!
//! Every lookup reflects current expiry/active state; nothing here may
//! cache token validity across requests, since revocation has to take
//! effect on the next upload attempt.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Commit, OrganizationLevelToken, Owner, Repository, RepositoryToken, Service};

pub use memory::InMemoryStore;

/// Infrastructure failure talking to the credential store. Outside the
/// authentication taxonomy: strategies propagate this instead of
/// converting it into a rejection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unreachable: {0}")]
    Unavailable(String),

    #[error("credential store query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a table token by key, returning the owning repository in
    /// the same lookup. The join is a correctness requirement: the
    /// inactive check must run on data consistent with the token row.
    async fn repository_token(
        &self,
        key: &str,
    ) -> Result<Option<(RepositoryToken, Repository)>, StoreError>;

    /// Look up an org-level token together with its owning organization.
    async fn org_token(
        &self,
        token: Uuid,
    ) -> Result<Option<(OrganizationLevelToken, Owner)>, StoreError>;

    /// Resolve an `owner/name` slug on a provider to a repository.
    async fn repository_by_slug(
        &self,
        service: Service,
        slug: &str,
    ) -> Result<Option<Repository>, StoreError>;

    /// Resolve a legacy per-repository upload token.
    async fn repository_by_upload_token(
        &self,
        token: Uuid,
    ) -> Result<Option<Repository>, StoreError>;

    /// Resolve a repository by owner username and numeric id, used by
    /// the global-token scheme.
    async fn repository_by_owner_and_id(
        &self,
        service: Service,
        owner_username: &str,
        repoid: i64,
    ) -> Result<Option<Repository>, StoreError>;

    /// Fetch a recorded commit by its sha.
    async fn commit(&self, commitid: &str) -> Result<Option<Commit>, StoreError>;
}
