use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use crate::auth::request::UploadRequest;
use crate::auth::strategy::{AuthOutcome, AuthRejection, AuthStrategy};
use crate::auth::types::{Principal, RepositoryAuthorization, RepositoryScope};
use crate::models::TokenType;
use crate::store::{CredentialStore, StoreError};
use crate::tokenless::path::TokenlessPathResolver;

/// One fixed reason for every tokenless denial, whatever the cause, so
/// a response never confirms which repositories exist.
pub const TOKENLESS_AUTH_FAILED: &str = "not a valid tokenless upload";

/// Upload accepted without any credential at all.
///
/// Phase 1 recovers the target repository from the untrusted request
/// path; phase 2 grants only public-repository reads and fork-branch
/// uploads (a fork's CI run cannot hold the upstream repository's real
/// token, and a `owner:branch` name marks exactly that case).
pub struct TokenlessStrategy {
    store: Arc<dyn CredentialStore>,
    resolver: TokenlessPathResolver,
}

impl TokenlessStrategy {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            resolver: TokenlessPathResolver::new(),
        }
    }

    fn denied() -> AuthOutcome {
        AuthOutcome::Rejected(AuthRejection::TokenlessDenied(TOKENLESS_AUTH_FAILED))
    }

    async fn branch(
        &self,
        request: &UploadRequest,
        commitid: Option<&str>,
    ) -> Result<Option<Option<String>>, StoreError> {
        match commitid {
            Some(sha) => match self.store.commit(sha).await? {
                // A sha in the path must refer to a recorded commit.
                None => Ok(None),
                Some(commit) => Ok(Some(commit.branch)),
            },
            None => Ok(Some(request.body_branch())),
        }
    }
}

#[async_trait]
impl AuthStrategy for TokenlessStrategy {
    fn name(&self) -> &'static str {
        "tokenless"
    }

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
        if request.has_credential() {
            return Ok(AuthOutcome::NotApplicable);
        }

        let Some(claim) = self.resolver.resolve(request.path()) else {
            return Ok(Self::denied());
        };

        let Some(repository) = self
            .store
            .repository_by_slug(claim.service, &claim.slug)
            .await?
        else {
            return Ok(Self::denied());
        };

        if repository.private {
            return Ok(Self::denied());
        }

        let Some(branch) = self.branch(request, claim.commitid.as_deref()).await? else {
            return Ok(Self::denied());
        };

        let fork_branch = branch.as_deref().is_some_and(|b| b.contains(':'));
        if fork_branch || request.method() == Method::GET {
            Ok(AuthOutcome::Granted(RepositoryAuthorization::new(
                Principal::Repository(repository.clone()),
                vec![TokenType::Upload],
                RepositoryScope::Exact(vec![repository]),
            )))
        } else {
            Ok(Self::denied())
        }
    }
}
