use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::request::UploadRequest;
use crate::auth::strategy::{AuthOutcome, AuthRejection, AuthStrategy};
use crate::auth::types::{Principal, RepositoryAuthorization, RepositoryScope};
use crate::models::{Service, TokenType};
use crate::store::{CredentialStore, StoreError};

/// Parameters the global-token scheme needs from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalTokenClaim {
    pub token: String,
    pub owner: String,
    pub repoid: i64,
}

/// Operator-configured service-wide tokens, each mapped to a provider.
/// Used server-side only, never handed to end users.
pub struct GlobalTokenStrategy {
    store: Arc<dyn CredentialStore>,
    tokens: HashMap<String, Service>,
}

impl GlobalTokenStrategy {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: HashMap<String, Service>) -> Self {
        Self { store, tokens }
    }

    fn extract(&self, _request: &UploadRequest) -> Option<GlobalTokenClaim> {
        // TODO: wire this up once the upload endpoint settles where the
        // global credential, owner, and repo id travel in the request.
        // Until then the strategy never matches.
        None
    }

    pub(crate) async fn verify_claim(
        &self,
        claim: &GlobalTokenClaim,
    ) -> Result<AuthOutcome, StoreError> {
        let Some(service) = self.tokens.get(&claim.token) else {
            return Ok(AuthOutcome::NotApplicable);
        };

        let Some(repository) = self
            .store
            .repository_by_owner_and_id(*service, &claim.owner, claim.repoid)
            .await?
        else {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "could not find a repository for the global token, try the repo upload token",
            )));
        };

        if !repository.active {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "repository inactive or deleted",
            )));
        }

        Ok(AuthOutcome::Granted(RepositoryAuthorization::new(
            Principal::Repository(repository.clone()),
            vec![TokenType::Upload],
            RepositoryScope::Exact(vec![repository]),
        )))
    }
}

#[async_trait]
impl AuthStrategy for GlobalTokenStrategy {
    fn name(&self) -> &'static str {
        "global_token"
    }

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
        let Some(claim) = self.extract(request) else {
            return Ok(AuthOutcome::NotApplicable);
        };
        self.verify_claim(&claim).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Repository;
    use crate::store::InMemoryStore;
    use http::Method;

    fn strategy(with_repo: bool) -> GlobalTokenStrategy {
        let store = Arc::new(InMemoryStore::new());
        if with_repo {
            store.insert_repository(Repository {
                repoid: 42,
                service: Service::Github,
                owner_id: 10,
                owner_username: "acme".to_string(),
                name: "widgets".to_string(),
                private: true,
                active: true,
                upload_token: None,
            });
        }
        let tokens = HashMap::from([("global-secret".to_string(), Service::Github)]);
        GlobalTokenStrategy::new(store, tokens)
    }

    fn claim(token: &str) -> GlobalTokenClaim {
        GlobalTokenClaim {
            token: token.to_string(),
            owner: "acme".to_string(),
            repoid: 42,
        }
    }

    #[tokio::test]
    async fn attempt_never_matches_until_extraction_is_defined() {
        let strategy = strategy(true);
        let request = UploadRequest::new(Method::POST, "/upload")
            .with_authorization("Bearer global-secret");
        assert_eq!(
            strategy.attempt(&request).await.unwrap(),
            AuthOutcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn configured_token_resolves_repository() {
        let strategy = strategy(true);
        match strategy.verify_claim(&claim("global-secret")).await.unwrap() {
            AuthOutcome::Granted(authorization) => {
                assert_eq!(authorization.scopes(), &[TokenType::Upload]);
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unconfigured_token_is_not_applicable() {
        let strategy = strategy(true);
        assert_eq!(
            strategy.verify_claim(&claim("other")).await.unwrap(),
            AuthOutcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn missing_repository_is_terminal() {
        let strategy = strategy(false);
        assert!(matches!(
            strategy.verify_claim(&claim("global-secret")).await.unwrap(),
            AuthOutcome::Rejected(AuthRejection::InvalidCredential(_))
        ));
    }
}
