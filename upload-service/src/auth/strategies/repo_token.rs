use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::request::UploadRequest;
use crate::auth::strategy::{AuthOutcome, AuthRejection, AuthStrategy};
use crate::auth::types::{Principal, RepositoryAuthorization, RepositoryScope};
use crate::store::{CredentialStore, StoreError};

/// Credential keyword marking a table token, `Repotoken <key>`.
const KEYWORD: &str = "Repotoken";

/// Scoped per-repository table token. Highest-precedence scheme: the
/// keyword makes the caller's intent unambiguous, so any verification
/// failure is terminal rather than a fall-through.
pub struct RepositoryTokenStrategy {
    store: Arc<dyn CredentialStore>,
}

impl RepositoryTokenStrategy {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthStrategy for RepositoryTokenStrategy {
    fn name(&self) -> &'static str {
        "repository_token"
    }

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
        let Some(key) = request.keyword_credential(KEYWORD) else {
            return Ok(AuthOutcome::NotApplicable);
        };

        // Token and repository come back from one joined lookup so the
        // active check runs on data consistent with the token row.
        let Some((token, repository)) = self.store.repository_token(key).await? else {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "unknown repository token",
            )));
        };

        if !repository.active {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "repository inactive or deleted",
            )));
        }
        if token.is_expired(Utc::now()) {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "repository token expired",
            )));
        }

        Ok(AuthOutcome::Granted(RepositoryAuthorization::new(
            Principal::Repository(repository.clone()),
            vec![token.token_type],
            RepositoryScope::Exact(vec![repository]),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Repository, RepositoryToken, Service, TokenType};
    use crate::store::InMemoryStore;
    use chrono::Duration;
    use http::Method;

    fn store_with_token(active: bool, expired: bool) -> (Arc<InMemoryStore>, Repository) {
        let store = Arc::new(InMemoryStore::new());
        let repository = Repository {
            repoid: 1,
            service: Service::Github,
            owner_id: 10,
            owner_username: "acme".to_string(),
            name: "widgets".to_string(),
            private: true,
            active,
            upload_token: None,
        };
        store.insert_repository(repository.clone());
        store.insert_repository_token(RepositoryToken {
            id: 1,
            repository_id: 1,
            key: "table-key".to_string(),
            token_type: TokenType::Upload,
            valid_until: expired.then(|| Utc::now() - Duration::hours(1)),
        });
        (store, repository)
    }

    fn request(header: &str) -> UploadRequest {
        UploadRequest::new(Method::POST, "/upload").with_authorization(header)
    }

    #[tokio::test]
    async fn valid_token_grants_exactly_that_repository() {
        let (store, repository) = store_with_token(true, false);
        let strategy = RepositoryTokenStrategy::new(store);

        match strategy.attempt(&request("Repotoken table-key")).await.unwrap() {
            AuthOutcome::Granted(authorization) => {
                assert_eq!(authorization.scopes(), &[TokenType::Upload]);
                assert!(authorization.allows_repo(&repository));
                assert!(matches!(
                    authorization.principal(),
                    Principal::Repository(r) if r.repoid == repository.repoid
                ));
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_keyword_is_not_applicable() {
        let (store, _) = store_with_token(true, false);
        let strategy = RepositoryTokenStrategy::new(store);
        assert_eq!(
            strategy.attempt(&request("Bearer table-key")).await.unwrap(),
            AuthOutcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn unknown_key_is_rejected_not_skipped() {
        let (store, _) = store_with_token(true, false);
        let strategy = RepositoryTokenStrategy::new(store);
        assert_eq!(
            strategy.attempt(&request("Repotoken nope")).await.unwrap(),
            AuthOutcome::Rejected(AuthRejection::InvalidCredential("unknown repository token"))
        );
    }

    #[tokio::test]
    async fn inactive_repository_never_authorizes() {
        let (store, _) = store_with_token(false, false);
        let strategy = RepositoryTokenStrategy::new(store);
        assert_eq!(
            strategy.attempt(&request("Repotoken table-key")).await.unwrap(),
            AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "repository inactive or deleted"
            ))
        );
    }

    #[tokio::test]
    async fn expired_token_is_terminal() {
        let (store, _) = store_with_token(true, true);
        let strategy = RepositoryTokenStrategy::new(store);
        assert_eq!(
            strategy.attempt(&request("Repotoken table-key")).await.unwrap(),
            AuthOutcome::Rejected(AuthRejection::InvalidCredential("repository token expired"))
        );
    }
}
