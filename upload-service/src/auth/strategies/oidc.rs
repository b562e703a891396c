use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::request::UploadRequest;
use crate::auth::strategy::{AuthOutcome, AuthStrategy};
use crate::auth::types::{Principal, RepositoryAuthorization, RepositoryScope};
use crate::models::TokenType;
use crate::oidc::OidcVerifier;
use crate::store::StoreError;

/// Short-lived GitHub OIDC token, verified cryptographically.
///
/// UUID-shaped bearers are reserved for the org/legacy schemes and skip
/// this strategy. Every verification failure is `NotApplicable` rather
/// than a rejection: a non-UUID credential may still be meant for the
/// legacy or global schemes queued behind this one.
pub struct GithubOidcStrategy {
    verifier: Arc<dyn OidcVerifier>,
}

impl GithubOidcStrategy {
    pub fn new(verifier: Arc<dyn OidcVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl AuthStrategy for GithubOidcStrategy {
    fn name(&self) -> &'static str {
        "github_oidc_token"
    }

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
        let Some(token) = request.bearer_token() else {
            return Ok(AuthOutcome::NotApplicable);
        };
        if Uuid::parse_str(token).is_ok() {
            return Ok(AuthOutcome::NotApplicable);
        }

        match self.verifier.verify(token).await {
            Ok(repository) => {
                tracing::info!(repository = %repository.slug(), "github oidc token accepted");
                Ok(AuthOutcome::Granted(RepositoryAuthorization::new(
                    Principal::Repository(repository.clone()),
                    vec![TokenType::Upload],
                    RepositoryScope::Exact(vec![repository]),
                )))
            }
            Err(err) => {
                tracing::debug!(error = %err, "oidc verification failed, trying next scheme");
                Ok(AuthOutcome::NotApplicable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Repository, Service};
    use crate::oidc::OidcError;
    use http::Method;

    struct StaticVerifier(Result<Repository, ()>);

    #[async_trait]
    impl OidcVerifier for StaticVerifier {
        async fn verify(&self, _token: &str) -> Result<Repository, OidcError> {
            self.0.clone().map_err(|_| OidcError::UnknownRepository)
        }
    }

    fn repository() -> Repository {
        Repository {
            repoid: 5,
            service: Service::Github,
            owner_id: 1,
            owner_username: "acme".to_string(),
            name: "widgets".to_string(),
            private: true,
            active: true,
            upload_token: None,
        }
    }

    fn request(token: &str) -> UploadRequest {
        UploadRequest::new(Method::POST, "/upload").with_authorization(format!("Bearer {token}"))
    }

    #[tokio::test]
    async fn verified_token_grants_upload_for_resolved_repository() {
        let strategy = GithubOidcStrategy::new(Arc::new(StaticVerifier(Ok(repository()))));

        match strategy.attempt(&request("eyJhbGciOi.header.sig")).await.unwrap() {
            AuthOutcome::Granted(authorization) => {
                assert_eq!(authorization.scopes(), &[TokenType::Upload]);
                assert!(authorization.allows_repo(&repository()));
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn uuid_shaped_bearer_is_reserved_for_other_schemes() {
        let strategy = GithubOidcStrategy::new(Arc::new(StaticVerifier(Ok(repository()))));
        assert_eq!(
            strategy
                .attempt(&request("a1a2a3a4-b1b2-c1c2-d1d2-e1e2e3e4e5e6"))
                .await
                .unwrap(),
            AuthOutcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn verification_failure_does_not_block_fallback() {
        let strategy = GithubOidcStrategy::new(Arc::new(StaticVerifier(Err(()))));
        assert_eq!(
            strategy.attempt(&request("eyJhbGciOi.header.sig")).await.unwrap(),
            AuthOutcome::NotApplicable
        );
    }
}
