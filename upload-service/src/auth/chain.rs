use std::collections::HashMap;
use std::sync::Arc;

use crate::models::Service;
use crate::oidc::OidcVerifier;
use crate::store::{CredentialStore, StoreError};

use super::request::UploadRequest;
use super::strategies::{
    GithubOidcStrategy, GlobalTokenStrategy, LegacyTokenStrategy, OrgTokenStrategy,
    RepositoryTokenStrategy, TokenlessStrategy,
};
use super::strategy::{AuthOutcome, AuthRejection, AuthStrategy};
use super::types::RepositoryAuthorization;

/// Terminal failure of a whole chain run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthFailure {
    /// `Some` when a strategy matched the credential format and refused
    /// it; `None` when every strategy passed.
    pub rejection: Option<AuthRejection>,
    /// Whether the caller supplied any credential. Picks which of the
    /// two stable user-facing messages applies.
    pub credential_present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    Granted(RepositoryAuthorization),
    Denied(AuthFailure),
}

/// Evaluates strategies in a fixed priority order.
///
/// Evaluation is strictly sequential: each result gates whether the
/// next strategy runs. The first `Granted` wins; the first `Rejected`
/// stops the chain, taking precedence over any weaker fallback the
/// caller did not intend to use.
pub struct AuthenticationChain {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthenticationChain {
    pub fn new(strategies: Vec<Box<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    /// The production order: explicit strong-typed tokens outrank the
    /// implicit/tokenless path, and purely-local checks run before
    /// anything that calls out to an external verifier.
    pub fn standard(
        store: Arc<dyn CredentialStore>,
        oidc: Arc<dyn OidcVerifier>,
        global_tokens: HashMap<String, Service>,
    ) -> Self {
        Self::new(vec![
            Box::new(RepositoryTokenStrategy::new(store.clone())),
            Box::new(OrgTokenStrategy::new(store.clone())),
            Box::new(GithubOidcStrategy::new(oidc)),
            Box::new(LegacyTokenStrategy::new(store.clone())),
            Box::new(GlobalTokenStrategy::new(store.clone(), global_tokens)),
            Box::new(TokenlessStrategy::new(store)),
        ])
    }

    pub async fn authenticate(
        &self,
        request: &UploadRequest,
    ) -> Result<ChainOutcome, StoreError> {
        for strategy in &self.strategies {
            match strategy.attempt(request).await? {
                AuthOutcome::Granted(authorization) => {
                    tracing::debug!(strategy = strategy.name(), "authentication granted");
                    return Ok(ChainOutcome::Granted(authorization));
                }
                AuthOutcome::Rejected(rejection) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        reason = %rejection,
                        "authentication rejected"
                    );
                    return Ok(ChainOutcome::Denied(AuthFailure {
                        rejection: Some(rejection),
                        credential_present: request.has_credential(),
                    }));
                }
                AuthOutcome::NotApplicable => continue,
            }
        }

        Ok(ChainOutcome::Denied(AuthFailure {
            rejection: None,
            credential_present: request.has_credential(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(AuthOutcome);

    #[async_trait]
    impl AuthStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn attempt(&self, _request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
            Ok(self.0.clone())
        }
    }

    fn request() -> UploadRequest {
        UploadRequest::new(http::Method::POST, "/upload").with_authorization("tok")
    }

    #[tokio::test]
    async fn rejection_short_circuits_later_strategies() {
        let rejection = AuthRejection::InvalidCredential("expired");
        let chain = AuthenticationChain::new(vec![
            Box::new(Fixed(AuthOutcome::NotApplicable)),
            Box::new(Fixed(AuthOutcome::Rejected(rejection.clone()))),
            Box::new(Fixed(AuthOutcome::Granted(
                crate::auth::types::RepositoryAuthorization::new(
                    crate::auth::types::Principal::Owner(crate::models::Owner {
                        ownerid: 1,
                        service: crate::models::Service::Github,
                        username: "acme".to_string(),
                    }),
                    vec![crate::models::TokenType::Upload],
                    crate::auth::types::RepositoryScope::OwnedBy { owner_id: 1 },
                ),
            ))),
        ]);

        match chain.authenticate(&request()).await.unwrap() {
            ChainOutcome::Denied(failure) => {
                assert_eq!(failure.rejection, Some(rejection));
                assert!(failure.credential_present);
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exhaustion_yields_generic_failure() {
        let chain = AuthenticationChain::new(vec![
            Box::new(Fixed(AuthOutcome::NotApplicable)),
            Box::new(Fixed(AuthOutcome::NotApplicable)),
        ]);

        match chain.authenticate(&request()).await.unwrap() {
            ChainOutcome::Denied(failure) => assert_eq!(failure.rejection, None),
            other => panic!("expected denial, got {other:?}"),
        }
    }
}
