//! Tokenless upload support: untrusted-path resolution and CI-provider
//! build verification.

pub mod circleci;
pub mod path;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Service;

pub use circleci::CircleCiVerifier;
pub use path::{TokenlessClaim, TokenlessPathResolver};

#[derive(Debug, Error)]
pub enum VerificationError {
    /// Could not reach the CI provider's API (connectivity or timeout).
    #[error("unable to reach the CI provider: {0}")]
    ProviderUnreachable(String),

    /// The provider answered but the build does not vouch for the
    /// claimed upload.
    #[error("{0}")]
    BuildMismatch(&'static str),

    #[error("missing \"{0}\" argument, please upload with the repository upload token")]
    MissingParameter(&'static str),

    #[error("no verifier registered for CI service: {0}")]
    UnsupportedProvider(String),
}

/// What a CI-verified upload claims about the build it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CiBuildClaim {
    pub build: String,
    pub owner: String,
    pub repo: String,
    pub commit: String,
}

/// Per-CI-provider verification: independently confirm that a running
/// build matches the claimed commit, returning the VCS provider the
/// build reports. Implementations make their own outbound call and must
/// honor the configured timeout, treating it as a connectivity failure.
#[async_trait]
pub trait CiVerifier: Send + Sync {
    /// Wire name of the CI service this verifier handles, e.g. "circleci".
    fn ci_service(&self) -> &'static str;

    async fn verify(&self, claim: &CiBuildClaim) -> Result<Service, VerificationError>;
}

/// Route a claim to the verifier registered for the claimed CI service.
///
/// Consumed by the CI-verified upload flow, where a caller names its
/// running build instead of presenting a credential. That endpoint
/// lives in the upload ingestion surface, not behind the credential
/// chain in this service.
pub async fn verify_ci_upload(
    ci_service: &str,
    claim: &CiBuildClaim,
    verifiers: &[Arc<dyn CiVerifier>],
) -> Result<Service, VerificationError> {
    let verifier = verifiers
        .iter()
        .find(|v| v.ci_service() == ci_service)
        .ok_or_else(|| VerificationError::UnsupportedProvider(ci_service.to_string()))?;
    verifier.verify(claim).await
}
