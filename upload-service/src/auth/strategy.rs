use async_trait::async_trait;
use thiserror::Error;

use crate::store::StoreError;

use super::request::UploadRequest;
use super::types::RepositoryAuthorization;

/// Terminal reason a strategy refused the request. Reasons are for
/// logging only; the presenter collapses them to stable user messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// A credential in this strategy's format was supplied but is
    /// malformed, unknown, expired, or bound to an inactive repository.
    #[error("invalid credential: {0}")]
    InvalidCredential(&'static str),

    /// Tokenless path resolution or policy refused the upload. One
    /// fixed reason regardless of cause, so a caller cannot probe which
    /// repositories exist.
    #[error("{0}")]
    TokenlessDenied(&'static str),

    /// An external verifier (OIDC, CI provider) failed.
    #[error("external verification failed: {0}")]
    ExternalVerificationFailed(String),
}

/// Three-way outcome of one strategy.
///
/// `NotApplicable` means the credential format did not match and the
/// chain should try the next strategy; `Rejected` means the format
/// matched but verification failed, so the chain must stop rather than
/// fall through to a weaker scheme.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Granted(RepositoryAuthorization),
    NotApplicable,
    Rejected(AuthRejection),
}

/// One concrete credential scheme; the atomic unit of the chain.
///
/// Strategies hold no mutable state and may be shared across requests.
/// Expected failures come back as `AuthOutcome`; only infrastructure
/// problems (store unreachable) surface as `Err`.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError>;
}
