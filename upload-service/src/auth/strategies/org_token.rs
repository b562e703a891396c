use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::request::UploadRequest;
use crate::auth::strategy::{AuthOutcome, AuthRejection, AuthStrategy};
use crate::auth::types::{Principal, RepositoryAuthorization, RepositoryScope};
use crate::store::{CredentialStore, StoreError};

/// Organization-level token: a UUID-shaped bearer checked against the
/// org-token table.
///
/// A UUID that matches no org token is `NotApplicable`, not a
/// rejection: the same shape legitimately appears in the legacy
/// per-repository scheme further down the chain. Only an expired org
/// token is terminal.
pub struct OrgTokenStrategy {
    store: Arc<dyn CredentialStore>,
}

impl OrgTokenStrategy {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthStrategy for OrgTokenStrategy {
    fn name(&self) -> &'static str {
        "org_level_token"
    }

    async fn attempt(&self, request: &UploadRequest) -> Result<AuthOutcome, StoreError> {
        let Some(raw) = request.bearer_token() else {
            return Ok(AuthOutcome::NotApplicable);
        };
        let Ok(token) = Uuid::parse_str(raw) else {
            return Ok(AuthOutcome::NotApplicable);
        };

        let Some((record, owner)) = self.store.org_token(token).await? else {
            return Ok(AuthOutcome::NotApplicable);
        };

        if record.is_expired(Utc::now()) {
            return Ok(AuthOutcome::Rejected(AuthRejection::InvalidCredential(
                "organization token expired",
            )));
        }

        Ok(AuthOutcome::Granted(RepositoryAuthorization::new(
            Principal::Owner(owner),
            vec![record.token_type],
            RepositoryScope::OwnedBy {
                owner_id: record.owner_id,
            },
        )))
    }
}
