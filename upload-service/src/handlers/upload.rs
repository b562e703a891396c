use std::collections::HashMap;

use service_core::axum::extract::State;
use service_core::axum::Json;
use service_core::error::AppError;

use crate::auth::chain::ChainOutcome;
use crate::auth::presenter;
use crate::auth::request::UploadRequest;
use crate::auth::types::RepositoryScope;
use crate::store::StoreError;
use crate::AppState;

/// Upload bodies are small JSON envelopes; anything bigger is not a
/// legitimate upload request.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Authenticates an upload request against the credential chain.
///
/// The whole request is consumed here because credentials arrive on
/// three surfaces: the Authorization header, the `token` query
/// parameter, and (for the tokenless branch check) the JSON body.
pub async fn authorize_upload(
    State(state): State<AppState>,
    request: service_core::axum::extract::Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let (parts, body) = request.into_parts();

    let mut upload_request = UploadRequest::new(parts.method, parts.uri.path());

    if let Some(value) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        upload_request = upload_request.with_authorization(value);
    }

    if let Some(query) = parts.uri.query() {
        let params: HashMap<String, String> =
            serde_urlencoded::from_str(query).unwrap_or_default();
        for (key, value) in params {
            upload_request = upload_request.with_query_param(key, value);
        }
    }

    let body = service_core::axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("unreadable request body: {e}")))?;
    upload_request = upload_request.with_body(body.to_vec());

    match state.chain.authenticate(&upload_request).await {
        Ok(ChainOutcome::Granted(authorization)) => {
            let repositories = match authorization.repositories() {
                RepositoryScope::Exact(repos) => serde_json::json!({
                    "repositories": repos.iter().map(|r| r.slug()).collect::<Vec<_>>(),
                }),
                RepositoryScope::OwnedBy { owner_id } => serde_json::json!({
                    "organization_id": owner_id,
                }),
            };

            Ok(Json(serde_json::json!({
                "principal": authorization.principal().display_name(),
                "scopes": authorization.scopes(),
                "access": repositories,
            })))
        }
        Ok(ChainOutcome::Denied(failure)) => {
            let (_, message) = presenter::present(&failure);
            Err(AppError::AuthError(anyhow::anyhow!(message)))
        }
        Err(StoreError::Unavailable(reason)) => {
            tracing::error!(error = %reason, "credential store unavailable");
            Err(AppError::ServiceUnavailable)
        }
        Err(StoreError::Query(reason)) => {
            Err(AppError::InternalError(anyhow::anyhow!(reason)))
        }
    }
}
