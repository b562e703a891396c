use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::CircleCiConfig;
use crate::models::Service;

use super::{CiBuildClaim, CiVerifier, VerificationError};

/// Relevant slice of the CircleCI v1 build payload.
#[derive(Debug, Deserialize)]
struct CircleCiBuild {
    vcs_revision: Option<String>,
    stop_time: Option<String>,
    vcs_type: Option<String>,
}

/// Verifies a claimed upload against the CircleCI API.
///
/// Connectivity failures (including the configured timeout) and
/// build-mismatch failures are classified separately for logging; both
/// surface to the caller as a failed verification.
pub struct CircleCiVerifier {
    client: reqwest::Client,
    config: CircleCiConfig,
}

impl CircleCiVerifier {
    pub fn new(config: CircleCiConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    async fn fetch_build(
        &self,
        claim: &CiBuildClaim,
        build_num: &str,
    ) -> Result<CircleCiBuild, VerificationError> {
        let url = format!(
            "{}/project/{}/{}/{}",
            self.config.api_url, claim.owner, claim.repo, build_num
        );

        let response = self
            .client
            .get(&url)
            .query(&[("circle-token", self.config.token.expose_secret().as_str())])
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                tracing::error!(
                    owner = %claim.owner,
                    repo = %claim.repo,
                    commit = %claim.commit,
                    error = %err,
                    "circleci api request failed"
                );
                VerificationError::ProviderUnreachable(err.to_string())
            })?;

        response.json().await.map_err(|err| {
            tracing::error!(
                owner = %claim.owner,
                repo = %claim.repo,
                error = %err,
                "circleci api returned an unreadable build payload"
            );
            VerificationError::ProviderUnreachable(err.to_string())
        })
    }
}

#[async_trait]
impl CiVerifier for CircleCiVerifier {
    fn ci_service(&self) -> &'static str {
        "circleci"
    }

    async fn verify(&self, claim: &CiBuildClaim) -> Result<Service, VerificationError> {
        if claim.build.is_empty() {
            return Err(VerificationError::MissingParameter("build"));
        }
        if claim.owner.is_empty() {
            return Err(VerificationError::MissingParameter("owner"));
        }
        if claim.repo.is_empty() {
            return Err(VerificationError::MissingParameter("repo"));
        }

        // Build refs arrive as "1234.5"; only the build number precedes
        // the dot.
        let build_num = claim.build.split('.').next().unwrap_or(&claim.build);
        let build = self.fetch_build(claim, build_num).await?;

        if build.vcs_revision.as_deref() != Some(claim.commit.as_str()) {
            tracing::info!(
                owner = %claim.owner,
                repo = %claim.repo,
                commit = %claim.commit,
                "circleci build does not match the claimed commit"
            );
            return Err(VerificationError::BuildMismatch(
                "commit sha does not match the CircleCI build",
            ));
        }

        if build.stop_time.is_none() {
            return Err(VerificationError::BuildMismatch(
                "build has already finished, uploads rejected",
            ));
        }

        build
            .vcs_type
            .as_deref()
            .and_then(|v| v.parse::<Service>().ok())
            .ok_or(VerificationError::BuildMismatch(
                "build reports an unknown VCS provider",
            ))
    }
}
