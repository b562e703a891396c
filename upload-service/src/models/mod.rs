use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// VCS providers a repository can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Github,
    Gitlab,
    Bitbucket,
    GithubEnterprise,
    GitlabEnterprise,
    BitbucketServer,
}

#[derive(Debug, Error)]
#[error("unknown VCS service: {0}")]
pub struct UnknownService(pub String);

impl std::str::FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Service::Github),
            "gitlab" => Ok(Service::Gitlab),
            "bitbucket" => Ok(Service::Bitbucket),
            "github_enterprise" => Ok(Service::GithubEnterprise),
            "gitlab_enterprise" => Ok(Service::GitlabEnterprise),
            "bitbucket_server" => Ok(Service::BitbucketServer),
            _ => Err(UnknownService(s.to_string())),
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Service::Github => "github",
            Service::Gitlab => "gitlab",
            Service::Bitbucket => "bitbucket",
            Service::GithubEnterprise => "github_enterprise",
            Service::GitlabEnterprise => "gitlab_enterprise",
            Service::BitbucketServer => "bitbucket_server",
        };
        f.write_str(name)
    }
}

/// Capability tag attached to a successful authorization. Only `Upload`
/// is exercised by the upload path today; the rest are reserved scopes
/// carried by table and org tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Upload,
    Read,
    Download,
    Profiling,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenType::Upload => "upload",
            TokenType::Read => "read",
            TokenType::Download => "download",
            TokenType::Profiling => "profiling",
        };
        f.write_str(name)
    }
}

/// An organization or user that owns repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub ownerid: i64,
    pub service: Service,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub repoid: i64,
    pub service: Service,
    pub owner_id: i64,
    pub owner_username: String,
    pub name: String,
    pub private: bool,
    pub active: bool,
    /// Legacy single upload token, one per repository.
    pub upload_token: Option<Uuid>,
}

impl Repository {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner_username, self.name)
    }
}

/// Scoped per-repository token from the token table. Several of these
/// may exist for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryToken {
    pub id: i64,
    pub repository_id: i64,
    pub key: String,
    pub token_type: TokenType,
    pub valid_until: Option<DateTime<Utc>>,
}

impl RepositoryToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|t| t <= now)
    }
}

/// Token scoped to an owner/organization rather than a single repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationLevelToken {
    pub id: i64,
    pub owner_id: i64,
    pub token: Uuid,
    pub token_type: TokenType,
    pub valid_until: Option<DateTime<Utc>>,
}

impl OrganizationLevelToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|t| t <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub commitid: String,
    pub repository_id: i64,
    pub branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn service_round_trips_through_str() {
        for name in [
            "github",
            "gitlab",
            "bitbucket",
            "github_enterprise",
            "gitlab_enterprise",
            "bitbucket_server",
        ] {
            let service: Service = name.parse().unwrap();
            assert_eq!(service.to_string(), name);
        }
        assert!("travis".parse::<Service>().is_err());
    }

    #[test]
    fn token_expiry_is_inclusive_of_now() {
        let now = Utc::now();
        let token = RepositoryToken {
            id: 1,
            repository_id: 1,
            key: "abc".to_string(),
            token_type: TokenType::Upload,
            valid_until: Some(now),
        };
        assert!(token.is_expired(now));

        let later = RepositoryToken {
            valid_until: Some(now + Duration::hours(1)),
            ..token.clone()
        };
        assert!(!later.is_expired(now));

        let unbounded = RepositoryToken {
            valid_until: None,
            ..token
        };
        assert!(!unbounded.is_expired(now));
    }
}
