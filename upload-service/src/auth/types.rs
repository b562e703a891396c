use crate::models::{Owner, Repository, TokenType};

/// Who the authorization acts as for downstream auditing. The upload
/// path never authenticates a human, so the variants are the repository
/// acting as its own uploader and the organization behind an org token.
/// Consumers pattern-match instead of probing attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Repository(Repository),
    Owner(Owner),
}

impl Principal {
    pub fn display_name(&self) -> String {
        match self {
            Principal::Repository(repo) => repo.slug(),
            Principal::Owner(owner) => owner.username.clone(),
        }
    }
}

/// The set of repositories an authorization covers.
///
/// Org tokens use the `OwnedBy` form: an organization may own thousands
/// of repositories, so the set is a predicate to compose into store-side
/// queries, never an eagerly materialized list.
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryScope {
    Exact(Vec<Repository>),
    OwnedBy { owner_id: i64 },
}

impl RepositoryScope {
    pub fn allows(&self, repository: &Repository) -> bool {
        match self {
            RepositoryScope::Exact(repos) => {
                repos.iter().any(|r| r.repoid == repository.repoid)
            }
            RepositoryScope::OwnedBy { owner_id } => repository.owner_id == *owner_id,
        }
    }

    /// The owner id to push into a store query, for the lazy org form.
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            RepositoryScope::Exact(_) => None,
            RepositoryScope::OwnedBy { owner_id } => Some(*owner_id),
        }
    }
}

/// Result of a successful authentication: principal, granted scopes,
/// and the repositories the principal may act upon. Created per request
/// and discarded with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryAuthorization {
    principal: Principal,
    scopes: Vec<TokenType>,
    repositories: RepositoryScope,
}

impl RepositoryAuthorization {
    pub fn new(principal: Principal, scopes: Vec<TokenType>, repositories: RepositoryScope) -> Self {
        debug_assert!(!scopes.is_empty(), "an authorization carries at least one scope");
        Self {
            principal,
            scopes,
            repositories,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn scopes(&self) -> &[TokenType] {
        &self.scopes
    }

    pub fn repositories(&self) -> &RepositoryScope {
        &self.repositories
    }

    pub fn allows_repo(&self, repository: &Repository) -> bool {
        self.repositories.allows(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;

    fn repo(repoid: i64, owner_id: i64) -> Repository {
        Repository {
            repoid,
            service: Service::Github,
            owner_id,
            owner_username: "acme".to_string(),
            name: format!("repo-{repoid}"),
            private: false,
            active: true,
            upload_token: None,
        }
    }

    #[test]
    fn exact_scope_matches_by_repository_id() {
        let scope = RepositoryScope::Exact(vec![repo(1, 10)]);
        assert!(scope.allows(&repo(1, 10)));
        assert!(!scope.allows(&repo(2, 10)));
        assert_eq!(scope.owner_id(), None);
    }

    #[test]
    fn owned_by_scope_is_exactly_owner_equality() {
        let scope = RepositoryScope::OwnedBy { owner_id: 10 };
        assert!(scope.allows(&repo(1, 10)));
        assert!(scope.allows(&repo(999, 10)));
        assert!(!scope.allows(&repo(1, 11)));
        assert_eq!(scope.owner_id(), Some(10));
    }
}
