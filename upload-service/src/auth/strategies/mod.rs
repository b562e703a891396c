pub mod global;
pub mod legacy;
pub mod oidc;
pub mod org_token;
pub mod repo_token;
pub mod tokenless;

pub use global::GlobalTokenStrategy;
pub use legacy::LegacyTokenStrategy;
pub use oidc::GithubOidcStrategy;
pub use org_token::OrgTokenStrategy;
pub use repo_token::RepositoryTokenStrategy;
pub use tokenless::TokenlessStrategy;
