//! The repository upload authentication chain.
//!
//! Six mutually exclusive credential schemes compose into one ordered
//! fallback chain; see [`chain::AuthenticationChain::standard`] for the
//! priority order and [`strategy::AuthOutcome`] for the short-circuit
//! rules.

pub mod chain;
pub mod presenter;
pub mod request;
pub mod strategies;
pub mod strategy;
pub mod types;

pub use chain::{AuthFailure, AuthenticationChain, ChainOutcome};
pub use request::UploadRequest;
pub use strategy::{AuthOutcome, AuthRejection, AuthStrategy};
pub use types::{Principal, RepositoryAuthorization, RepositoryScope};
