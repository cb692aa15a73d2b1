mod client;
mod error;
mod identity;

pub use client::{GithubClient, RepoFile};
pub use error::GithubError;
pub use identity::ProjectIdentity;
