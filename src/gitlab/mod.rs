//! GitLab REST access: the token-bound client used for license reads and the
//! authority that rotates personal access tokens.

pub mod authority;
pub mod client;
pub mod error;

pub use authority::GitLabAuthority;
pub use client::{GitLabClient, GitLabLicense, Licensee};
pub use error::GitLabError;
