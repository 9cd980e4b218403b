use async_trait::async_trait;
use chrono::NaiveDate;

use crate::credential::Credential;
use crate::errors::Result;

/// The platform that issues and rotates the credential.
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    /// Client type handed to license consumers.
    type Client: Send + Sync + 'static;

    /// Build a client bound to `credential`. Does not validate the token.
    fn new_client(&self, credential: &Credential) -> Self::Client;

    /// Rotate credential `id` using `client`, requesting `new_expiry`.
    ///
    /// The old token is revoked server-side on success. Implementations must
    /// not retry internally.
    async fn rotate(&self, client: &Self::Client, id: i64, new_expiry: NaiveDate) -> Result<Credential>;
}
