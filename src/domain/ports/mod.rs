use crate::domain::models::tenant::{AccountingSnapshot, RepoReference, Tenant};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Inserts a full tenant stub. Unique violations come back as
    /// `AppError::Conflict` (email) or `AppError::CredentialCollision`
    /// (api key), so callers can tell "already registered" from "reissue
    /// the credential".
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError>;
    async fn list(&self) -> Result<Vec<Tenant>, AppError>;
    /// Writes the repository reference only if none is recorded yet.
    /// Returns false when an earlier attempt already set it.
    async fn set_repo_reference(&self, id: &str, repo: &RepoReference) -> Result<bool, AppError>;
    /// Compare-and-update flip of the bucket flag. Returns true only for
    /// the caller that actually transitioned false -> true.
    async fn mark_bucket_provisioned(&self, id: &str) -> Result<bool, AppError>;
    async fn update_accounting(&self, id: &str, snapshot: &AccountingSnapshot) -> Result<Tenant, AppError>;
}

#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Creates a private repository named after `logical_name` and seeds
    /// the accounting folder taxonomy. `owner_email` only goes into the
    /// repository description; the effective owner is resolved from the
    /// provider.
    async fn provision(&self, logical_name: &str, owner_email: &str) -> Result<RepoReference, AppError>;
    /// Writes (or overwrites, last-write-wins) a file at `path`.
    async fn put_file(&self, owner: &str, repo: &str, path: &str, content: &[u8]) -> Result<(), AppError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates the tenant's private bucket and seeds its prefix layout.
    async fn provision_bucket(&self, bucket_name: &str, tenant_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
