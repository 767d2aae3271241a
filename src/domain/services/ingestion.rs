use crate::domain::models::tenant::Tenant;
use crate::domain::ports::{ObjectStore, RepoHost, TenantRepository};
use crate::domain::services::naming::DEFAULT_CATEGORY;
use crate::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct IngestReceipt {
    pub path: String,
    pub repo: String,
    pub bucket_provisioned: bool,
}

/// Accepts uploaded files, writes them into the tenant's source
/// repository, and lazily materializes the object-storage bucket on the
/// first upload. The repository write is the primary record: it is fatal
/// on failure, while bucket creation failing only defers to the next
/// upload.
pub struct IngestionService {
    tenant_repo: Arc<dyn TenantRepository>,
    repo_host: Arc<dyn RepoHost>,
    object_store: Arc<dyn ObjectStore>,
    // Per-tenant serialization of the external bucket create, so racing
    // first uploads on this node make exactly one provider call. The
    // persisted flag (CAS in the store) remains the durable guard.
    bucket_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IngestionService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        repo_host: Arc<dyn RepoHost>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            tenant_repo,
            repo_host,
            object_store,
            bucket_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn ingest(
        &self,
        tenant: &Tenant,
        category: Option<&str>,
        filename: &str,
        content: &[u8],
    ) -> Result<IngestReceipt, AppError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(AppError::Validation("filename is required".into()));
        }
        if filename.contains('/') || filename.starts_with('.') {
            return Err(AppError::Validation("invalid filename".into()));
        }
        let category = match category.map(str::trim) {
            None | Some("") => DEFAULT_CATEGORY,
            Some(c) if c.contains('/') || c.contains("..") => {
                return Err(AppError::Validation("invalid category".into()));
            }
            Some(c) => c,
        };

        let repo = tenant
            .repo_reference()
            .ok_or_else(|| AppError::Conflict("tenant has no provisioned repository".into()))?;

        let path = format!("{}/{}", category, filename);
        self.repo_host
            .put_file(&repo.owner, &repo.name, &path, content)
            .await?;
        info!(tenant_id = %tenant.id, path = %path, "file written to repository");

        let bucket_provisioned = if tenant.bucket_provisioned {
            true
        } else {
            self.provision_bucket_once(tenant).await
        };

        Ok(IngestReceipt {
            path,
            repo: repo.name,
            bucket_provisioned,
        })
    }

    /// Lazy bucket creation. Never fails the upload: errors are logged and
    /// the flag stays false so the next upload retries.
    async fn provision_bucket_once(&self, tenant: &Tenant) -> bool {
        match self.try_provision_bucket(tenant).await {
            Ok(()) => true,
            Err(e) => {
                warn!(tenant_id = %tenant.id, bucket = %tenant.bucket_name,
                      "bucket provisioning deferred to a later upload: {}", e);
                false
            }
        }
    }

    async fn try_provision_bucket(&self, tenant: &Tenant) -> Result<(), AppError> {
        let lock = self.lock_for(&tenant.id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a racing upload may have finished the
        // job while this one waited.
        let fresh = self
            .tenant_repo
            .find_by_id(&tenant.id)
            .await?
            .ok_or_else(|| AppError::NotFound("tenant disappeared".into()))?;
        if fresh.bucket_provisioned {
            return Ok(());
        }

        self.object_store
            .provision_bucket(&fresh.bucket_name, &fresh.id)
            .await?;

        let won = self.tenant_repo.mark_bucket_provisioned(&fresh.id).await?;
        if !won {
            warn!(tenant_id = %fresh.id, "bucket flag was already set by a concurrent request");
        }
        info!(tenant_id = %fresh.id, bucket = %fresh.bucket_name, "bucket provisioned");

        self.forget_lock(&tenant.id);
        Ok(())
    }

    fn lock_for(&self, tenant_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.bucket_locks.lock().expect("bucket lock map poisoned");
        locks
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn forget_lock(&self, tenant_id: &str) {
        let mut locks = self.bucket_locks.lock().expect("bucket lock map poisoned");
        locks.remove(tenant_id);
    }
}
