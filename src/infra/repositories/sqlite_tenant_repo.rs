use crate::domain::models::tenant::{AccountingSnapshot, RepoReference, Tenant};
use crate::domain::ports::TenantRepository;
use crate::error::AppError;
use crate::infra::repositories::map_tenant_insert_error;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteTenantRepo {
    pool: SqlitePool,
}

impl SqliteTenantRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for SqliteTenantRepo {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, name, email, phone, api_key, repo_url, repo_owner, repo_name, \
             bucket_name, bucket_provisioned, status, created_at, expires_at, monthly_price, \
             current_assets, non_current_assets, current_liabilities, non_current_liabilities, net_equity) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.email)
        .bind(&tenant.phone)
        .bind(&tenant.api_key)
        .bind(&tenant.repo_url)
        .bind(&tenant.repo_owner)
        .bind(&tenant.repo_name)
        .bind(&tenant.bucket_name)
        .bind(tenant.bucket_provisioned)
        .bind(&tenant.status)
        .bind(tenant.created_at)
        .bind(tenant.expires_at)
        .bind(tenant.monthly_price)
        .bind(tenant.current_assets)
        .bind(tenant.non_current_assets)
        .bind(tenant.current_liabilities)
        .bind(tenant.non_current_liabilities)
        .bind(tenant.net_equity)
        .fetch_one(&self.pool)
        .await
        .map_err(map_tenant_insert_error)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE api_key = ?")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_repo_reference(&self, id: &str, repo: &RepoReference) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tenants SET repo_url = ?, repo_owner = ?, repo_name = ? \
             WHERE id = ? AND repo_url IS NULL",
        )
        .bind(&repo.url)
        .bind(&repo.owner)
        .bind(&repo.name)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_bucket_provisioned(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tenants SET bucket_provisioned = 1 \
             WHERE id = ? AND bucket_provisioned = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_accounting(&self, id: &str, snapshot: &AccountingSnapshot) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET current_assets = ?, non_current_assets = ?, \
             current_liabilities = ?, non_current_liabilities = ?, net_equity = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(snapshot.current_assets)
        .bind(snapshot.non_current_assets)
        .bind(snapshot.current_liabilities)
        .bind(snapshot.non_current_liabilities)
        .bind(snapshot.net_equity)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
