use crate::domain::models::tenant::{AccountingSnapshot, RepoReference, Tenant};
use crate::domain::ports::TenantRepository;
use crate::error::AppError;
use crate::infra::repositories::map_tenant_insert_error;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresTenantRepo {
    pool: PgPool,
}

impl PostgresTenantRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepo {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, name, email, phone, api_key, repo_url, repo_owner, repo_name, \
             bucket_name, bucket_provisioned, status, created_at, expires_at, monthly_price, \
             current_assets, non_current_assets, current_liabilities, non_current_liabilities, net_equity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING *",
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
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE api_key = $1")
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
            "UPDATE tenants SET repo_url = $1, repo_owner = $2, repo_name = $3 \
             WHERE id = $4 AND repo_url IS NULL",
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
            "UPDATE tenants SET bucket_provisioned = TRUE \
             WHERE id = $1 AND bucket_provisioned = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_accounting(&self, id: &str, snapshot: &AccountingSnapshot) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET current_assets = $1, non_current_assets = $2, \
             current_liabilities = $3, non_current_liabilities = $4, net_equity = $5 \
             WHERE id = $6 RETURNING *",
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
