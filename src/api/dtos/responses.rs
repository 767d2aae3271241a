use crate::domain::models::tenant::Tenant;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct TenantCreatedResponse {
    pub tenant_id: String,
    pub api_key: String,
    pub repo_url: String,
    pub bucket_name: String,
    /// The bucket is materialized lazily, on the first file upload.
    pub bucket_status: String,
    pub trial_days: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct TenantStatusResponse {
    pub active: bool,
    pub status: String,
    pub days_remaining: i64,
    pub expires_at: DateTime<Utc>,
    pub repo_url: Option<String>,
    pub bucket_name: String,
    pub bucket_provisioned: bool,
}

#[derive(Serialize)]
pub struct TenantSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub repo_url: Option<String>,
    pub bucket_provisioned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Tenant> for TenantSummary {
    fn from(t: &Tenant) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            email: t.email.clone(),
            status: t.status.clone(),
            repo_url: t.repo_url.clone(),
            bucket_provisioned: t.bucket_provisioned,
            created_at: t.created_at,
        }
    }
}
