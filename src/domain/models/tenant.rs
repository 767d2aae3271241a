use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The normalized handle for a tenant's source repository. The
/// `(owner, name)` pair, not the URL, is what later file writes key on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepoReference {
    pub url: String,
    pub owner: String,
    pub name: String,
}

/// Accounting snapshot carried on every tenant row. Mutated only through
/// the accounting-update endpoint; everything defaults to zero.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct AccountingSnapshot {
    pub current_assets: f64,
    pub non_current_assets: f64,
    pub current_liabilities: f64,
    pub non_current_liabilities: f64,
    pub net_equity: f64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub repo_url: Option<String>,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    /// Assigned at creation time; the bucket itself is only materialized
    /// on the first upload.
    pub bucket_name: String,
    pub bucket_provisioned: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub monthly_price: f64,
    pub current_assets: f64,
    pub non_current_assets: f64,
    pub current_liabilities: f64,
    pub non_current_liabilities: f64,
    pub net_equity: f64,
}

impl Tenant {
    pub fn new(
        name: String,
        email: String,
        phone: Option<String>,
        api_key: String,
        bucket_name: String,
        trial_days: i64,
        monthly_price: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            api_key,
            repo_url: None,
            repo_owner: None,
            repo_name: None,
            bucket_name,
            bucket_provisioned: false,
            status: "trial".to_string(),
            created_at: now,
            expires_at: now + Duration::days(trial_days),
            monthly_price,
            current_assets: 0.0,
            non_current_assets: 0.0,
            current_liabilities: 0.0,
            non_current_liabilities: 0.0,
            net_equity: 0.0,
        }
    }

    pub fn repo_reference(&self) -> Option<RepoReference> {
        match (&self.repo_url, &self.repo_owner, &self.repo_name) {
            (Some(url), Some(owner), Some(name)) => Some(RepoReference {
                url: url.clone(),
                owner: owner.clone(),
                name: name.clone(),
            }),
            _ => None,
        }
    }

    pub fn accounting(&self) -> AccountingSnapshot {
        AccountingSnapshot {
            current_assets: self.current_assets,
            non_current_assets: self.non_current_assets,
            current_liabilities: self.current_liabilities,
            non_current_liabilities: self.non_current_liabilities,
            net_equity: self.net_equity,
        }
    }

    pub fn days_remaining(&self) -> i64 {
        (self.expires_at - Utc::now()).num_days().max(0)
    }
}
