use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Partial update: omitted fields keep their stored value.
#[derive(Deserialize)]
pub struct UpdateAccountingRequest {
    pub current_assets: Option<f64>,
    pub non_current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub non_current_liabilities: Option<f64>,
    pub net_equity: Option<f64>,
}
