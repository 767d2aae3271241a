use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{CreateTenantRequest, UpdateAccountingRequest},
    responses::{TenantCreatedResponse, TenantStatusResponse, TenantSummary},
};
use crate::api::extractors::auth::AuthTenant;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Runs detached: a client disconnect must not abort provisioning
    // mid-flight and leave an external resource unrecorded.
    let onboarding = state.onboarding.clone();
    let (tenant, repo) = tokio::spawn(async move {
        onboarding
            .create_tenant(payload.name, payload.email, payload.phone)
            .await
    })
    .await
    .map_err(|_| AppError::Internal)??;

    info!("Tenant created: {}", tenant.id);

    Ok((
        StatusCode::CREATED,
        Json(TenantCreatedResponse {
            tenant_id: tenant.id,
            api_key: tenant.api_key,
            repo_url: repo.url,
            bucket_name: tenant.bucket_name,
            bucket_status: "pending_first_upload".to_string(),
            trial_days: state.config.trial_days,
            expires_at: tenant.expires_at,
        }),
    ))
}

pub async fn get_current_tenant(tenant: AuthTenant) -> Result<impl IntoResponse, AppError> {
    Ok(Json(tenant.0))
}

pub async fn get_status(tenant: AuthTenant) -> Result<impl IntoResponse, AppError> {
    let t = tenant.0;
    let days_remaining = t.days_remaining();

    Ok(Json(TenantStatusResponse {
        active: days_remaining > 0,
        status: t.status,
        days_remaining,
        expires_at: t.expires_at,
        repo_url: t.repo_url,
        bucket_name: t.bucket_name,
        bucket_provisioned: t.bucket_provisioned,
    }))
}

pub async fn update_accounting(
    State(state): State<Arc<AppState>>,
    tenant: AuthTenant,
    Json(payload): Json<UpdateAccountingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = tenant.0;
    let mut snapshot = current.accounting();

    if let Some(v) = payload.current_assets {
        snapshot.current_assets = v;
    }
    if let Some(v) = payload.non_current_assets {
        snapshot.non_current_assets = v;
    }
    if let Some(v) = payload.current_liabilities {
        snapshot.current_liabilities = v;
    }
    if let Some(v) = payload.non_current_liabilities {
        snapshot.non_current_liabilities = v;
    }
    if let Some(v) = payload.net_equity {
        snapshot.net_equity = v;
    }

    let updated = state.tenant_repo.update_accounting(&current.id, &snapshot).await?;
    info!("Accounting updated for tenant: {}", updated.id);
    Ok(Json(updated.accounting()))
}

// TODO: admin authentication for this listing.
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenant_repo.list().await?;
    let summaries: Vec<TenantSummary> = tenants.iter().map(TenantSummary::from).collect();
    Ok(Json(summaries))
}
