use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use crate::domain::models::tenant::Tenant;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::Span;

/// Resolves the calling tenant from `Authorization: Bearer <api_key>`.
/// Unknown and malformed keys are rejected identically, so callers learn
/// nothing about key format.
pub struct AuthTenant(pub Tenant);

impl<S> FromRequestParts<S> for AuthTenant
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_val = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        let api_key = header_val
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();
        if api_key.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let tenant = app_state
            .tenant_repo
            .find_by_api_key(api_key)
            .await
            .map_err(|_| AppError::Internal)?
            .ok_or(AppError::Unauthorized)?;

        Span::current().record("tenant_id", &tenant.id);

        Ok(AuthTenant(tenant))
    }
}
