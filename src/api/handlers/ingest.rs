use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use crate::api::extractors::auth::AuthTenant;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn ingest_file(
    State(state): State<Arc<AppState>>,
    tenant: AuthTenant,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut category: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("malformed multipart body".into()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("category") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("could not read category field".into()))?;
                category = Some(value);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("could not read file field".into()))?;
                file = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::Validation("file field is required".into()))?;

    // Runs detached: a client disconnect must not abort the repository
    // write or bucket creation mid-flight.
    let ingestion = state.ingestion.clone();
    let receipt = tokio::spawn(async move {
        ingestion
            .ingest(&tenant.0, category.as_deref(), &filename, &data)
            .await
    })
    .await
    .map_err(|_| AppError::Internal)??;

    Ok(Json(receipt))
}
