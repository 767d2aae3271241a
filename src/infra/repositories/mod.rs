pub mod postgres_tenant_repo;
pub mod sqlite_tenant_repo;

use crate::error::AppError;

/// Maps a unique violation on the tenants table to the error the
/// orchestrator needs: a duplicate email is a client-visible conflict, a
/// duplicate api key means "reissue and retry".
pub(crate) fn map_tenant_insert_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        let code = db_err.code().unwrap_or_default();
        // 2067 = SQLite Unique Constraint, 23505 = PostgreSQL Unique Violation
        if code == "2067" || code == "23505" {
            if db_err.message().contains("api_key") {
                return AppError::CredentialCollision;
            }
            return AppError::Conflict("email is already registered".into());
        }
    }
    AppError::Database(e)
}
