use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, PgPool, SqlitePool};
use tera::Tera;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{EmailService, ObjectStore, RepoHost, TenantRepository};
use crate::domain::services::ingestion::IngestionService;
use crate::domain::services::onboarding::OnboardingService;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::hosting::github_repo_host::GithubRepoHost;
use crate::infra::repositories::{
    postgres_tenant_repo::PostgresTenantRepo, sqlite_tenant_repo::SqliteTenantRepo,
};
use crate::infra::storage::b2_object_store::B2ObjectStore;
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repo_host: Arc<dyn RepoHost> = Arc::new(GithubRepoHost::new(config.github.clone()));
    let object_store: Arc<dyn ObjectStore> = Arc::new(B2ObjectStore::new(config.b2.clone()));
    let email_service: Arc<dyn EmailService> = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let mut tera = Tera::default();
    tera.add_raw_template("welcome.html", include_str!("../templates/welcome.html"))
        .expect("Failed to load welcome template");
    let templates = Arc::new(tera);

    let tenant_repo: Arc<dyn TenantRepository> =
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            info!("Initializing PostgreSQL connection...");

            let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
            opts = opts
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect_with(opts)
                .await
                .expect("Failed to connect to Postgres");

            run_postgres_migrations(&pool).await;
            Arc::new(PostgresTenantRepo::new(pool))
        } else {
            info!("Initializing SQLite connection with WAL Mode...");

            let opts = SqliteConnectOptions::from_str(database_url)
                .expect("Invalid SQLite connection string")
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await
                .expect("Failed to connect to SQLite");

            run_sqlite_migrations(&pool).await;
            Arc::new(SqliteTenantRepo::new(pool))
        };

    let onboarding = Arc::new(OnboardingService::new(
        tenant_repo.clone(),
        repo_host.clone(),
        email_service,
        templates,
        config.trial_days,
        config.monthly_price,
    ));
    let ingestion = Arc::new(IngestionService::new(
        tenant_repo.clone(),
        repo_host,
        object_store,
    ));

    AppState {
        config: config.clone(),
        tenant_repo,
        onboarding,
        ingestion,
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
