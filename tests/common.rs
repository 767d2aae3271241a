use onboarding_backend::{
    api::router::create_router,
    config::{B2Config, Config, GithubConfig},
    domain::models::tenant::{AccountingSnapshot, RepoReference, Tenant},
    domain::ports::{EmailService, ObjectStore, RepoHost, TenantRepository},
    domain::services::ingestion::IngestionService,
    domain::services::onboarding::OnboardingService,
    error::AppError,
    infra::repositories::sqlite_tenant_repo::SqliteTenantRepo,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tera::Tera;
use tower::ServiceExt;
use uuid::Uuid;

/// Records provisioning and file-write calls so tests can assert on call
/// counts and written paths without any network.
#[derive(Default)]
pub struct MockRepoHost {
    pub fail_provision: AtomicBool,
    pub fail_put: AtomicBool,
    pub provision_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub files: Mutex<Vec<String>>,
}

#[async_trait]
impl RepoHost for MockRepoHost {
    async fn provision(&self, logical_name: &str, _owner_email: &str) -> Result<RepoReference, AppError> {
        self.provision_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_provision.load(Ordering::SeqCst) {
            return Err(AppError::Provider("simulated hosting outage".into()));
        }
        Ok(RepoReference {
            url: format!("https://github.example/acme-org/{}", logical_name),
            owner: "acme-org".to_string(),
            name: logical_name.to_string(),
        })
    }

    async fn put_file(&self, owner: &str, repo: &str, path: &str, _content: &[u8]) -> Result<(), AppError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::Provider("simulated write failure".into()));
        }
        self.files
            .lock()
            .unwrap()
            .push(format!("{}/{}/{}", owner, repo, path));
        Ok(())
    }
}

/// `fail` simulates either missing credentials or a provider outage; both
/// must leave the tenant usable in repository-only mode.
#[derive(Default)]
pub struct MockObjectStore {
    pub fail: AtomicBool,
    pub create_calls: AtomicUsize,
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn provision_bucket(&self, _bucket_name: &str, _tenant_id: &str) -> Result<(), AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Configuration(
                "object storage credentials are not configured".into(),
            ));
        }
        Ok(())
    }
}

pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, _recipient: &str, _subject: &str, _html_body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Delegating store wrapper that reports an api-key unique violation for
/// the first `remaining_collisions` inserts, to drive the orchestrator's
/// reissue loop.
pub struct CollidingTenantRepo {
    inner: Arc<dyn TenantRepository>,
    pub remaining_collisions: AtomicUsize,
    pub create_calls: AtomicUsize,
}

#[allow(dead_code)]
impl CollidingTenantRepo {
    pub fn new(inner: Arc<dyn TenantRepository>, collisions: usize) -> Self {
        Self {
            inner,
            remaining_collisions: AtomicUsize::new(collisions),
            create_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TenantRepository for CollidingTenantRepo {
    async fn create(
        &self,
        tenant: &Tenant,
    ) -> Result<Tenant, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .remaining_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(AppError::CredentialCollision);
        }
        self.inner.create(tenant).await
    }

    async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Tenant>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Tenant>, AppError> {
        self.inner.find_by_api_key(api_key).await
    }

    async fn list(
        &self,
    ) -> Result<Vec<Tenant>, AppError> {
        self.inner.list().await
    }

    async fn set_repo_reference(&self, id: &str, repo: &RepoReference) -> Result<bool, AppError> {
        self.inner.set_repo_reference(id, repo).await
    }

    async fn mark_bucket_provisioned(&self, id: &str) -> Result<bool, AppError> {
        self.inner.mark_bucket_provisioned(id).await
    }

    async fn update_accounting(
        &self,
        id: &str,
        snapshot: &AccountingSnapshot,
    ) -> Result<Tenant, AppError> {
        self.inner.update_accounting(id, snapshot).await
    }
}

/// A migrated throwaway SQLite database for tests that drive the store or
/// services directly, without a full `TestApp`.
pub struct TestDb {
    pub pool: Pool<Sqlite>,
    db_filename: String,
}

#[allow(dead_code)]
impl TestDb {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        Self { pool, db_filename }
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub repo_host: Arc<MockRepoHost>,
    pub object_store: Arc<MockObjectStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mocks(
            Arc::new(MockRepoHost::default()),
            Arc::new(MockObjectStore::default()),
        )
        .await
    }

    pub async fn with_mocks(
        repo_host: Arc<MockRepoHost>,
        object_store: Arc<MockObjectStore>,
    ) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template("welcome.html", "<html>Bienvenido {{ name }}: {{ api_key }}</html>")
            .unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            github: GithubConfig {
                token: Some("test-token".to_string()),
                org: "acme-org".to_string(),
                api_base: "http://localhost".to_string(),
            },
            b2: B2Config {
                key_id: None,
                app_key: None,
                api_base: "http://localhost".to_string(),
            },
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            trial_days: 7,
            monthly_price: 29.99,
        };

        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(SqliteTenantRepo::new(pool.clone()));

        let onboarding = Arc::new(OnboardingService::new(
            tenant_repo.clone(),
            repo_host.clone(),
            Arc::new(MockEmailService),
            templates,
            config.trial_days,
            config.monthly_price,
        ));
        let ingestion = Arc::new(IngestionService::new(
            tenant_repo.clone(),
            repo_host.clone(),
            object_store.clone(),
        ));

        let state = Arc::new(AppState {
            config,
            tenant_repo,
            onboarding,
            ingestion,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            repo_host,
            object_store,
        }
    }

    #[allow(dead_code)]
    pub async fn create_tenant(&self, name: &str, email: &str) -> serde_json::Value {
        let payload = serde_json::json!({ "name": name, "email": email });
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tenants")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(
            status.is_success(),
            "tenant creation failed: status {}, body {:?}",
            status,
            String::from_utf8_lossy(&bytes)
        );
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Builds a multipart/form-data body by hand: an optional `category` text
/// field plus one `file` part.
#[allow(dead_code)]
pub fn multipart_upload(
    category: Option<&str>,
    filename: &str,
    content: &[u8],
) -> (String, Vec<u8>) {
    let boundary = format!("----test-boundary-{}", Uuid::new_v4().simple());
    let mut body: Vec<u8> = Vec::new();

    if let Some(category) = category {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{}\r\n",
                boundary, category
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            boundary, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let content_type = format!("multipart/form-data; boundary={}", boundary);
    (content_type, body)
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
