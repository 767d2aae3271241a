use crate::domain::models::tenant::{RepoReference, Tenant};
use crate::domain::ports::{EmailService, RepoHost, TenantRepository};
use crate::domain::services::{credentials, naming};
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tera::Tera;
use tracing::{info, warn};

// A collision is ~2^-256 per insert; the bound only exists so a broken
// unique index cannot loop forever.
const MAX_KEY_ATTEMPTS: u32 = 3;

/// Sequences tenant creation: validate, persist the stub (with credential
/// and pre-computed bucket name), provision the source repository, then
/// record the repository reference. The stub insert happens first so the
/// email/api-key uniqueness check runs exactly once and the tenant has a
/// durable id before any external call embeds it as metadata.
pub struct OnboardingService {
    tenant_repo: Arc<dyn TenantRepository>,
    repo_host: Arc<dyn RepoHost>,
    email_service: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    trial_days: i64,
    monthly_price: f64,
}

impl OnboardingService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        repo_host: Arc<dyn RepoHost>,
        email_service: Arc<dyn EmailService>,
        templates: Arc<Tera>,
        trial_days: i64,
        monthly_price: f64,
    ) -> Self {
        Self {
            tenant_repo,
            repo_host,
            email_service,
            templates,
            trial_days,
            monthly_price,
        }
    }

    pub async fn create_tenant(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
    ) -> Result<(Tenant, RepoReference), AppError> {
        let name = name.trim().to_string();
        let email = email.trim().to_string();
        validate(&name, &email)?;

        let stub = self.persist_stub(name, email, phone).await?;
        info!(tenant_id = %stub.id, email = %stub.email, "tenant stub persisted");

        // Fatal on failure: the stub row stays behind as an
        // operator-visible orphan (its email and key are consumed), but
        // no tenant ever references a repository that does not exist.
        let logical_name = naming::repo_logical_name(&stub.name, Utc::now());
        let repo = self.repo_host.provision(&logical_name, &stub.email).await?;

        let wrote = self.tenant_repo.set_repo_reference(&stub.id, &repo).await?;
        if !wrote {
            warn!(tenant_id = %stub.id, "repository reference already recorded, keeping the existing one");
        }
        info!(tenant_id = %stub.id, repo = %repo.url, "tenant provisioned");

        self.send_welcome_email(&stub).await;

        let tenant = self
            .tenant_repo
            .find_by_id(&stub.id)
            .await?
            .ok_or(AppError::Internal)?;
        Ok((tenant, repo))
    }

    /// Inserts the tenant row, reissuing the api key if the store reports
    /// a credential collision. A duplicate email aborts immediately.
    async fn persist_stub(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
    ) -> Result<Tenant, AppError> {
        let bucket = naming::bucket_name(&name);
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let tenant = Tenant::new(
                name.clone(),
                email.clone(),
                phone.clone(),
                credentials::issue_api_key(),
                bucket.clone(),
                self.trial_days,
                self.monthly_price,
            );
            match self.tenant_repo.create(&tenant).await {
                Ok(created) => return Ok(created),
                Err(AppError::CredentialCollision) => {
                    warn!(attempt, "issued api key collided, reissuing");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::CredentialCollision)
    }

    /// Best-effort. The tenant is already provisioned; a failed welcome
    /// mail is only logged.
    async fn send_welcome_email(&self, tenant: &Tenant) {
        let mut ctx = tera::Context::new();
        ctx.insert("name", &tenant.name);
        ctx.insert("api_key", &tenant.api_key);
        ctx.insert("trial_days", &self.trial_days);

        let body = match self.templates.render("welcome.html", &ctx) {
            Ok(body) => body,
            Err(e) => {
                warn!(tenant_id = %tenant.id, "failed to render welcome email: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .email_service
            .send(&tenant.email, "¡Bienvenido a Viny2030!", &body)
            .await
        {
            warn!(tenant_id = %tenant.id, "failed to send welcome email: {}", e);
        }
    }
}

fn validate(name: &str, email: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if !plausible_email(email) {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    Ok(())
}

fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_plausibility() {
        assert!(plausible_email("a@x.com"));
        assert!(plausible_email("sur@pan.com"));
        assert!(!plausible_email("nope"));
        assert!(!plausible_email("@x.com"));
        assert!(!plausible_email("a@"));
        assert!(!plausible_email("a@nodot"));
        assert!(!plausible_email("a@.com"));
    }
}
