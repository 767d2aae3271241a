use crate::config::Config;
use crate::domain::ports::TenantRepository;
use crate::domain::services::ingestion::IngestionService;
use crate::domain::services::onboarding::OnboardingService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub onboarding: Arc<OnboardingService>,
    pub ingestion: Arc<IngestionService>,
}
