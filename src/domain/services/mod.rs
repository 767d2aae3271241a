pub mod credentials;
pub mod ingestion;
pub mod naming;
pub mod onboarding;
