use std::env;

/// Source-hosting credentials. `token` being `None` means repository
/// provisioning is not deployed; the provisioner reports that as a
/// configuration error before touching the network.
#[derive(Clone)]
pub struct GithubConfig {
    pub token: Option<String>,
    pub org: String,
    pub api_base: String,
}

/// Object-storage credentials. Absence is tolerated: tenants then run in
/// repository-only mode and bucket creation is retried on later uploads.
#[derive(Clone)]
pub struct B2Config {
    pub key_id: Option<String>,
    pub app_key: Option<String>,
    pub api_base: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub github: GithubConfig,
    pub b2: B2Config,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub trial_days: i64,
    pub monthly_price: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            github: GithubConfig {
                token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
                org: env::var("GITHUB_ORG").unwrap_or_else(|_| "viny2030".to_string()),
                api_base: env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_string()),
            },
            b2: B2Config {
                key_id: env::var("B2_APPLICATION_KEY_ID").ok().filter(|k| !k.is_empty()),
                app_key: env::var("B2_APPLICATION_KEY").ok().filter(|k| !k.is_empty()),
                api_base: env::var("B2_API_BASE").unwrap_or_else(|_| "https://api.backblazeb2.com".to_string()),
            },
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            trial_days: env::var("TRIAL_DAYS").unwrap_or_else(|_| "7".to_string()).parse().expect("TRIAL_DAYS must be a number"),
            monthly_price: env::var("MONTHLY_PRICE").unwrap_or_else(|_| "29.99".to_string()).parse().expect("MONTHLY_PRICE must be a number"),
        }
    }
}
