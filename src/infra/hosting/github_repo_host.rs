use crate::config::GithubConfig;
use crate::domain::models::tenant::RepoReference;
use crate::domain::ports::RepoHost;
use crate::domain::services::naming::REPO_CATEGORIES;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const CALL_TIMEOUT: Duration = Duration::from_secs(8);

/// Where a repository-creation attempt is scoped. Tried in order: the
/// organization first, the authenticated personal account as fallback.
#[derive(Debug)]
enum CreateScope {
    Organization(String),
    PersonalAccount,
}

pub struct GithubRepoHost {
    client: Client,
    api_base: String,
    token: Option<String>,
    org: String,
}

#[derive(Deserialize)]
struct CreatedRepo {
    html_url: String,
    name: String,
}

#[derive(Deserialize)]
struct AuthenticatedUser {
    login: String,
}

#[derive(Deserialize)]
struct ExistingContent {
    sha: String,
}

impl GithubRepoHost {
    pub fn new(config: GithubConfig) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .user_agent("onboarding-backend")
            .build()
            .expect("failed to build github http client");
        Self {
            client,
            api_base: config.api_base,
            token: config.token,
            org: config.org,
        }
    }

    /// Configuration check, done before any network call.
    fn token(&self) -> Result<&str, AppError> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("GITHUB_TOKEN is not configured".into()))
    }

    async fn try_create(
        &self,
        token: &str,
        scope: &CreateScope,
        logical_name: &str,
        owner_email: &str,
    ) -> Result<RepoReference, AppError> {
        let url = match scope {
            CreateScope::Organization(org) => format!("{}/orgs/{}/repos", self.api_base, org),
            CreateScope::PersonalAccount => format!("{}/user/repos", self.api_base),
        };

        let body = json!({
            "name": logical_name,
            "description": format!("Contabilidad automatizada - Cliente: {}", owner_email),
            "private": true,
            "has_issues": true,
            "has_projects": false,
            "has_wiki": false,
            "auto_init": true,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("repository host unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "repository creation failed. Status: {}, Body: {}",
                status, text
            )));
        }

        let created: CreatedRepo = res
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed repository response: {}", e)))?;

        // The effective owner of an org-scoped repo is the org itself. For
        // the personal fallback it must be re-queried: the caller's email
        // says nothing about the account login.
        let owner = match scope {
            CreateScope::Organization(org) => org.clone(),
            CreateScope::PersonalAccount => self.authenticated_login(token).await?,
        };

        Ok(RepoReference {
            url: created.html_url,
            owner,
            name: created.name,
        })
    }

    async fn authenticated_login(&self, token: &str) -> Result<String, AppError> {
        let res = self
            .client
            .get(format!("{}/user", self.api_base))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("repository host unreachable: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::Provider(format!(
                "could not resolve account owner. Status: {}",
                res.status()
            )));
        }

        let user: AuthenticatedUser = res
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed account response: {}", e)))?;
        Ok(user.login)
    }

    /// Seeds one folder per accounting category. The hosting model has no
    /// empty directories, so each gets a `.gitkeep` marker. Individual
    /// seed failures are logged and skipped; the repository itself exists.
    async fn seed_taxonomy(&self, token: &str, owner: &str, repo: &str) {
        for category in REPO_CATEGORIES {
            let path = format!("{}/.gitkeep", category);
            if let Err(e) = self.put_contents(token, owner, repo, &path, b"").await {
                warn!(repo, path = %path, "failed to seed category folder: {}", e);
            }
        }
    }

    async fn put_contents(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), AppError> {
        let url = format!("{}/repos/{}/{}/contents/{}", self.api_base, owner, repo, path);

        // Overwrite-by-path needs the current blob sha, when one exists.
        let existing_sha = self.content_sha(token, &url).await;

        let mut body = json!({
            "message": format!("Upload {}", path),
            "content": general_purpose::STANDARD.encode(content),
        });
        if let Some(sha) = existing_sha {
            body["sha"] = json!(sha);
        }

        let res = self
            .client
            .put(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("repository host unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "file write failed. Status: {}, Body: {}",
                status, text
            )));
        }
        Ok(())
    }

    async fn content_sha(&self, token: &str, url: &str) -> Option<String> {
        let res = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .ok()?;
        if !res.status().is_success() {
            return None;
        }
        res.json::<ExistingContent>().await.ok().map(|c| c.sha)
    }
}

#[async_trait]
impl RepoHost for GithubRepoHost {
    async fn provision(&self, logical_name: &str, owner_email: &str) -> Result<RepoReference, AppError> {
        let token = self.token()?;

        let scopes = [
            CreateScope::Organization(self.org.clone()),
            CreateScope::PersonalAccount,
        ];

        let mut last_err = None;
        for scope in &scopes {
            match self.try_create(token, scope, logical_name, owner_email).await {
                Ok(repo) => {
                    info!(repo = %repo.url, owner = %repo.owner, "repository created");
                    self.seed_taxonomy(token, &repo.owner, &repo.name).await;
                    return Ok(repo);
                }
                Err(e) => {
                    warn!(?scope, "repository creation attempt failed: {}", e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Provider("repository creation failed".into())))
    }

    async fn put_file(&self, owner: &str, repo: &str, path: &str, content: &[u8]) -> Result<(), AppError> {
        let token = self.token()?;
        self.put_contents(token, owner, repo, path, content).await
    }
}
