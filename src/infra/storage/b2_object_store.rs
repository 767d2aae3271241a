use crate::config::B2Config;
use crate::domain::ports::ObjectStore;
use crate::domain::services::naming::BUCKET_PREFIXES;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const CALL_TIMEOUT: Duration = Duration::from_secs(8);

const BUCKET_README: &str = "# Viny2030 - Almacenamiento\n\
Este bucket contiene los datos y reportes contables de tu empresa.\n\
Los archivos se sincronizan automáticamente.\n";

/// Backblaze B2 native-API client. Creates the tenant's private bucket,
/// tags it with tenant metadata, and seeds the prefix layout with
/// placeholder objects.
pub struct B2ObjectStore {
    client: Client,
    api_base: String,
    key_id: Option<String>,
    app_key: Option<String>,
}

#[derive(Deserialize)]
struct AuthorizedAccount {
    #[serde(rename = "accountId")]
    account_id: String,
    #[serde(rename = "apiUrl")]
    api_url: String,
    #[serde(rename = "authorizationToken")]
    authorization_token: String,
}

#[derive(Deserialize)]
struct CreatedBucket {
    #[serde(rename = "bucketId")]
    bucket_id: String,
}

#[derive(Deserialize)]
struct UploadTarget {
    #[serde(rename = "uploadUrl")]
    upload_url: String,
    #[serde(rename = "authorizationToken")]
    authorization_token: String,
}

impl B2ObjectStore {
    pub fn new(config: B2Config) -> Self {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .expect("failed to build b2 http client");
        Self {
            client,
            api_base: config.api_base,
            key_id: config.key_id,
            app_key: config.app_key,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (self.key_id.as_deref(), self.app_key.as_deref()) {
            (Some(id), Some(key)) => Ok((id, key)),
            _ => Err(AppError::Configuration(
                "B2_APPLICATION_KEY_ID / B2_APPLICATION_KEY are not configured".into(),
            )),
        }
    }

    async fn authorize(&self, key_id: &str, app_key: &str) -> Result<AuthorizedAccount, AppError> {
        let res = self
            .client
            .get(format!("{}/b2api/v2/b2_authorize_account", self.api_base))
            .basic_auth(key_id, Some(app_key))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("object storage unreachable: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::Provider(format!(
                "object storage authorization failed. Status: {}",
                res.status()
            )));
        }
        res.json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed authorization response: {}", e)))
    }

    async fn create_bucket(
        &self,
        auth: &AuthorizedAccount,
        bucket_name: &str,
        tenant_id: &str,
    ) -> Result<CreatedBucket, AppError> {
        let body = json!({
            "accountId": auth.account_id,
            "bucketName": bucket_name,
            "bucketType": "allPrivate",
            "bucketInfo": {
                "tenant_id": tenant_id,
                "purpose": "contabilidad",
                "created_by": "onboarding-backend",
            },
        });

        let res = self
            .client
            .post(format!("{}/b2api/v2/b2_create_bucket", auth.api_url))
            .header("Authorization", &auth.authorization_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("object storage unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "bucket creation failed. Status: {}, Body: {}",
                status, text
            )));
        }
        res.json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed bucket response: {}", e)))
    }

    async fn upload_target(
        &self,
        auth: &AuthorizedAccount,
        bucket_id: &str,
    ) -> Result<UploadTarget, AppError> {
        let res = self
            .client
            .post(format!("{}/b2api/v2/b2_get_upload_url", auth.api_url))
            .header("Authorization", &auth.authorization_token)
            .json(&json!({ "bucketId": bucket_id }))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("object storage unreachable: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::Provider(format!(
                "could not obtain upload url. Status: {}",
                res.status()
            )));
        }
        res.json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed upload-url response: {}", e)))
    }

    async fn upload_object(
        &self,
        target: &UploadTarget,
        name: &str,
        content: &[u8],
    ) -> Result<(), AppError> {
        let res = self
            .client
            .post(&target.upload_url)
            .header("Authorization", &target.authorization_token)
            .header("X-Bz-File-Name", name)
            .header("Content-Type", "text/plain")
            .header("X-Bz-Content-Sha1", "do_not_verify")
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("object storage unreachable: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::Provider(format!(
                "object upload failed. Status: {}",
                res.status()
            )));
        }
        Ok(())
    }

    /// Placeholder objects standing in for folders, plus a README
    /// explaining the layout. Individual failures are logged and skipped;
    /// the bucket itself is the durable outcome.
    async fn seed_layout(&self, auth: &AuthorizedAccount, bucket_id: &str) {
        let target = match self.upload_target(auth, bucket_id).await {
            Ok(t) => t,
            Err(e) => {
                warn!("could not seed bucket layout: {}", e);
                return;
            }
        };

        for prefix in BUCKET_PREFIXES {
            let name = format!("{}.placeholder", prefix);
            if let Err(e) = self
                .upload_object(&target, &name, b"# Placeholder folder for Viny2030")
                .await
            {
                warn!(object = %name, "failed to seed bucket prefix: {}", e);
            }
        }

        if let Err(e) = self
            .upload_object(&target, "README.md", BUCKET_README.as_bytes())
            .await
        {
            warn!("failed to upload bucket README: {}", e);
        }
    }
}

#[async_trait]
impl ObjectStore for B2ObjectStore {
    async fn provision_bucket(&self, bucket_name: &str, tenant_id: &str) -> Result<(), AppError> {
        let (key_id, app_key) = self.credentials()?;

        let auth = self.authorize(key_id, app_key).await?;
        let bucket = self.create_bucket(&auth, bucket_name, tenant_id).await?;
        info!(bucket = %bucket_name, tenant_id, "bucket created");

        self.seed_layout(&auth, &bucket.bucket_id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::B2Config;

    #[tokio::test]
    async fn missing_credentials_short_circuit_before_network() {
        let store = B2ObjectStore::new(B2Config {
            key_id: None,
            app_key: None,
            api_base: "http://localhost:1".to_string(),
        });
        let err = store.provision_bucket("viny-acme-abcd1234", "t-1").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
