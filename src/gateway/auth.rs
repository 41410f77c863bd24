use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::rest::check_status;
use crate::config::BackendSettings;
use crate::error::{GatewayError, VitalRsError};

/// Email and password sign-in
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Returns the signed-in user's id
    async fn sign_in(&self, email: &str, password: &str) -> Result<Uuid, VitalRsError>;
}

/// Reject blank credentials before any request is made
pub fn validate_credentials(email: &str, password: &str) -> Result<(), VitalRsError> {
    if email.trim().is_empty() || password.is_empty() {
        warn!("Sign-in attempted with empty credentials");
        return Err(VitalRsError::Auth(
            "email and password are required".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: Uuid,
}

/// Auth client for a GoTrue-style `/auth/v1` endpoint
#[derive(Debug, Clone)]
pub struct RestAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestAuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(&settings.url, &settings.anon_key)
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=password", self.base_url)
    }
}

#[async_trait]
impl AuthClient for RestAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Uuid, VitalRsError> {
        validate_credentials(email, password)?;

        let response = self
            .client
            .post(self.token_url())
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(GatewayError::from)?;

        let response = match check_status(response).await {
            Ok(response) => response,
            Err(GatewayError::Http { status, body }) if status == 400 || status == 401 => {
                warn!(status, "Sign-in rejected");
                return Err(VitalRsError::Auth(format!("sign-in rejected: {}", body)));
            }
            Err(err) => return Err(err.into()),
        };

        let text = response.text().await.map_err(GatewayError::from)?;
        let session: SessionResponse =
            serde_json::from_str(&text).map_err(|e| GatewayError::Decode {
                reason: e.to_string(),
            })?;

        info!(user = %session.user.id, "Signed in");
        Ok(session.user.id)
    }
}
