use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ActivityRecord, NewActivityRecord, RecordStore};
use crate::config::BackendSettings;
use crate::error::GatewayError;

/// Record store talking to a PostgREST-style backend
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    base_url: String,
    anon_key: String,
    table: String,
}

impl RestRecordStore {
    pub fn new(base_url: &str, anon_key: &str, table: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            table: table.to_string(),
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(&settings.url, &settings.anon_key, &settings.table)
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }
}

/// Turn a non-success response into an error carrying its body
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert(&self, record: &NewActivityRecord) -> Result<(), GatewayError> {
        let url = self.table_url();
        let response = self
            .request(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        check_status(response).await?;
        debug!(url = %url, "Record inserted");
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<ActivityRecord>, GatewayError> {
        let url = format!("{}?select=*", self.table_url());
        let response = self.request(self.client.get(&url)).send().await?;
        let response = check_status(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode {
            reason: e.to_string(),
        })
    }
}
