//! knive backend client.
//!
//! `Backend` is the seam the console talks through; `ApiClient` implements it
//! over HTTP with reqwest.  Bodies are read as bytes and decoded with
//! serde_json so a malformed body is always a `BackendError::Parse` and never
//! confused with a transport failure.

use std::future::Future;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::BackendError;
use crate::model::{
    ChannelList, ConfigSection, Episode, EpisodeList, SectionIndex, Setting, ShowDraft, ShowRecord,
};

/// Operations the console needs from a knive backend.
pub trait Backend: Send + Sync + 'static {
    /// `GET /channel`, in backend order.
    fn list_channels(&self) -> impl Future<Output = Result<Vec<ShowRecord>, BackendError>> + Send;

    /// `GET /channel/{slug}/episode`.
    fn list_episodes(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Vec<Episode>, BackendError>> + Send;

    /// Create a channel through the data proxy and return the stored record.
    fn create_channel(
        &self,
        draft: &ShowDraft,
    ) -> impl Future<Output = Result<ShowRecord, BackendError>> + Send;

    /// Every configuration section with its current values.
    fn list_config(&self) -> impl Future<Output = Result<Vec<ConfigSection>, BackendError>> + Send;

    /// `PUT /config/{section}/{key}`.
    fn put_setting(
        &self,
        section: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<Setting, BackendError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    data_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            data_url: config.data_url.trim_end_matches('/').to_string(),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        debug!("api: GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        decode(response).await
    }
}

/// Map status classes onto the error taxonomy, then decode the body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_server_error() {
        return Err(BackendError::Network(format!(
            "backend returned status {}",
            status
        )));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(BackendError::Rejected {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn first_channel(list: ChannelList) -> Result<ShowRecord, BackendError> {
    list.channels
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Parse("empty channels list in reply".to_string()))
}

impl Backend for ApiClient {
    async fn list_channels(&self) -> Result<Vec<ShowRecord>, BackendError> {
        let list: ChannelList = self.get_json(&self.api("channel")).await?;
        Ok(list.channels)
    }

    async fn list_episodes(&self, slug: &str) -> Result<Vec<Episode>, BackendError> {
        let list: EpisodeList = self
            .get_json(&self.api(&format!("channel/{}/episode", slug)))
            .await?;
        Ok(list.episodes)
    }

    async fn create_channel(&self, draft: &ShowDraft) -> Result<ShowRecord, BackendError> {
        let url = format!("{}/channel", self.data_url);
        debug!("api: POST {} ({})", url, draft.slug);
        let response = self.client.post(&url).json(draft).send().await?;
        let list: ChannelList = decode(response).await?;
        first_channel(list)
    }

    async fn list_config(&self) -> Result<Vec<ConfigSection>, BackendError> {
        let index: Vec<SectionIndex> = self.get_json(&self.api("config")).await?;
        let mut sections = Vec::with_capacity(index.len());
        for entry in index {
            let section: ConfigSection = self
                .get_json(&self.api(&format!("config/{}", entry.section_name)))
                .await?;
            sections.push(section);
        }
        Ok(sections)
    }

    async fn put_setting(
        &self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<Setting, BackendError> {
        let url = self.api(&format!("config/{}/{}", section, key));
        debug!("api: PUT {}", url);
        let response = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "value": value }))
            .send()
            .await?;
        // The backend echoes the setting as a one-element list.
        let mut echoed: Vec<Setting> = decode(response).await?;
        echoed
            .pop()
            .ok_or_else(|| BackendError::Parse("empty setting reply".to_string()))
    }
}
