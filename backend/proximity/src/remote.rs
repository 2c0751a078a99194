use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::SearchError,
    models::{ShelterQuery, parse_entries},
    point::BoundingBox,
};

/// Anything that can list candidate shelters inside a bounding box.
#[async_trait]
pub trait PointSource: Send + Sync {
    async fn fetch(&self, bbox: &BoundingBox, page_size: u32) -> Result<Vec<Value>, SearchError>;
}

pub struct RemoteShelters {
    client: Client,
    endpoint: String,
    service_key: String,
}

impl RemoteShelters {
    pub fn new(endpoint: &str, service_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            service_key: service_key.to_string(),
        })
    }
}

#[async_trait]
impl PointSource for RemoteShelters {
    async fn fetch(&self, bbox: &BoundingBox, page_size: u32) -> Result<Vec<Value>, SearchError> {
        let query = ShelterQuery::new(&self.service_key, bbox, page_size);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        debug!("Shelter API status: {}", response.status());

        let bytes = response.bytes().await?;

        parse_entries(&bytes)
    }
}
