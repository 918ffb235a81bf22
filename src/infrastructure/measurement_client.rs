// HTTP repository for the measurement REST interface
use crate::application::measurement_repository::{DataGroups, MeasurementRepository};
use crate::domain::meter::{Measurements, Meter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MeasurementClient {
    client: reqwest::Client,
    base_url: String,
    method: String,
}

impl MeasurementClient {
    pub fn new(base_url: String, method: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build measurement HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            method,
        })
    }

    fn build_query_url(&self, data_groups: DataGroups, tag_id: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}?data_groups={}",
            self.base_url,
            self.method,
            data_groups.as_str()
        );
        if let Some(tag_id) = tag_id.filter(|t| !t.is_empty()) {
            url.push_str("&tag_id=");
            url.push_str(&urlencoding::encode(tag_id));
        }
        url
    }
}

#[async_trait]
impl MeasurementRepository for MeasurementClient {
    async fn fetch_meters(
        &self,
        data_groups: DataGroups,
        tag_id: Option<&str>,
    ) -> Result<Vec<Meter>> {
        let url = self.build_query_url(data_groups, tag_id);
        tracing::debug!("Fetching measurements from {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .context("Failed to send request to measurement interface")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Measurement query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<Measurements>()
            .await
            .context("Failed to parse measurement response")?;

        tracing::debug!("Received {} meters", data.meters.len());
        Ok(data.meters)
    }
}
