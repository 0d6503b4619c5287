//! Downstream notification of the relayed reading.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::api::client::check_response;
use crate::api::ApiError;
use crate::models::Reading;

/// Posts readings to the configured destination as JSON `{time, value, trend}`.
pub struct Notifier {
    client: Client,
    destination: Url,
}

impl Notifier {
    pub fn new(destination: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network("Failed to build HTTP client", e))?;
        Ok(Self { client, destination })
    }

    pub async fn send(&self, reading: &Reading) -> Result<(), ApiError> {
        debug!(url = %self.destination, "Sending reading downstream");

        let response = self
            .client
            .post(self.destination.clone())
            .json(reading)
            .send()
            .await
            .map_err(|e| ApiError::network("Failed to send reading to destination", e))?;

        check_response(response).await?;
        Ok(())
    }
}
