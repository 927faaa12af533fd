use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::types::{SettingsPatch, SystemInfo};
use super::{ClientError, DeviceClient, DeviceConfig};
use crate::retry::RetryPolicy;
use crate::tracing::prelude::*;
use crate::types::SweepPoint;

const INFO_PATH: &str = "/api/system/info";
const SETTINGS_PATH: &str = "/api/system";
const RESTART_PATH: &str = "/api/system/restart";

/// HTTP client for the AxeOS REST API.
///
/// Every call is bounded by the configured request timeout. Reads and
/// writes each carry their own retry policy.
pub struct HttpDeviceClient {
    base_url: String,
    http: reqwest::Client,
    read_retry: RetryPolicy,
    write_retry: RetryPolicy,
}

impl HttpDeviceClient {
    /// Create a client for `address`, either a bare host (`192.168.1.20`)
    /// or a URL with scheme.
    pub fn new(address: &str, config: &DeviceConfig) -> Result<Self, ClientError> {
        Self::with_policies(
            address,
            config.request_timeout(),
            config.retry_policy(),
            config.retry_policy(),
        )
    }

    pub fn with_policies(
        address: &str,
        timeout: Duration,
        read_retry: RetryPolicy,
        write_retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let base_url = base_url(address);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url,
            http,
            read_retry,
            write_retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let response = check_status(&url, response)?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    async fn patch_settings(&self, patch: &SettingsPatch) -> Result<(), ClientError> {
        let url = self.url(SETTINGS_PATH);
        let response = self
            .http
            .patch(&url)
            .json(patch)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        check_status(&url, response)?;
        Ok(())
    }

    async fn post_restart(&self) -> Result<(), ClientError> {
        let url = self.url(RESTART_PATH);
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        check_status(&url, response)?;
        Ok(())
    }
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    async fn read_info(&self) -> Result<SystemInfo, ClientError> {
        self.read_retry
            .run("read system info", || self.get_json(INFO_PATH))
            .await
    }

    async fn apply_settings(&self, point: SweepPoint) -> Result<(), ClientError> {
        let patch = SettingsPatch::from(point);
        debug!(%point, "Writing device settings");
        self.write_retry
            .run("apply settings", || self.patch_settings(&patch))
            .await
    }

    async fn restart(&self) -> Result<(), ClientError> {
        debug!("Requesting device restart");
        self.write_retry
            .run("restart", || self.post_restart())
            .await
    }
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            url: url.to_string(),
            status,
        })
    }
}

/// Normalize a device address into a base URL without trailing slash.
fn base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}
