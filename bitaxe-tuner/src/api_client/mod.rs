//! Device API client.
//!
//! The tuner talks to the device through the [`DeviceClient`] trait so the
//! sweep logic can be driven by a scripted device in tests.
//! [`HttpDeviceClient`] implements it against the AxeOS REST API.

mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

pub use client::HttpDeviceClient;
use types::SystemInfo;

use crate::config::ConfigError;
use crate::retry::{RetryPolicy, Retryable};
use crate::types::{DeviceDefaults, SweepPoint, TelemetrySample};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Device returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Retryable for ClientError {
    fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport { source, .. } | ClientError::Decode { source, .. } => {
                source.is_timeout() || source.is_connect()
            }
            ClientError::Status { .. } => false,
        }
    }
}

/// Operations the tuner needs from a device.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Raw system info snapshot.
    async fn read_info(&self) -> Result<SystemInfo, ClientError>;

    /// Write core voltage and frequency. Takes effect after [`restart`](Self::restart).
    async fn apply_settings(&self, point: SweepPoint) -> Result<(), ClientError>;

    async fn restart(&self) -> Result<(), ClientError>;

    /// Current telemetry, stamped with the time of the read.
    async fn read_telemetry(&self) -> Result<TelemetrySample, ClientError> {
        let info = self.read_info().await?;
        Ok(info.to_sample(OffsetDateTime::now_utc()))
    }

    /// Settings and topology the device is running with.
    async fn read_capability(&self) -> Result<DeviceDefaults, ClientError> {
        let info = self.read_info().await?;
        Ok(info.to_defaults())
    }
}

/// Transport settings for device calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Per-request timeout, covering connect through body.
    pub request_timeout_secs: u64,

    /// Attempts per call for timeouts and connection failures.
    pub retry_attempts: u32,

    pub retry_delay_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            retry_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

impl DeviceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "device.request_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::invalid(
                "device.retry_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
