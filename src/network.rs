//! Link availability ahead of delivery.
//!
//! On the host the "link" is reachability of the delivery endpoint.

use std::time::Duration;

use reqwest::Url;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::ConnectivityError;

#[async_trait::async_trait]
pub trait Connectivity: Send + Sync {
    /// Whether the link is currently up
    async fn is_connected(&self) -> bool;

    /// Bring the link up, retrying per configuration
    async fn connect(&mut self) -> Result<(), ConnectivityError>;
}

/// Considers the link up when a TCP connection to the endpoint succeeds
pub struct EndpointProbe {
    endpoint: String,
    retries: u32,
    retry_interval: Duration,
    probe_timeout: Duration,
    ssid: Option<String>,
}

impl EndpointProbe {
    pub fn new(endpoint: impl Into<String>, config: &NetworkConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            retries: config.connect_retries.max(1),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            ssid: config.ssid.clone(),
        }
    }

    /// No endpoint means there is nothing to probe
    fn is_unconfigured(&self) -> bool {
        self.endpoint.trim().is_empty()
    }

    fn authority(&self) -> Result<(String, u16), ConnectivityError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ConnectivityError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| ConnectivityError::InvalidEndpoint(format!("{}: no host", self.endpoint)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ConnectivityError::InvalidEndpoint(format!("{}: no port", self.endpoint)))?;
        Ok((host.to_string(), port))
    }

    async fn probe(&self, host: &str, port: u16) -> bool {
        match tokio::time::timeout(self.probe_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Probe of {}:{} failed: {}", host, port, e);
                false
            }
            Err(_) => {
                debug!("Probe of {}:{} timed out", host, port);
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Connectivity for EndpointProbe {
    async fn is_connected(&self) -> bool {
        if self.is_unconfigured() {
            return true;
        }
        match self.authority() {
            Ok((host, port)) => self.probe(&host, port).await,
            Err(_) => false,
        }
    }

    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.is_unconfigured() {
            warn!("No delivery endpoint set, skipping reachability check");
            return Ok(());
        }

        let (host, port) = self.authority()?;
        if let Some(ssid) = &self.ssid {
            info!("Connecting via {}", ssid);
        }
        info!("Checking reachability of {}:{}", host, port);

        for attempt in 1..=self.retries {
            if self.probe(&host, port).await {
                info!("Link up after {} attempt(s)", attempt);
                return Ok(());
            }
            tokio::time::sleep(self.retry_interval).await;
        }

        warn!("{}:{} unreachable", host, port);
        Err(ConnectivityError::Unreachable {
            endpoint: self.endpoint.clone(),
            attempts: self.retries,
        })
    }
}
