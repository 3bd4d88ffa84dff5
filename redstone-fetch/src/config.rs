use std::time::Duration;

use redstone_lib::config::RequestConfig;
use reqwest::Url;

use crate::error::FetchError;

pub const DEFAULT_GATEWAY_URL: &str = "https://oracle-gateway-1.a.redstone.finance";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub gateway_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn prod() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Each path part is pushed as its own segment, so a service id can't
    /// escape its position in the path.
    pub fn data_packages_url(&self, request: &RequestConfig) -> Result<Url, FetchError> {
        let invalid = || FetchError::InvalidGatewayUrl(self.gateway_url.clone());
        let mut url = Url::parse(&self.gateway_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| invalid())?;
            segments.pop_if_empty().push("data-packages");
            match request.historical_timestamp_ms() {
                Some(timestamp_ms) => segments
                    .push("historical")
                    .push(request.data_service_id())
                    .push(&timestamp_ms.to_string()),
                None => segments.push("latest").push(request.data_service_id()),
            };
        }
        Ok(url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::prod()
    }
}
