use std::collections::HashMap;

use redstone_lib::{
    config::RequestConfig, data_package::SignedDataPackage, payload::RedstonePayload, BigDecimal,
};

use crate::{config::GatewayConfig, error::FetchError};

/// Data packages served by a gateway, keyed by data package id.
pub type GatewayResponse = HashMap<String, Vec<SignedDataPackage>>;

#[async_trait::async_trait]
pub trait DataServiceClient: Send + Sync {
    /// `unique_signers_count` packages per requested feed, in request order.
    async fn get_data_packages(
        &self,
        config: &RequestConfig,
    ) -> Result<Vec<SignedDataPackage>, FetchError>;

    /// Hex payload to append to contract calldata.
    async fn get_payload(&self, config: &RequestConfig) -> Result<String, FetchError> {
        let data_packages = self.get_data_packages(config).await?;
        Ok(RedstonePayload::new(data_packages).to_hex()?)
    }
}

#[async_trait::async_trait]
impl<T: DataServiceClient + ?Sized> DataServiceClient for &T {
    async fn get_data_packages(
        &self,
        config: &RequestConfig,
    ) -> Result<Vec<SignedDataPackage>, FetchError> {
        (**self).get_data_packages(config).await
    }

    async fn get_payload(&self, config: &RequestConfig) -> Result<String, FetchError> {
        (**self).get_payload(config).await
    }
}

pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub async fn fetch_gateway_response(
        &self,
        request: &RequestConfig,
    ) -> Result<GatewayResponse, FetchError> {
        let url = self.config.data_packages_url(request)?;
        tracing::info!("Fetching data packages from {url}");
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<_>()
            .await?)
    }
}

#[async_trait::async_trait]
impl DataServiceClient for GatewayClient {
    async fn get_data_packages(
        &self,
        config: &RequestConfig,
    ) -> Result<Vec<SignedDataPackage>, FetchError> {
        let response = self.fetch_gateway_response(config).await?;
        select_data_packages(response, config)
    }
}

pub fn select_data_packages(
    mut response: GatewayResponse,
    config: &RequestConfig,
) -> Result<Vec<SignedDataPackage>, FetchError> {
    let required = config.unique_signers_count();
    let mut selected = Vec::with_capacity(required as usize * config.data_feeds().len());
    for data_feed in config.data_feeds() {
        let packages = response.remove(data_feed).unwrap_or_default();
        let picked = pick_data_packages(packages, required as usize).map_err(|available| {
            FetchError::InsufficientSigners {
                data_feed: data_feed.clone(),
                required,
                available,
            }
        })?;
        tracing::debug!(
            "{data_feed}: picked {} packages at {}",
            picked.len(),
            picked[0].timestamp_milliseconds
        );
        selected.extend(picked);
    }
    Ok(selected)
}

/// Newest packages, one per signer, closest to the median when more than
/// `required` signers answered. `Err` carries the number of usable signers.
fn pick_data_packages(
    packages: Vec<SignedDataPackage>,
    required: usize,
) -> Result<Vec<SignedDataPackage>, usize> {
    let Some(newest) = packages
        .iter()
        .filter(|package| !package.data_points.is_empty())
        .map(|package| package.timestamp_milliseconds)
        .max()
    else {
        return Err(0);
    };

    let mut unique: Vec<SignedDataPackage> = Vec::with_capacity(packages.len());
    for package in packages {
        if package.timestamp_milliseconds != newest || package.data_points.is_empty() {
            continue;
        }
        let signer = signer_key(&package);
        if unique.iter().any(|other| signer_key(other) == signer) {
            tracing::warn!("Ignoring duplicate data package from {signer}");
            continue;
        }
        unique.push(package);
    }

    if unique.len() < required {
        return Err(unique.len());
    }
    if unique.len() > required {
        let median = median(unique.iter().map(|package| &package.data_points[0].value));
        unique.sort_by_cached_key(|package| {
            (
                (&package.data_points[0].value - &median).abs(),
                signer_key(package),
            )
        });
        unique.truncate(required);
    }
    Ok(unique)
}

fn signer_key(package: &SignedDataPackage) -> String {
    match &package.signer_address {
        Some(address) => address.to_lowercase(),
        None => package.signature.clone(),
    }
}

fn median<'a>(values: impl Iterator<Item = &'a BigDecimal>) -> BigDecimal {
    let mut values: Vec<&BigDecimal> = values.collect();
    values.sort();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid].clone()
    } else {
        (values[mid - 1] + values[mid]) / BigDecimal::from(2)
    }
}
