use std::{ffi::OsString, io::Write, time::Duration};

use clap::Parser;
use redstone_lib::{
    config::{seconds_to_millis, RequestConfig, DATA_SERVICE_ID},
    price::EncodedPrice,
};
use tracing_subscriber::EnvFilter;

use crate::{
    client::DataServiceClient,
    config::{GatewayConfig, DEFAULT_GATEWAY_URL, DEFAULT_TIMEOUT_SECS},
    error::FetchError,
};

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about = "Fetch signed RedStone oracle data")]
pub struct FetchArgs {
    /// Data feed to request, e.g. ETH
    pub data_feed: String,
    /// Unix timestamp in seconds to read historical data at
    pub timestamp: Option<u64>,
    #[clap(long, default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,
    #[clap(long, default_value = DATA_SERVICE_ID)]
    pub data_service_id: String,
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl FetchArgs {
    pub fn historical_timestamp_ms(&self) -> Result<Option<u64>, CliError> {
        self.timestamp
            .map(|seconds| {
                seconds_to_millis(seconds).ok_or_else(|| {
                    usage_error(format!("timestamp {seconds} is out of range"))
                })
            })
            .transpose()
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(&self.gateway_url).with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Payload,
    Price,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Payload => "payload-fetch",
            Tool::Price => "price-fetch",
        }
    }

    pub fn request_config(&self, args: &FetchArgs) -> Result<RequestConfig, CliError> {
        let timestamp_ms = args.historical_timestamp_ms()?;
        let config = match self {
            Tool::Payload => RequestConfig::for_payload(&args.data_feed, timestamp_ms),
            Tool::Price => RequestConfig::for_price(&args.data_feed, timestamp_ms),
        };
        config
            .and_then(|config| config.with_data_service_id(args.data_service_id.clone()))
            .map_err(|err| usage_error(err.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] clap::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(err) if !err.use_stderr() => 0,
            CliError::Usage(_) => 1,
            CliError::Fetch(_) | CliError::Output(_) => 2,
        }
    }

    pub fn is_data_shape(&self) -> bool {
        matches!(self, CliError::Fetch(err) if err.is_data_shape())
    }
}

fn usage_error(msg: String) -> CliError {
    CliError::Usage(clap::Error::raw(
        clap::error::ErrorKind::InvalidValue,
        format!("{msg}\n"),
    ))
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

pub fn parse_args<I, T>(argv: I) -> Result<FetchArgs, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Ok(FetchArgs::try_parse_from(argv)?)
}

pub async fn fetch_payload(
    client: &impl DataServiceClient,
    config: &RequestConfig,
) -> Result<String, FetchError> {
    client.get_payload(config).await
}

pub async fn fetch_price(
    client: &impl DataServiceClient,
    config: &RequestConfig,
) -> Result<EncodedPrice, FetchError> {
    let data_packages = client.get_data_packages(config).await?;
    let price = EncodedPrice::from_data_packages(&data_packages, config.is_historical())?;
    tracing::info!("{} = {price}", config.data_feeds()[0]);
    Ok(price)
}

/// Builds the request, asks the data service once and writes the result.
/// Nothing is written unless every step succeeded.
pub async fn execute<C, F, W>(
    tool: Tool,
    args: &FetchArgs,
    make_client: F,
    out: &mut W,
) -> Result<(), CliError>
where
    C: DataServiceClient,
    F: FnOnce(&FetchArgs) -> Result<C, FetchError>,
    W: Write,
{
    let config = tool.request_config(args)?;
    let client = make_client(args)?;
    let output = match tool {
        Tool::Payload => fetch_payload(&client, &config).await?,
        Tool::Price => fetch_price(&client, &config).await?.to_hex(),
    };
    out.write_all(output.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Entry point shared by both binaries, returns the process exit code.
pub async fn run<I, T, C, F, W>(tool: Tool, argv: I, make_client: F, out: &mut W) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    C: DataServiceClient,
    F: FnOnce(&FetchArgs) -> Result<C, FetchError>,
    W: Write,
{
    let result = match parse_args(argv) {
        Ok(args) => execute(tool, &args, make_client, out).await,
        Err(err) => Err(err),
    };
    let Err(err) = result else {
        return 0;
    };
    match &err {
        CliError::Usage(usage) => {
            let _ = usage.print();
        }
        _ if err.is_data_shape() => {
            tracing::error!("{}: unexpected data service response: {err}", tool.name())
        }
        _ => tracing::error!("{} failed: {err}", tool.name()),
    }
    err.exit_code()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use redstone_lib::{
        data_package::{DataPoint, DataPointMetadata, SignedDataPackage},
        numeric::parse_decimal,
    };

    use super::*;

    #[derive(Default)]
    struct MockClient {
        payload: String,
        data_packages: Vec<SignedDataPackage>,
        requests: Mutex<Vec<RequestConfig>>,
    }

    impl MockClient {
        fn with_price(value: &str) -> Self {
            let value = parse_decimal(value).unwrap();
            Self {
                data_packages: vec![SignedDataPackage {
                    timestamp_milliseconds: 1_700_000_000_000,
                    signature: String::new(),
                    data_points: vec![DataPoint {
                        data_feed_id: "ETH".to_string(),
                        value: value.clone(),
                        metadata: Some(DataPointMetadata { value: Some(value) }),
                    }],
                    data_service_id: None,
                    data_package_id: None,
                    signer_address: None,
                }],
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<RequestConfig> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DataServiceClient for MockClient {
        async fn get_data_packages(
            &self,
            config: &RequestConfig,
        ) -> Result<Vec<SignedDataPackage>, FetchError> {
            self.requests.lock().unwrap().push(config.clone());
            Ok(self.data_packages.clone())
        }

        async fn get_payload(&self, config: &RequestConfig) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(config.clone());
            Ok(self.payload.clone())
        }
    }

    struct FailingClient;

    #[async_trait::async_trait]
    impl DataServiceClient for FailingClient {
        async fn get_data_packages(
            &self,
            _config: &RequestConfig,
        ) -> Result<Vec<SignedDataPackage>, FetchError> {
            Err(FetchError::InsufficientSigners {
                data_feed: "ETH".to_string(),
                required: 3,
                available: 0,
            })
        }
    }

    async fn run_with(tool: Tool, argv: &[&str], client: &MockClient) -> (u8, Vec<u8>) {
        let mut out = Vec::new();
        let code = run(tool, argv.iter().copied(), |_| Ok(client), &mut out).await;
        (code, out)
    }

    #[tokio::test]
    async fn missing_feed_is_a_usage_error() {
        for (tool, name) in [(Tool::Payload, "payload-fetch"), (Tool::Price, "price-fetch")] {
            let client = MockClient::default();
            let (code, out) = run_with(tool, &[name], &client).await;
            assert_eq!(code, 1);
            assert!(out.is_empty());
            assert!(client.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn bad_timestamp_is_a_usage_error() {
        let client = MockClient::default();
        let (code, _) = run_with(Tool::Price, &["price-fetch", "ETH", "yesterday"], &client).await;
        assert_eq!(code, 1);
        let (code, _) = run_with(
            Tool::Price,
            &["price-fetch", "ETH", u64::MAX.to_string().as_str()],
            &client,
        )
        .await;
        assert_eq!(code, 1);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn payload_is_echoed_unchanged() {
        let client = MockClient {
            payload: "0xdeadbeef".to_string(),
            ..Default::default()
        };
        let (code, out) = run_with(Tool::Payload, &["payload-fetch", "ETH"], &client).await;
        assert_eq!(code, 0);
        assert_eq!(out, b"0xdeadbeef");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].data_feeds(), ["ETH".to_string()]);
        assert_eq!(requests[0].unique_signers_count(), 3);
        assert_eq!(requests[0].historical_timestamp_ms(), None);
    }

    #[tokio::test]
    async fn payload_timestamp_is_sent_in_millis() {
        let client = MockClient::default();
        let (code, _) = run_with(
            Tool::Payload,
            &["payload-fetch", "ETH", "1700000000"],
            &client,
        )
        .await;
        assert_eq!(code, 0);
        assert_eq!(
            client.requests()[0].historical_timestamp_ms(),
            Some(1_700_000_000_000)
        );
    }

    #[tokio::test]
    async fn live_price_is_floored() {
        let client = MockClient::with_price("1.234567895");
        let (code, out) = run_with(Tool::Price, &["price-fetch", "ETH"], &client).await;
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x00000000000000000000000000000000000000000000000000000000075bcd15"
        );
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].unique_signers_count(), 1);
        assert!(!requests[0].is_historical());
    }

    #[tokio::test]
    async fn historical_price_is_ceiled() {
        let client = MockClient::with_price("1.234567895");
        let (code, out) = run_with(Tool::Price, &["price-fetch", "ETH", "1700000000"], &client).await;
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x00000000000000000000000000000000000000000000000000000000075bcd16"
        );
        assert_eq!(
            client.requests()[0].historical_timestamp_ms(),
            Some(1_700_000_000_000)
        );
    }

    #[tokio::test]
    async fn empty_response_is_a_data_shape_error() {
        let client = MockClient::default();
        let args = parse_args(["price-fetch", "ETH"]).unwrap();
        let mut out = Vec::new();
        let err = execute(Tool::Price, &args, |_| Ok(&client), &mut out)
            .await
            .unwrap_err();
        assert!(err.is_data_shape());
        assert_eq!(err.exit_code(), 2);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn client_errors_exit_non_zero() {
        let mut out = Vec::new();
        let code = run(
            Tool::Payload,
            ["payload-fetch", "ETH"],
            |_| Ok(FailingClient),
            &mut out,
        )
        .await;
        assert_eq!(code, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn service_id_and_gateway_are_configurable() {
        let args = parse_args([
            "price-fetch",
            "BTC",
            "--gateway-url",
            "http://localhost:1234",
            "--data-service-id",
            "redstone-main-demo",
            "--timeout-secs",
            "3",
        ])
        .unwrap();
        let config = Tool::Price.request_config(&args).unwrap();
        assert_eq!(config.data_service_id(), "redstone-main-demo");
        let gateway = args.gateway_config();
        assert_eq!(gateway.gateway_url, "http://localhost:1234");
        assert_eq!(gateway.timeout, Duration::from_secs(3));
    }

    #[test]
    fn help_exits_zero() {
        let err = parse_args(["price-fetch", "--help"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }
}
