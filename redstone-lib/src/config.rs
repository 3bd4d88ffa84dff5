use crate::error::{RedstoneError, RedstoneResult};

pub const DATA_SERVICE_ID: &str = "redstone-primary-prod";
pub const PAYLOAD_SIGNERS_COUNT: u8 = 3;
pub const PRICE_SIGNERS_COUNT: u8 = 1;
pub const MAX_DATA_FEED_ID_LEN: usize = 32;

/// What to ask the data service for. Fields are private so a value that
/// exists has passed [`RequestConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    data_service_id: String,
    data_feeds: Vec<String>,
    unique_signers_count: u8,
    historical_timestamp_ms: Option<u64>,
}

impl RequestConfig {
    pub fn new(
        data_service_id: impl Into<String>,
        data_feeds: Vec<String>,
        unique_signers_count: u8,
        historical_timestamp_ms: Option<u64>,
    ) -> RedstoneResult<Self> {
        let data_service_id = data_service_id.into();
        if data_service_id.is_empty() {
            return Err(invalid("data service id is empty"));
        }
        if data_feeds.is_empty() {
            return Err(invalid("no data feeds requested"));
        }
        for (i, feed) in data_feeds.iter().enumerate() {
            if feed.is_empty() {
                return Err(invalid("data feed id is empty"));
            }
            if feed.len() > MAX_DATA_FEED_ID_LEN {
                return Err(RedstoneError::FeedIdTooLong(feed.clone()));
            }
            if data_feeds[..i].contains(feed) {
                return Err(invalid(format!("data feed {feed} requested twice")));
            }
        }
        if unique_signers_count == 0 {
            return Err(invalid("unique signers count must be at least 1"));
        }
        Ok(Self {
            data_service_id,
            data_feeds,
            unique_signers_count,
            historical_timestamp_ms,
        })
    }

    pub fn for_payload(data_feed: &str, historical_timestamp_ms: Option<u64>) -> RedstoneResult<Self> {
        Self::new(
            DATA_SERVICE_ID,
            vec![data_feed.to_string()],
            PAYLOAD_SIGNERS_COUNT,
            historical_timestamp_ms,
        )
    }

    pub fn for_price(data_feed: &str, historical_timestamp_ms: Option<u64>) -> RedstoneResult<Self> {
        Self::new(
            DATA_SERVICE_ID,
            vec![data_feed.to_string()],
            PRICE_SIGNERS_COUNT,
            historical_timestamp_ms,
        )
    }

    pub fn with_data_service_id(self, data_service_id: impl Into<String>) -> RedstoneResult<Self> {
        Self::new(
            data_service_id,
            self.data_feeds,
            self.unique_signers_count,
            self.historical_timestamp_ms,
        )
    }

    pub fn data_service_id(&self) -> &str {
        &self.data_service_id
    }

    pub fn data_feeds(&self) -> &[String] {
        &self.data_feeds
    }

    pub fn unique_signers_count(&self) -> u8 {
        self.unique_signers_count
    }

    pub fn historical_timestamp_ms(&self) -> Option<u64> {
        self.historical_timestamp_ms
    }

    pub fn is_historical(&self) -> bool {
        self.historical_timestamp_ms.is_some()
    }
}

/// Seconds from the command line to the milliseconds the data service expects.
pub fn seconds_to_millis(seconds: u64) -> Option<u64> {
    seconds.checked_mul(1000)
}

fn invalid(msg: impl Into<String>) -> RedstoneError {
    RedstoneError::InvalidConfig(msg.into())
}
