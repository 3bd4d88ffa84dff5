use redstone_lib::error::RedstoneError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("data service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data feed {data_feed}: {available} unique signers available, {required} required")]
    InsufficientSigners {
        data_feed: String,
        required: u8,
        available: usize,
    },
    #[error("invalid gateway url: {0}")]
    InvalidGatewayUrl(String),
    #[error(transparent)]
    Redstone(#[from] RedstoneError),
}

impl FetchError {
    pub fn is_data_shape(&self) -> bool {
        matches!(self, FetchError::Redstone(err) if err.is_data_shape())
    }
}
