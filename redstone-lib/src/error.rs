pub type RedstoneResult<T = ()> = Result<T, RedstoneError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedstoneError {
    #[error("invalid request config: {0}")]
    InvalidConfig(String),
    #[error("data service returned no data packages")]
    EmptyDataPackages,
    #[error("data package for {data_package_id:?} has no data points")]
    MissingDataPoint { data_package_id: Option<String> },
    #[error("data point {data_feed_id} has no metadata value")]
    MissingMetadataValue { data_feed_id: String },
    #[error("invalid numeric value {0:?}")]
    InvalidNumericValue(String),
    #[error("negative value {0} cannot be encoded as uint256")]
    NegativeValue(String),
    #[error("value {0} does not fit in uint256")]
    ValueOverflow(String),
    #[error("data feed id {0:?} is longer than 32 bytes")]
    FeedIdTooLong(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("payload field {field} overflows: {len}")]
    PayloadTooLarge { field: &'static str, len: usize },
}

impl RedstoneError {
    /// The response did not have the shape a price read needs.
    pub fn is_data_shape(&self) -> bool {
        matches!(
            self,
            RedstoneError::EmptyDataPackages
                | RedstoneError::MissingDataPoint { .. }
                | RedstoneError::MissingMetadataValue { .. }
        )
    }
}
