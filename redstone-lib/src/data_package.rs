use base64::Engine;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::{
    config::MAX_DATA_FEED_ID_LEN,
    error::{RedstoneError, RedstoneResult},
    numeric::{scale_to_u256, serde_decimal, serde_optional_decimal, Rounding, VALUE_DECIMALS},
};

pub const SIGNATURE_BS: usize = 65;
pub const TIMESTAMP_BS: usize = 6;
pub const DATA_POINT_VALUE_BS: usize = 32;
pub const DATA_POINT_VALUE_BYTE_SIZE_BS: usize = 4;
pub const DATA_POINTS_COUNT_BS: usize = 3;
pub const PACKAGE_TRAILER_BS: usize =
    TIMESTAMP_BS + DATA_POINT_VALUE_BYTE_SIZE_BS + DATA_POINTS_COUNT_BS + SIGNATURE_BS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDataPackage {
    pub timestamp_milliseconds: u64,
    /// base64 encoded `r || s || v`
    pub signature: String,
    pub data_points: Vec<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub data_feed_id: String,
    #[serde(with = "serde_decimal")]
    pub value: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DataPointMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPointMetadata {
    #[serde(default, with = "serde_optional_decimal")]
    pub value: Option<BigDecimal>,
}

impl SignedDataPackage {
    pub fn first_data_point(&self) -> RedstoneResult<&DataPoint> {
        self.data_points
            .first()
            .ok_or_else(|| RedstoneError::MissingDataPoint {
                data_package_id: self.data_package_id.clone(),
            })
    }

    pub fn decoded_signature(&self) -> RedstoneResult<[u8; SIGNATURE_BS]> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.signature.trim())
            .map_err(|err| RedstoneError::InvalidSignature(err.to_string()))?;
        bytes.try_into().map_err(|bytes: Vec<u8>| {
            RedstoneError::InvalidSignature(format!(
                "expected {SIGNATURE_BS} bytes, got {}",
                bytes.len()
            ))
        })
    }

    /// Signed part followed by the signature, as laid out in a payload.
    pub fn to_bytes(&self) -> RedstoneResult<Vec<u8>> {
        let mut points = self
            .data_points
            .iter()
            .map(DataPoint::to_bytes)
            .collect::<RedstoneResult<Vec<_>>>()?;
        // sorted by the bytes32 feed id, which leads each serialized point
        points.sort();

        let count = points.len();
        if count >= 1 << (8 * DATA_POINTS_COUNT_BS) {
            return Err(RedstoneError::PayloadTooLarge {
                field: "data points count",
                len: count,
            });
        }
        let mut out = Vec::with_capacity(count * (32 + DATA_POINT_VALUE_BS) + PACKAGE_TRAILER_BS);
        for point in points {
            out.extend_from_slice(&point);
        }
        out.extend_from_slice(&self.timestamp_milliseconds.to_be_bytes()[8 - TIMESTAMP_BS..]);
        out.extend_from_slice(
            &(DATA_POINT_VALUE_BS as u32).to_be_bytes()[4 - DATA_POINT_VALUE_BYTE_SIZE_BS..],
        );
        out.extend_from_slice(&(count as u32).to_be_bytes()[4 - DATA_POINTS_COUNT_BS..]);
        out.extend_from_slice(&self.decoded_signature()?);
        Ok(out)
    }
}

impl DataPoint {
    /// The price-like figure carried in the metadata, as published by the node.
    pub fn metadata_value(&self) -> RedstoneResult<&BigDecimal> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.value.as_ref())
            .ok_or_else(|| RedstoneError::MissingMetadataValue {
                data_feed_id: self.data_feed_id.clone(),
            })
    }

    pub fn to_bytes(&self) -> RedstoneResult<Vec<u8>> {
        let mut out = Vec::with_capacity(32 + DATA_POINT_VALUE_BS);
        out.extend_from_slice(&feed_id_to_bytes32(&self.data_feed_id)?);
        let value = scale_to_u256(&self.value, VALUE_DECIMALS, Rounding::HalfUp)?;
        out.extend_from_slice(&value.to_be_bytes::<DATA_POINT_VALUE_BS>());
        Ok(out)
    }
}

pub fn feed_id_to_bytes32(data_feed_id: &str) -> RedstoneResult<[u8; 32]> {
    let bytes = data_feed_id.as_bytes();
    if bytes.len() > MAX_DATA_FEED_ID_LEN {
        return Err(RedstoneError::FeedIdTooLong(data_feed_id.to_string()));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}
