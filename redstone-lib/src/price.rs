use alloy_primitives::U256;
use alloy_sol_types::SolValue;
use bigdecimal::BigDecimal;

use crate::{
    data_package::SignedDataPackage,
    error::{RedstoneError, RedstoneResult},
    numeric::{scale_to_u256, Rounding},
};

pub const PRICE_DECIMALS: i64 = 8;

/// Historical reads round up, live reads round down.
pub fn price_rounding(is_historical: bool) -> Rounding {
    if is_historical {
        Rounding::Ceil
    } else {
        Rounding::Floor
    }
}

/// An 8 decimals price, ready to be handed to a contract as `uint256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedPrice {
    value: U256,
}

impl EncodedPrice {
    pub fn from_value(value: &BigDecimal, rounding: Rounding) -> RedstoneResult<Self> {
        Ok(Self {
            value: scale_to_u256(value, PRICE_DECIMALS, rounding)?,
        })
    }

    /// Reads `metadata.value` of the first data point of the first package.
    pub fn from_data_packages(
        data_packages: &[SignedDataPackage],
        is_historical: bool,
    ) -> RedstoneResult<Self> {
        let package = data_packages
            .first()
            .ok_or(RedstoneError::EmptyDataPackages)?;
        let value = package.first_data_point()?.metadata_value()?;
        Self::from_value(value, price_rounding(is_historical))
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn abi_encode(&self) -> Vec<u8> {
        self.value.abi_encode()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.abi_encode()))
    }
}

impl std::fmt::Display for EncodedPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedPrice({})", self.value)
    }
}
