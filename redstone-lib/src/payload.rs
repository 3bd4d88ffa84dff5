use hex_literal::hex;

use crate::{
    data_package::SignedDataPackage,
    error::{RedstoneError, RedstoneResult},
};

pub const REDSTONE_MARKER: [u8; 9] = hex!("000002ed57011e0000");
pub const DATA_PACKAGES_COUNT_BS: usize = 2;
pub const UNSIGNED_METADATA_BYTE_SIZE_BS: usize = 3;

pub fn default_unsigned_metadata() -> String {
    format!("{}#manual-payload", env!("CARGO_PKG_VERSION"))
}

/// Signed data packages ready to be appended to contract calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedstonePayload {
    pub data_packages: Vec<SignedDataPackage>,
    pub unsigned_metadata: String,
}

impl RedstonePayload {
    pub fn new(data_packages: Vec<SignedDataPackage>) -> Self {
        Self {
            data_packages,
            unsigned_metadata: default_unsigned_metadata(),
        }
    }

    pub fn to_bytes(&self) -> RedstoneResult<Vec<u8>> {
        let count = self.data_packages.len();
        if count >= 1 << (8 * DATA_PACKAGES_COUNT_BS) {
            return Err(RedstoneError::PayloadTooLarge {
                field: "data packages count",
                len: count,
            });
        }
        let metadata = self.unsigned_metadata.as_bytes();
        if metadata.len() >= 1 << (8 * UNSIGNED_METADATA_BYTE_SIZE_BS) {
            return Err(RedstoneError::PayloadTooLarge {
                field: "unsigned metadata",
                len: metadata.len(),
            });
        }

        let mut out = Vec::new();
        for package in &self.data_packages {
            out.extend_from_slice(&package.to_bytes()?);
        }
        out.extend_from_slice(&(count as u16).to_be_bytes());
        out.extend_from_slice(metadata);
        out.extend_from_slice(
            &(metadata.len() as u32).to_be_bytes()[4 - UNSIGNED_METADATA_BYTE_SIZE_BS..],
        );
        out.extend_from_slice(&REDSTONE_MARKER);
        Ok(out)
    }

    pub fn to_hex(&self) -> RedstoneResult<String> {
        Ok(format!("0x{}", hex::encode(self.to_bytes()?)))
    }
}
