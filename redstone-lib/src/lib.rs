pub mod config;
pub mod data_package;
pub mod error;
pub mod numeric;
pub mod payload;
pub mod price;

pub use alloy_primitives::U256;
pub use bigdecimal::BigDecimal;
