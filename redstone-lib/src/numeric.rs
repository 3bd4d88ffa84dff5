use std::str::FromStr;

use alloy_primitives::U256;
use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};

use crate::error::{RedstoneError, RedstoneResult};

/// Fixed-point precision of every numeric value the data service signs.
pub const VALUE_DECIMALS: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
    HalfUp,
}

impl Rounding {
    fn mode(self) -> RoundingMode {
        match self {
            Rounding::Floor => RoundingMode::Floor,
            Rounding::Ceil => RoundingMode::Ceiling,
            Rounding::HalfUp => RoundingMode::HalfUp,
        }
    }
}

pub fn parse_decimal(value: &str) -> RedstoneResult<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .map_err(|_| RedstoneError::InvalidNumericValue(value.to_string()))
}

/// Decimal digits of `U256::MAX`.
const U256_MAX_DIGITS: i128 = 78;

/// `round(value * 10^decimals)` as an unsigned 256-bit integer.
///
/// Magnitude is checked from the digit count and exponent before anything is
/// scaled, so values like `1e1000000000` fail without materialising the integer.
pub fn scale_to_u256(value: &BigDecimal, decimals: i64, rounding: Rounding) -> RedstoneResult<U256> {
    match value.sign() {
        Sign::Minus => return Err(RedstoneError::NegativeValue(describe(value))),
        Sign::NoSign => return Ok(U256::ZERO),
        Sign::Plus => {}
    }
    let (_, scale) = value.as_bigint_and_exponent();
    // value * 10^decimals == digits * 10^shift
    let shift = i128::from(decimals) - i128::from(scale);
    let integer_digits = i128::from(value.digits()) + shift;
    if integer_digits > U256_MAX_DIGITS {
        return Err(RedstoneError::ValueOverflow(describe(value)));
    }
    if integer_digits < 0 {
        // strictly inside (0, 0.1)
        return Ok(match rounding {
            Rounding::Ceil => U256::from(1u64),
            Rounding::Floor | Rounding::HalfUp => U256::ZERO,
        });
    }

    let factor = BigDecimal::new(BigInt::from(1), -decimals);
    let scaled = (value * &factor).with_scale_round(0, rounding.mode());
    let (digits, _) = scaled.into_bigint_and_exponent();
    let (sign, bytes) = digits.to_bytes_be();
    if sign == Sign::Minus {
        return Err(RedstoneError::NegativeValue(describe(value)));
    }
    U256::try_from_be_slice(&bytes).ok_or_else(|| RedstoneError::ValueOverflow(describe(value)))
}

/// Plain form for ordinary values, `<digits>e<exp>` when the exponent is large.
fn describe(value: &BigDecimal) -> String {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale.unsigned_abs() <= U256_MAX_DIGITS as u64 {
        value.to_string()
    } else {
        format!("{digits}e{}", -i128::from(scale))
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawNumeric {
    Text(String),
    Unsigned(u64),
    Float(f64),
}

impl RawNumeric {
    fn into_decimal(self) -> RedstoneResult<BigDecimal> {
        match self {
            RawNumeric::Text(s) => parse_decimal(&s),
            RawNumeric::Unsigned(v) => Ok(BigDecimal::from(v)),
            // shortest round-trip form, not the binary expansion
            RawNumeric::Float(v) if v.is_finite() => parse_decimal(&v.to_string()),
            RawNumeric::Float(v) => Err(RedstoneError::InvalidNumericValue(v.to_string())),
        }
    }
}

pub mod serde_decimal {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawNumeric;

    pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawNumeric::deserialize(deserializer)?
            .into_decimal()
            .map_err(serde::de::Error::custom)
    }
}

pub mod serde_optional_decimal {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawNumeric;

    pub fn serialize<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawNumeric>::deserialize(deserializer)?
            .map(RawNumeric::into_decimal)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
