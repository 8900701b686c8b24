//! Integer token amounts
//!
//! Amounts are unscaled integers in the token's smallest unit. They cross the
//! wire as decimal strings so no precision is lost in JSON number handling.

use alloy_primitives::U256;

use crate::error::AgentWalletError;
use crate::Result;

/// Parse a non-negative decimal integer string.
pub fn parse_amount(raw: &str) -> Result<U256> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AgentWalletError::invalid_amount(format!(
            "expected a non-negative integer, got '{}'",
            raw
        )));
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| AgentWalletError::invalid_amount(format!("'{}': {}", raw, e)))
}

/// Render `balance / 10^decimals` with exactly `decimals` fractional digits.
///
/// `format_balance(U256::from(1_000_000_000u64), 6)` is `"1000.000000"`.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    let width = decimals as usize;
    let (whole, fraction) = match U256::from(10u64).checked_pow(U256::from(decimals)) {
        Some(divisor) => (balance / divisor, balance % divisor),
        // 10^decimals exceeds U256, so every representable amount is fractional
        None => (U256::ZERO, balance),
    };
    format!("{}.{:0>width$}", whole, fraction.to_string(), width = width)
}

/// Serde adapter for `U256` as a decimal string.
///
/// Decoding also accepts a plain non-negative JSON integer of any width;
/// `serde_json` is built with `arbitrary_precision` so the digits arrive intact.
pub mod decimal {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<U256, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse_amount(&s).map_err(de::Error::custom),
            Value::Number(n) => parse_amount(&n.to_string()).map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected an amount string or integer, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_format_balance_usdc() {
        assert_eq!(format_balance(U256::from(1_000_000_000u64), 6), "1000.000000");
        assert_eq!(format_balance(U256::from(10_000_000u64), 6), "10.000000");
        assert_eq!(format_balance(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_balance(U256::from(123_456_789u64), 6), "123.456789");
    }

    #[test]
    fn test_format_balance_zero_decimals() {
        assert_eq!(format_balance(U256::from(42u64), 0), "42.0");
    }

    #[test]
    fn test_format_balance_wei_beyond_u64() {
        let amount = parse_amount("123456789000000000000000").unwrap();
        assert_eq!(format_balance(amount, 18), "123456.789000000000000000");
    }

    #[test]
    fn test_format_balance_huge_decimals() {
        assert_eq!(
            format_balance(U256::from(5u64), 80),
            format!("0.{}5", "0".repeat(79))
        );
    }

    #[test]
    fn test_parse_amount_rejects_non_integers() {
        for raw in ["", "-5", "1.5", "+3", "0x10", "12a"] {
            assert!(
                matches!(parse_amount(raw), Err(AgentWalletError::InvalidAmount(_))),
                "'{}' should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_parse_amount_overflow() {
        let too_big = format!("1{}", "0".repeat(80));
        assert!(parse_amount(&too_big).is_err());
    }

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "decimal")]
        amount: U256,
    }

    #[test]
    fn test_decimal_serde_uses_strings() {
        let holder = Holder {
            amount: parse_amount("1000000000000000000000").unwrap(),
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"amount":"1000000000000000000000"}"#);

        let from_number: Holder = serde_json::from_str(r#"{"amount":250}"#).unwrap();
        assert_eq!(from_number.amount, U256::from(250u64));

        assert!(serde_json::from_str::<Holder>(r#"{"amount":"-1"}"#).is_err());
    }

    #[test]
    fn test_decimal_accepts_integers_beyond_u64() {
        let holder: Holder = serde_json::from_str(r#"{"amount":18446744073709551616}"#).unwrap();
        assert_eq!(holder.amount, U256::from(u64::MAX) + U256::from(1u64));

        let holder: Holder = serde_json::from_str(r#"{"amount":50000000000000000000000}"#).unwrap();
        assert_eq!(holder.amount.to_string(), "50000000000000000000000");
    }

    #[test]
    fn test_decimal_rejects_non_integer_numbers() {
        for json in [r#"{"amount":-5}"#, r#"{"amount":1.5}"#, r#"{"amount":true}"#, r#"{"amount":null}"#] {
            assert!(serde_json::from_str::<Holder>(json).is_err(), "{} should be rejected", json);
        }
    }
}
