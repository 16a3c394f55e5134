//! Kubernetes resource quantity parsing.
//!
//! Node capacity and container requests/limits arrive as quantity strings
//! (`"500m"`, `"2"`, `"128Mi"`, `"1.5G"`, `"1e3"`). Values are converted to
//! integers in the unit the scheduler accounts in, rounding any fractional
//! remainder up the same way Kubernetes `Value()`/`MilliValue()` do.

use crate::{PackschedError, Result};

const MAX_POW10: i32 = 38;

/// Multiplier expressed by a quantity suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    /// Power of 1024 (`Ki` = 1, `Mi` = 2, ...)
    Binary(u32),
    /// Power of 10 (`m` = -3, `k` = 3, `e6` = 6, ...)
    Decimal(i32),
}

impl Suffix {
    fn parse(raw: &str, suffix: &str) -> Result<Self> {
        let suffix = match suffix {
            "" => Suffix::Decimal(0),
            "Ki" => Suffix::Binary(1),
            "Mi" => Suffix::Binary(2),
            "Gi" => Suffix::Binary(3),
            "Ti" => Suffix::Binary(4),
            "Pi" => Suffix::Binary(5),
            "Ei" => Suffix::Binary(6),
            "n" => Suffix::Decimal(-9),
            "u" => Suffix::Decimal(-6),
            "m" => Suffix::Decimal(-3),
            "k" => Suffix::Decimal(3),
            "M" => Suffix::Decimal(6),
            "G" => Suffix::Decimal(9),
            "T" => Suffix::Decimal(12),
            "P" => Suffix::Decimal(15),
            "E" => Suffix::Decimal(18),
            other => {
                let exponent = other
                    .strip_prefix('e')
                    .or_else(|| other.strip_prefix('E'))
                    .and_then(|exp| exp.parse::<i32>().ok())
                    .ok_or_else(|| {
                        PackschedError::invalid_quantity(raw, format!("unknown suffix '{}'", other))
                    })?;
                Suffix::Decimal(exponent)
            }
        };

        Ok(suffix)
    }
}

/// Parse `raw` and express it as an integer count of `10^unit_exp` units.
fn parse_scaled(raw: &str, unit_exp: i32) -> Result<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(PackschedError::invalid_quantity(raw, "empty quantity"));
    }
    if s.starts_with('-') {
        return Err(PackschedError::invalid_quantity(raw, "negative quantities are not allowed"));
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let number_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(number_end);

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(PackschedError::invalid_quantity(raw, "missing numeric value"));
    }
    if fraction.contains('.') {
        return Err(PackschedError::invalid_quantity(raw, "more than one decimal point"));
    }

    let out_of_range = || PackschedError::invalid_quantity(raw, "value out of range");

    let mut mantissa: i128 = 0;
    for digit in whole.bytes().chain(fraction.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(digit - b'0')))
            .ok_or_else(out_of_range)?;
    }

    let fraction_digits = i32::try_from(fraction.len()).map_err(|_| out_of_range())?;
    let mut exp10 = unit_exp - fraction_digits;
    let mut numerator = mantissa;

    match Suffix::parse(raw, suffix)? {
        Suffix::Binary(power) => {
            numerator = 1024i128
                .checked_pow(power)
                .and_then(|multiplier| numerator.checked_mul(multiplier))
                .ok_or_else(out_of_range)?;
        }
        Suffix::Decimal(power) => {
            exp10 = exp10.checked_add(power).ok_or_else(out_of_range)?;
        }
    }

    let value = if exp10 >= 0 {
        if numerator != 0 && exp10 > MAX_POW10 {
            return Err(out_of_range());
        }
        10i128
            .checked_pow(exp10.min(MAX_POW10) as u32)
            .and_then(|multiplier| numerator.checked_mul(multiplier))
            .ok_or_else(out_of_range)?
    } else if -exp10 > MAX_POW10 {
        // Anything this small rounds up to a single unit
        i128::from(numerator > 0)
    } else {
        let denominator = 10i128.pow((-exp10) as u32);
        numerator / denominator + i128::from(numerator % denominator != 0)
    };

    i64::try_from(value).map_err(|_| out_of_range())
}

/// Parse a CPU quantity into millicores (`"2"` -> 2000, `"250m"` -> 250)
pub fn parse_cpu(s: &str) -> Result<i64> {
    parse_scaled(s, 3)
}

/// Parse a memory quantity into bytes (`"128Mi"` -> 134217728, `"1G"` -> 10^9)
pub fn parse_memory(s: &str) -> Result<i64> {
    parse_scaled(s, 0)
}

/// Parse a plain count quantity such as a node's `pods` capacity
pub fn parse_count(s: &str) -> Result<i64> {
    parse_scaled(s, 0)
}

/// Render a byte count using the largest binary unit that divides it evenly.
///
/// `"16Gi"`, `"500Mi"`, `"512Ki"`, or raw bytes.
pub fn format_memory(bytes: i64) -> String {
    const GIB: i64 = 1024 * 1024 * 1024;
    const MIB: i64 = 1024 * 1024;
    const KIB: i64 = 1024;

    if bytes > 0 && bytes % GIB == 0 {
        format!("{}Gi", bytes / GIB)
    } else if bytes > 0 && bytes % MIB == 0 {
        format!("{}Mi", bytes / MIB)
    } else if bytes > 0 && bytes % KIB == 0 {
        format!("{}Ki", bytes / KIB)
    } else {
        format!("{}", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu() {
        assert_eq!(parse_cpu("1").unwrap(), 1000);
        assert_eq!(parse_cpu("0.5").unwrap(), 500);
        assert_eq!(parse_cpu("100m").unwrap(), 100);
        assert_eq!(parse_cpu("2").unwrap(), 2000);
        assert_eq!(parse_cpu("0").unwrap(), 0);
        assert_eq!(parse_cpu("1k").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_cpu_rounds_up() {
        // Sub-millicore precision rounds up like MilliValue()
        assert_eq!(parse_cpu("0.0001").unwrap(), 1);
        assert_eq!(parse_cpu("1500u").unwrap(), 2);
    }

    #[test]
    fn test_parse_memory() {
        assert_eq!(parse_memory("1024").unwrap(), 1024);
        assert_eq!(parse_memory("1Ki").unwrap(), 1024);
        assert_eq!(parse_memory("128Mi").unwrap(), 128 * 1024 * 1024);
        assert_eq!(parse_memory("1Gi").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_memory("1G").unwrap(), 1_000_000_000);
        assert_eq!(parse_memory("1.5Gi").unwrap(), 1536 * 1024 * 1024);
        assert_eq!(parse_memory("1e3").unwrap(), 1000);
        assert_eq!(parse_memory("2E").unwrap(), 2_000_000_000_000_000_000);
    }

    #[test]
    fn test_parse_huge_milli_mantissa() {
        // i128::MAX with a milli suffix must not overflow while rounding up
        let err = parse_memory("170141183460469231731687303715884105727m").unwrap_err();
        assert!(matches!(err, PackschedError::InvalidQuantity { .. }));
        assert!(parse_cpu("170141183460469231731687303715884105727n").is_err());

        assert_eq!(parse_memory("1999m").unwrap(), 2);
        assert_eq!(parse_memory("2000m").unwrap(), 2);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("110").unwrap(), 110);
        assert_eq!(parse_count("+3").unwrap(), 3);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_memory("").is_err());
        assert!(parse_memory("-1Gi").is_err());
        assert!(parse_memory("Gi").is_err());
        assert!(parse_memory("12Qi").is_err());
        assert!(parse_memory("1.2.3").is_err());
        assert!(parse_cpu("abc").is_err());
        assert!(parse_memory("100Ei").is_err());
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(16 * 1024 * 1024 * 1024), "16Gi");
        assert_eq!(format_memory(500 * 1024 * 1024), "500Mi");
        assert_eq!(format_memory(512 * 1024), "512Ki");
        assert_eq!(format_memory(1023), "1023");
        assert_eq!(format_memory(0), "0");
    }
}
