/// Insert a comma every three digits of a run of ASCII digits: 1234567 -> 1,234,567
pub fn group_digits(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

fn grouped(value: i128) -> String {
    group_digits(&value.unsigned_abs().to_string())
}

/// A plain decimal token held as an exact whole part plus a fractional
/// remainder (`|fraction| < 1`). Digit runs far beyond `f64` precision keep
/// every digit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decimal {
    pub whole: i128,
    pub fraction: f64,
}

impl Decimal {
    /// Parse `[-]digits[.digits]` once commas are removed. Exponents, `NaN`
    /// and digit runs past `i128` are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let plain = text.trim().replace(',', "");
        let (negative, body) = match plain.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, plain.as_str()),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !digits(int_part) || !digits(frac_part) {
            return None;
        }
        let whole: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let fraction: f64 = if frac_part.is_empty() {
            0.0
        } else {
            format!("0.{frac_part}").parse().ok()?
        };
        Some(if negative {
            Self { whole: -whole, fraction: -fraction }
        } else {
            Self { whole, fraction }
        })
    }

    pub fn is_whole(&self) -> bool {
        self.fraction == 0.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let fraction = self.fraction + other.fraction;
        let carry = fraction.trunc();
        let whole = self
            .whole
            .checked_add(other.whole)?
            .checked_add(carry as i128)?;
        Some(Self {
            whole,
            fraction: fraction - carry,
        })
    }

    /// Nearest whole value, halves away from zero.
    pub fn round(&self) -> i128 {
        let floor = self.fraction.floor();
        let base = self.whole + floor as i128;
        let rest = self.fraction - floor;
        if rest > 0.5 || (rest == 0.5 && base >= 0) {
            base + 1
        } else {
            base
        }
    }
}

/// Display form of a single normalized amount token.
///
/// Values at or above `unit_threshold` that divide evenly are shown in the
/// coarser unit (2,000,000 -> 2). A threshold of 0 never rescales. Fractions
/// are truncated, negatives keep a leading `-`, and anything that is not a
/// plain decimal is returned unchanged.
pub fn format_amount(amount: &str, unit_threshold: u64) -> String {
    if amount.is_empty() {
        return String::new();
    }
    let Some(value) = Decimal::parse(amount) else {
        return amount.to_string();
    };
    let unit = i128::from(unit_threshold);
    let whole = if unit > 0
        && value.is_whole()
        && value.whole.abs() >= unit
        && value.whole % unit == 0
    {
        value.whole / unit
    } else {
        value.whole
    };
    if whole < 0 {
        format!("-{}", grouped(whole))
    } else {
        grouped(whole)
    }
}

/// Display form of a consolidated total: rounded to whole units and grouped,
/// with `negative_marker` in front of negative totals instead of `-`.
pub fn format_total(total: Decimal, negative_marker: &str) -> String {
    let rounded = total.round();
    if rounded < 0 {
        format!("{negative_marker}{}", grouped(rounded))
    } else {
        grouped(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MILLION: u64 = 1_000_000;

    fn dec(text: &str) -> Decimal {
        Decimal::parse(text).unwrap()
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits("1234567"), "1,234,567");
        assert_eq!(group_digits("100"), "100");
        assert_eq!(group_digits("1000"), "1,000");
        assert_eq!(group_digits("0"), "0");
    }

    #[test]
    fn test_format_amount_groups_plain_values() {
        assert_eq!(format_amount("1234567", MILLION), "1,234,567");
        assert_eq!(format_amount("1,234,567", MILLION), "1,234,567");
        assert_eq!(format_amount("-500,000", MILLION), "-500,000");
        assert_eq!(format_amount("42", MILLION), "42");
    }

    #[test]
    fn test_format_amount_unit_rescale() {
        assert_eq!(format_amount("2,000,000", MILLION), "2");
        assert_eq!(format_amount("1,000,000", MILLION), "1");
        assert_eq!(format_amount("15,000,000,000", MILLION), "15,000");
        assert_eq!(format_amount("-3,000,000", MILLION), "-3");
        // Not evenly divisible: shown as-is
        assert_eq!(format_amount("2,500,000", MILLION), "2,500,000");
        // Below threshold never rescales
        assert_eq!(format_amount("0", MILLION), "0");
    }

    #[test]
    fn test_format_amount_passthrough() {
        assert_eq!(format_amount("", MILLION), "");
        assert_eq!(format_amount("n/a", MILLION), "n/a");
        assert_eq!(format_amount("1,2x", MILLION), "1,2x");
        assert_eq!(format_amount("NaN", MILLION), "NaN");
    }

    #[test]
    fn test_format_amount_reparses_to_same_value() {
        for token in ["1,234,567", "-98,765", "999,999", "12"] {
            let shown = format_amount(token, MILLION);
            let back: f64 = shown.replace(',', "").parse().unwrap();
            let orig: f64 = token.replace(',', "").parse().unwrap();
            assert_eq!(back, orig, "{token} -> {shown}");
        }
    }

    #[test]
    fn test_format_amount_threshold_zero_never_rescales() {
        assert_eq!(format_amount("2,000,000", 0), "2,000,000");
    }

    #[test]
    fn test_format_amount_truncates_fraction() {
        assert_eq!(format_amount("1234.99", MILLION), "1,234");
        assert_eq!(format_amount("-0.5", MILLION), "0");
        // A fractional value is never evenly divisible
        assert_eq!(format_amount("2000000.5", MILLION), "2,000,000");
    }

    #[test]
    fn test_format_amount_keeps_digits_beyond_f64() {
        // 2^53 + 1 is not representable as f64
        assert_eq!(format_amount("9,007,199,254,740,993", MILLION), "9,007,199,254,740,993");
        assert_eq!(
            format_amount("123,456,789,012,345,678,000,000", MILLION),
            "123,456,789,012,345,678"
        );
    }

    #[test]
    fn test_decimal_parse() {
        assert_eq!(dec("1,234"), Decimal { whole: 1234, fraction: 0.0 });
        assert_eq!(dec("-12.5"), Decimal { whole: -12, fraction: -0.5 });
        assert_eq!(dec(".25"), Decimal { whole: 0, fraction: 0.25 });
        assert!(Decimal::parse("").is_none());
        assert!(Decimal::parse("-").is_none());
        assert!(Decimal::parse("1e5").is_none());
        assert!(Decimal::parse("1.2.3").is_none());
    }

    #[test]
    fn test_decimal_checked_add_carries_fractions() {
        let sum = dec("1.75").checked_add(dec("2.5")).unwrap();
        assert_eq!(sum.whole, 4);
        assert!((sum.fraction - 0.25).abs() < 1e-9);
        let max = Decimal { whole: i128::MAX, fraction: 0.0 };
        assert!(max.checked_add(dec("1")).is_none());
    }

    #[test]
    fn test_decimal_round_half_away_from_zero() {
        assert_eq!(dec("1234.5").round(), 1235);
        assert_eq!(dec("1234.4").round(), 1234);
        assert_eq!(dec("-2.5").round(), -3);
        assert_eq!(dec("-2.4").round(), -2);
        let mixed = dec("-1").checked_add(dec("0.5")).unwrap();
        assert_eq!(mixed.round(), -1);
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(dec("3234567"), "△"), "3,234,567");
        assert_eq!(format_total(dec("-500000"), "△"), "△500,000");
        assert_eq!(format_total(Decimal::default(), "△"), "0");
        assert_eq!(format_total(dec("1234.6"), "△"), "1,235");
        assert_eq!(format_total(dec("2000000"), "△"), "2,000,000");
        assert_eq!(format_total(dec("-9007199254740993"), "△"), "△9,007,199,254,740,993");
    }
}
