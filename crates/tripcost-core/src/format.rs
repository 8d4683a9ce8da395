//! Currency display

/// Format an amount as `"{symbol} 1,234,567.89"`.
///
/// Two decimals, comma thousands separators, sign before the digits.
/// Non-finite amounts are shown as-is.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{} {}", symbol, amount);
    }

    // `{:.2}` rounds the exact binary value, so 2.675 stays 2.67.
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    format!(
        "{} {}{}.{}",
        symbol,
        if negative { "-" } else { "" },
        group_thousands(whole),
        fraction
    )
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_currency(0.0, "₹"), "₹ 0.00");
        assert_eq!(format_currency(999.0, "₹"), "₹ 999.00");
        assert_eq!(format_currency(1000.0, "₹"), "₹ 1,000.00");
        assert_eq!(format_currency(1234567.891, "₹"), "₹ 1,234,567.89");
        assert_eq!(format_currency(123456.0, "$"), "$ 123,456.00");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(format_currency(999.999, "₹"), "₹ 1,000.00");
        assert_eq!(format_currency(12.3, "₹"), "₹ 12.30");
        // Ties are decided by the stored binary value, not the decimal literal.
        assert_eq!(format_currency(2.675, "₹"), "₹ 2.67");
        assert_eq!(format_currency(1.115, "₹"), "₹ 1.11");
        assert_eq!(format_currency(0.125, "₹"), "₹ 0.12");
        assert_eq!(format_currency(0.375, "₹"), "₹ 0.38");
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_currency(-1234.5, "₹"), "₹ -1,234.50");
        assert_eq!(format_currency(-0.001, "₹"), "₹ 0.00");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_currency(f64::NAN, "₹"), "₹ NaN");
        assert_eq!(format_currency(f64::INFINITY, "₹"), "₹ inf");
    }
}
