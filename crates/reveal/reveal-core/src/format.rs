//! Display formatting for counter values.

/// Round `value` to the nearest integer and group thousands with `separator`.
/// Non-finite input formats as "0". Fractional digits are never printed.
pub fn group_thousands(value: f64, separator: char) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round();
    // -0.4 rounds to -0; never show a signed zero.
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// `prefix + grouped(value) + suffix`.
pub fn counter_display(prefix: &str, value: f64, suffix: &str, separator: char) -> String {
    format!("{prefix}{}{suffix}", group_thousands(value, separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_three() {
        assert_eq!(group_thousands(0.0, ','), "0");
        assert_eq!(group_thousands(999.0, ','), "999");
        assert_eq!(group_thousands(1000.0, ','), "1,000");
        assert_eq!(group_thousands(1200.0, ','), "1,200");
        assert_eq!(group_thousands(123456.0, ','), "123,456");
        assert_eq!(group_thousands(1234567.0, '.'), "1.234.567");
    }

    #[test]
    fn rounds_before_grouping() {
        assert_eq!(group_thousands(999.6, ','), "1,000");
        assert_eq!(group_thousands(12.4, ','), "12");
    }

    #[test]
    fn negatives_and_signed_zero() {
        assert_eq!(group_thousands(-1500.0, ','), "-1,500");
        assert_eq!(group_thousands(-0.4, ','), "0");
    }

    #[test]
    fn non_finite_is_zero() {
        assert_eq!(group_thousands(f64::NAN, ','), "0");
        assert_eq!(group_thousands(f64::INFINITY, ','), "0");
        assert_eq!(counter_display("$", f64::NAN, "+", ','), "$0+");
    }
}
