//! Currency parsing
//!
//! OCR and model output render the same figure many ways: "$85,000.00",
//! "85000", "(1,234.56)", "-1234.56". The parser collapses them all to
//! one numeric value and returns `None` for anything non-numeric, never
//! an error, so a bad cell degrades to a null leaf instead of aborting
//! an extraction.

/// Parse a monetary string. Strips currency symbols, commas and
/// whitespace; treats parenthesized or leading-minus values as
/// negative.
pub fn parse_money(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut negative = false;
    let mut body = trimmed;

    if body.starts_with('(') && body.ends_with(')') && body.len() >= 2 {
        negative = true;
        body = &body[1..body.len() - 1];
    }

    let mut cleaned = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '$' | ',' => continue,
            c if c.is_whitespace() => continue,
            c => cleaned.push(c),
        }
    }

    if let Some(stripped) = cleaned.strip_prefix('-') {
        negative = !negative;
        cleaned = stripped.to_string();
    }

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| if negative { -v } else { v })
}

/// Numeric equality under an absolute tolerance.
pub fn values_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Exact numeric equality after formatting differences are stripped.
/// Two strings that both parse and land within a thousandth of a
/// currency unit are the same figure.
pub fn numerically_equal(a: &str, b: &str) -> bool {
    match (parse_money(a), parse_money(b)) {
        (Some(x), Some(y)) => values_match(x, y, 1e-3),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_money("85000"), Some(85000.0));
        assert_eq!(parse_money("85000.25"), Some(85000.25));
        assert_eq!(parse_money("0"), Some(0.0));
    }

    #[test]
    fn test_currency_formatting_stripped() {
        assert_eq!(parse_money("$85,000.00"), Some(85000.0));
        assert_eq!(parse_money(" $ 1,234,567.89 "), Some(1234567.89));
        assert_eq!(parse_money("1 234"), Some(1234.0));
    }

    #[test]
    fn test_negative_conventions() {
        assert_eq!(parse_money("(1,234.56)"), Some(-1234.56));
        assert_eq!(parse_money("-1234.56"), Some(-1234.56));
        assert_eq!(parse_money("($500)"), Some(-500.0));
        assert_eq!(parse_money("(-500)"), Some(500.0));
    }

    #[test]
    fn test_non_numeric_returns_none() {
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("N/A"), None);
        assert_eq!(parse_money("see attached"), None);
        assert_eq!(parse_money("12-34"), None);
        assert_eq!(parse_money("()"), None);
        assert_eq!(parse_money("$"), None);
    }

    #[test]
    fn test_numerically_equal() {
        assert!(numerically_equal("$85,000.00", "85000"));
        assert!(numerically_equal("(1,234)", "-1234.00"));
        assert!(!numerically_equal("41999", "42000"));
        assert!(!numerically_equal("abc", "abc"));
    }

    proptest! {
        /// Formatting variants of the same value all parse equal.
        #[test]
        fn property_formatting_invariant(value in -10_000_000.0..10_000_000.0f64) {
            let cents = (value * 100.0).round() / 100.0;
            let plain = format!("{:.2}", cents);
            let with_symbol = format!("${:.2}", cents.abs());
            let with_commas = group_thousands(&format!("{:.2}", cents.abs()));

            let parsed_plain = parse_money(&plain).unwrap();
            prop_assert!(values_match(parsed_plain, cents, 1e-6));

            let expected_abs = cents.abs();
            prop_assert!(values_match(parse_money(&with_symbol).unwrap(), expected_abs, 1e-6));
            prop_assert!(values_match(parse_money(&with_commas).unwrap(), expected_abs, 1e-6));

            if cents < 0.0 {
                let parenthetical = format!("({})", group_thousands(&format!("{:.2}", cents.abs())));
                prop_assert!(values_match(parse_money(&parenthetical).unwrap(), cents, 1e-6));
            }
        }
    }

    fn group_thousands(s: &str) -> String {
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        let digits: Vec<char> = int_part.chars().collect();
        let mut grouped = String::new();
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        if frac_part.is_empty() {
            grouped
        } else {
            format!("{}.{}", grouped, frac_part)
        }
    }
}
