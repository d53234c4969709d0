use perspective_core::{detect, parse_amount, scan, MAX_AMOUNT, MIN_AMOUNT};
use proptest::prelude::*;

/// Indian-style grouping: last three digits, then pairs
fn indian_grouping(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<String> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right.to_string());
        rest = left;
    }
    groups.push(rest.to_string());
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

#[test]
fn indian_grouping_helper() {
    assert_eq!(indian_grouping(999), "999");
    assert_eq!(indian_grouping(1_234), "1,234");
    assert_eq!(indian_grouping(1_23_456), "1,23,456");
    assert_eq!(indian_grouping(12_34_56_789), "12,34,56,789");
}

#[test]
fn surrounding_prose_does_not_change_amount() {
    let texts = [
        "Deal of the day: ₹2,499 (incl. GST)",
        "You pay Rs.2499 only",
        "Total INR 2,499.00",
        "just 2499 rupees!",
    ];
    for text in texts {
        assert_eq!(detect(text).map(|m| m.amount), Some(2499.0), "{text}");
    }
}

#[test]
fn text_without_prices_yields_nothing() {
    assert!(scan("Free shipping on all orders").is_empty());
    assert!(detect("Version 2.0 released in 2024").is_none());
}

proptest! {
    #[test]
    fn western_and_indian_grouping_agree(value in 1u64..=100_000_000) {
        let western = format!("₹{}", value
            .to_string()
            .as_bytes()
            .rchunks(3)
            .rev()
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(","));
        let indian = format!("₹{}", indian_grouping(value));
        let expected = Some(value as f64);
        prop_assert_eq!(detect(&western).map(|m| m.amount), expected);
        prop_assert_eq!(detect(&indian).map(|m| m.amount), expected);
    }

    #[test]
    fn accepted_amounts_stay_in_range(text in "[₹Rs. 0-9,a-z]{0,40}") {
        for token in scan(&text) {
            prop_assert!(token.amount >= MIN_AMOUNT);
            prop_assert!(token.amount <= MAX_AMOUNT);
            prop_assert!(token.amount.is_finite());
        }
    }

    #[test]
    fn detect_agrees_with_parse_amount(value in 0u64..200_000_000) {
        let text = format!("Rs {value}");
        prop_assert_eq!(detect(&text).map(|m| m.amount), parse_amount(&value.to_string()));
    }
}
