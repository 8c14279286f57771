//! Conversion of provider minor-unit amounts into fixed-point decimals.

use rust_decimal::Decimal;

/// Currencies Stripe charges in whole units.
const ZERO_DECIMAL_CURRENCIES: [&str; 16] = [
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Converts an amount in minor units (`999` cents) into a decimal (`9.99`).
pub fn from_minor_units(amount: i64, currency: Option<&str>) -> Decimal {
    let zero_decimal = currency
        .map(|c| {
            ZERO_DECIMAL_CURRENCIES
                .iter()
                .any(|z| z.eq_ignore_ascii_case(c.trim()))
        })
        .unwrap_or(false);

    if zero_decimal {
        Decimal::from(amount)
    } else {
        Decimal::new(amount, 2)
    }
}
