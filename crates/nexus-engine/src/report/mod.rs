mod summary;

pub use summary::{
    ApproachingJurisdiction, JurisdictionExposure, LiabilitySummary, NexusSummary, RiskGroup,
    StatusCount,
};

use rust_decimal::Decimal;

/// Dollar amount with two decimals and thousands separators, e.g. `$12,345.60`.
pub fn format_money(value: Decimal) -> String {
    let rounded = format!("{:.2}", value.abs().round_dp(2));
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}
