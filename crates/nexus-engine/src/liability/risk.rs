use crate::config::EngineConfig;
use crate::domain::RiskLevel;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-side ranking key: higher risk first, then larger lookback exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityKey {
    pub risk_rank: u8,
    pub exposure: Decimal,
}

impl PriorityKey {
    pub fn new(risk: RiskLevel, exposure: Option<Decimal>) -> Self {
        Self {
            risk_rank: risk.rank(),
            exposure: exposure.unwrap_or(Decimal::ZERO),
        }
    }
}

/// Whole calendar months between the deadline and `as_of`; `None` while not yet overdue.
pub fn months_overdue(deadline: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    if as_of <= deadline {
        return None;
    }
    let months = (as_of.year() - deadline.year()) * 12 + as_of.month() as i32
        - deadline.month() as i32;
    Some(u32::try_from(months).unwrap_or(0))
}

pub fn assess_risk(
    lookback_liability: Option<Decimal>,
    months_overdue: Option<u32>,
    config: &EngineConfig,
) -> RiskLevel {
    let exposure = lookback_liability.unwrap_or(Decimal::ZERO);
    let overdue_long = months_overdue
        .map(|months| months > config.overdue_months_high_risk)
        .unwrap_or(false);

    if exposure > config.high_risk_threshold || overdue_long {
        RiskLevel::High
    } else if exposure > config.medium_risk_threshold || months_overdue.is_some() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn overdue_months_count_calendar_boundaries() {
        assert_eq!(months_overdue(date(2024, 3, 31), date(2024, 3, 31)), None);
        assert_eq!(months_overdue(date(2024, 3, 20), date(2024, 3, 31)), Some(0));
        assert_eq!(months_overdue(date(2024, 3, 31), date(2025, 1, 2)), Some(10));
    }

    #[test]
    fn risk_thresholds_are_exclusive() {
        let config = EngineConfig::default();
        assert_eq!(assess_risk(Some(dec!(10000)), None, &config), RiskLevel::Medium);
        assert_eq!(assess_risk(Some(dec!(10000.01)), None, &config), RiskLevel::High);
        assert_eq!(assess_risk(Some(dec!(1000)), None, &config), RiskLevel::Low);
        assert_eq!(assess_risk(Some(dec!(5)), Some(0), &config), RiskLevel::Medium);
        assert_eq!(assess_risk(Some(dec!(5)), Some(7), &config), RiskLevel::High);
        assert_eq!(assess_risk(None, None, &config), RiskLevel::Low);
    }

    #[test]
    fn priority_orders_by_risk_then_exposure() {
        let mut keys = vec![
            PriorityKey::new(RiskLevel::Medium, Some(dec!(9000))),
            PriorityKey::new(RiskLevel::High, Some(dec!(11000))),
            PriorityKey::new(RiskLevel::Medium, Some(dec!(9500))),
            PriorityKey::new(RiskLevel::Low, None),
        ];
        keys.sort_by(|a, b| b.cmp(a));

        assert_eq!(keys[0].risk_rank, RiskLevel::High.rank());
        assert_eq!(keys[1].exposure, dec!(9500));
        assert_eq!(keys[3].exposure, Decimal::ZERO);
    }
}
