//! Liability estimation for jurisdictions where the seller has nexus and the
//! jurisdiction taxes sales.
//!
//! Amounts are computed over the analysis-period taxable base (sales that are neither
//! marketplace-facilitated nor flagged exempt) reduced by the assumed exemption rate.
//! The lookback figure re-runs the same math over `[lookback_start, period_end]` at the
//! mid rate, and penalty and interest accrue on it once the registration deadline has
//! passed the configured `as_of` date.

mod recommendation;
mod risk;

pub use recommendation::{liability_recommendation, NexusSignal, RegistrationState};
pub use risk::{assess_risk, months_overdue, PriorityKey};

use crate::analysis::aggregate::ActivitySnapshot;
use crate::analysis::NexusDetermination;
use crate::config::EngineConfig;
use crate::domain::{ConfidenceLevel, Jurisdiction, RiskLevel};
use crate::reference::{JurisdictionTaxConfig, ReferenceData};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityEstimate {
    pub jurisdiction: Jurisdiction,
    pub confidence: ConfidenceLevel,
    pub taxable_sales: Option<Decimal>,
    pub liability_low: Option<Decimal>,
    pub liability_mid: Option<Decimal>,
    pub liability_high: Option<Decimal>,
    pub lookback_start: Option<NaiveDate>,
    pub lookback_liability: Option<Decimal>,
    pub penalty: Option<Decimal>,
    pub interest: Option<Decimal>,
    pub total_with_penalties: Option<Decimal>,
    pub months_overdue: Option<u32>,
    pub risk: RiskLevel,
    pub recommendation: String,
    pub priority: PriorityKey,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assumptions: Vec<String>,
}

/// Liability amounts for one jurisdiction before risk is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Amounts {
    taxable_sales: Decimal,
    low: Decimal,
    mid: Decimal,
    high: Decimal,
    lookback_start: NaiveDate,
    lookback_liability: Decimal,
}

pub struct LiabilityEstimator<'a> {
    reference: &'a ReferenceData,
    snapshot: &'a ActivitySnapshot,
    config: &'a EngineConfig,
}

impl<'a> LiabilityEstimator<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        snapshot: &'a ActivitySnapshot,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            reference,
            snapshot,
            config,
        }
    }

    /// `None` unless the determination has nexus in a jurisdiction with a sales tax.
    pub fn estimate(&self, determination: &NexusDetermination) -> Option<LiabilityEstimate> {
        if !determination.has_nexus() || !determination.has_sales_tax {
            return None;
        }
        let jurisdiction = determination.jurisdiction;
        let amounts = self
            .reference
            .tax_config(jurisdiction)
            .map(|tax| self.amounts(determination, tax));

        let deadline = determination.registration_deadline;
        let months_overdue =
            deadline.and_then(|deadline| months_overdue(deadline, self.config.as_of));
        let lookback_liability = amounts.map(|amounts| amounts.lookback_liability);

        let (penalty, interest) = match (lookback_liability, months_overdue) {
            (Some(base), Some(months)) => (
                Some(money(base * self.config.penalty_rate)),
                Some(money(
                    base * self.config.monthly_interest_rate * Decimal::from(months),
                )),
            ),
            _ => (None, None),
        };
        let total_with_penalties = lookback_liability.map(|base| {
            base + penalty.unwrap_or(Decimal::ZERO) + interest.unwrap_or(Decimal::ZERO)
        });

        let risk = assess_risk(lookback_liability, months_overdue, self.config);
        let recommendation = liability_recommendation(
            NexusSignal::from_flags(
                determination.has_physical_nexus,
                determination.has_economic_nexus,
            ),
            risk,
            RegistrationState::resolve(deadline, self.config.as_of),
            penalty.map(|value| value > Decimal::ZERO).unwrap_or(false),
        );
        let assumptions = match self.reference.tax_config(jurisdiction) {
            Some(tax) => self.assumptions(jurisdiction, tax),
            None => vec!["No tax rates on file; amounts not estimated".to_string()],
        };

        Some(LiabilityEstimate {
            jurisdiction,
            confidence: if amounts.is_some() {
                determination.confidence
            } else {
                ConfidenceLevel::Low
            },
            taxable_sales: amounts.map(|amounts| amounts.taxable_sales),
            liability_low: amounts.map(|amounts| amounts.low),
            liability_mid: amounts.map(|amounts| amounts.mid),
            liability_high: amounts.map(|amounts| amounts.high),
            lookback_start: amounts.map(|amounts| amounts.lookback_start),
            lookback_liability,
            penalty,
            interest,
            total_with_penalties,
            months_overdue,
            risk,
            recommendation,
            priority: PriorityKey::new(risk, lookback_liability),
            assumptions,
        })
    }

    fn amounts(&self, determination: &NexusDetermination, tax: &JurisdictionTaxConfig) -> Amounts {
        let period = self.snapshot.period;
        let activity = self.snapshot.activity(determination.jurisdiction);
        let retained = Decimal::ONE - self.config.default_exemption_rate;

        let taxable_base = activity.analysis_period.taxable_base().max(Decimal::ZERO);
        let taxable_sales = money(taxable_base * retained);
        let low = money(taxable_sales * tax.state_rate);
        let high = money(taxable_sales * (tax.state_rate + tax.avg_local_rate));
        let mid = money((low + high) / Decimal::TWO);

        let established = determination.established_date.unwrap_or(period.start);
        let lookback_start = self
            .reference
            .lookback_months(determination.jurisdiction)
            .and_then(|months| established.checked_sub_months(Months::new(months)))
            .unwrap_or(established);
        let lookback_taxable = activity
            .totals_between(lookback_start, period.end)
            .taxable_base()
            .max(Decimal::ZERO)
            * retained;
        let mid_rate = tax.state_rate + tax.avg_local_rate / Decimal::TWO;

        Amounts {
            taxable_sales,
            low,
            mid,
            high,
            lookback_start,
            lookback_liability: money(lookback_taxable * mid_rate),
        }
    }

    fn assumptions(&self, jurisdiction: Jurisdiction, tax: &JurisdictionTaxConfig) -> Vec<String> {
        let hundred = Decimal::ONE_HUNDRED;
        let mut notes = vec![
            format!(
                "Exemption rate: {}% assumed for sales without an exemption flag",
                (self.config.default_exemption_rate * hundred).normalize()
            ),
            format!("State rate: {}%", (tax.state_rate * hundred).normalize()),
        ];
        if tax.avg_local_rate > Decimal::ZERO {
            notes.push(format!(
                "Average local rate: {}%; low uses the state rate, mid adds half the local rate, high adds all of it",
                (tax.avg_local_rate * hundred).normalize()
            ));
        } else {
            notes.push("No local sales tax".to_string());
        }
        if let Some(months) = self.reference.lookback_months(jurisdiction) {
            notes.push(format!("Lookback period: {months} months"));
        }
        notes
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}
