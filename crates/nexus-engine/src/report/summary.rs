use super::format_money;
use crate::analysis::{AnalysisOutcome, NexusDetermination};
use crate::domain::{ConfidenceLevel, Jurisdiction, NexusStatus, RiskLevel};
use crate::liability::LiabilityEstimate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const DEFAULT_ACTION: &str =
    "Register in each nexus jurisdiction and begin collecting prospectively";
const TOP_EXPOSURES: usize = 5;
const COMPLIANCE_PLAN_THRESHOLD: Decimal = dec!(100000);

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: NexusStatus,
    pub status_label: &'static str,
    pub jurisdictions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproachingJurisdiction {
    pub jurisdiction: Jurisdiction,
    pub name: &'static str,
    pub threshold_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_threshold: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NexusSummary {
    pub total_jurisdictions: usize,
    pub by_status: Vec<StatusCount>,
    pub physical_nexus: usize,
    pub economic_nexus: usize,
    pub physical_and_economic: usize,
    pub approaching: Vec<ApproachingJurisdiction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<String>,
}

impl NexusSummary {
    pub fn from_determinations(determinations: &[NexusDetermination]) -> Self {
        let by_status = NexusStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                status_label: status.label(),
                jurisdictions: determinations
                    .iter()
                    .filter(|determination| determination.nexus_status == status)
                    .count(),
            })
            .collect();

        let physical_nexus = determinations
            .iter()
            .filter(|determination| determination.has_physical_nexus)
            .count();
        let economic_nexus = determinations
            .iter()
            .filter(|determination| determination.has_economic_nexus)
            .count();
        let physical_and_economic = determinations
            .iter()
            .filter(|determination| {
                determination.has_physical_nexus && determination.has_economic_nexus
            })
            .count();

        let mut approaching: Vec<ApproachingJurisdiction> = determinations
            .iter()
            .filter(|determination| determination.nexus_status == NexusStatus::CloseToThreshold)
            .map(|determination| ApproachingJurisdiction {
                jurisdiction: determination.jurisdiction,
                name: determination.jurisdiction.name(),
                threshold_pct: determination.threshold_pct,
                days_until_threshold: determination.days_until_threshold,
            })
            .collect();
        approaching.sort_by(|a, b| b.threshold_pct.cmp(&a.threshold_pct));

        let mut observations = Vec::new();
        let untaxed_presence: Vec<&str> = determinations
            .iter()
            .filter(|determination| determination.has_nexus() && !determination.has_sales_tax)
            .map(|determination| determination.jurisdiction.code())
            .collect();
        if !untaxed_presence.is_empty() {
            observations.push(format!(
                "Nexus without a sales tax (no registration needed): {}",
                untaxed_presence.join(", ")
            ));
        }
        if let Some(closest) = approaching.first() {
            observations.push(format!(
                "{} is closest to its threshold at {}%",
                closest.name,
                closest
                    .threshold_pct
                    .map(|pct| pct.to_string())
                    .unwrap_or_default()
            ));
        }
        let low_confidence = determinations
            .iter()
            .filter(|determination| determination.confidence == ConfidenceLevel::Low)
            .count();
        if low_confidence > 0 {
            observations.push(format!(
                "{low_confidence} determination(s) rest on incomplete reference data"
            ));
        }

        Self {
            total_jurisdictions: determinations.len(),
            by_status,
            physical_nexus,
            economic_nexus,
            physical_and_economic,
            approaching,
            observations,
        }
    }

    pub fn count(&self, status: NexusStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.jurisdictions)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskGroup {
    pub risk: RiskLevel,
    pub risk_label: &'static str,
    pub jurisdictions: Vec<Jurisdiction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JurisdictionExposure {
    pub jurisdiction: Jurisdiction,
    pub name: &'static str,
    pub liability_mid: Decimal,
    pub risk: RiskLevel,
    pub risk_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiabilitySummary {
    pub jurisdictions: usize,
    pub total_low: Decimal,
    pub total_mid: Decimal,
    pub total_high: Decimal,
    pub total_lookback: Decimal,
    pub total_penalties: Decimal,
    pub total_interest: Decimal,
    pub total_with_penalties: Decimal,
    pub by_risk: Vec<RiskGroup>,
    pub top_exposures: Vec<JurisdictionExposure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_actions: Vec<String>,
}

impl LiabilitySummary {
    pub fn from_estimates(estimates: &[LiabilityEstimate]) -> Self {
        let total = |field: fn(&LiabilityEstimate) -> Option<Decimal>| sum_field(estimates, field);
        let total_low = total(|estimate| estimate.liability_low);
        let total_mid = total(|estimate| estimate.liability_mid);
        let total_high = total(|estimate| estimate.liability_high);
        let total_lookback = total(|estimate| estimate.lookback_liability);
        let total_penalties = total(|estimate| estimate.penalty);
        let total_interest = total(|estimate| estimate.interest);
        let total_with_penalties = total(|estimate| estimate.total_with_penalties);

        let by_risk: Vec<RiskGroup> = RiskLevel::ordered()
            .into_iter()
            .map(|risk| RiskGroup {
                risk,
                risk_label: risk.label(),
                jurisdictions: estimates
                    .iter()
                    .filter(|estimate| estimate.risk == risk)
                    .map(|estimate| estimate.jurisdiction)
                    .collect(),
            })
            .collect();

        let mut ranked: Vec<&LiabilityEstimate> = estimates.iter().collect();
        ranked.sort_by(|a, b| {
            let mid =
                |estimate: &LiabilityEstimate| estimate.liability_mid.unwrap_or(Decimal::ZERO);
            mid(b).cmp(&mid(a)).then(a.jurisdiction.cmp(&b.jurisdiction))
        });
        let top_exposures = ranked
            .into_iter()
            .take(TOP_EXPOSURES)
            .map(|estimate| JurisdictionExposure {
                jurisdiction: estimate.jurisdiction,
                name: estimate.jurisdiction.name(),
                liability_mid: estimate.liability_mid.unwrap_or(Decimal::ZERO),
                risk: estimate.risk,
                risk_label: estimate.risk.label(),
            })
            .collect();

        let mut priority_actions = Vec::new();
        let high_risk = by_risk
            .iter()
            .find(|group| group.risk == RiskLevel::High)
            .map(|group| group.jurisdictions.as_slice())
            .unwrap_or_default();
        if !high_risk.is_empty() {
            let codes: Vec<&str> = high_risk.iter().map(|j| j.code()).collect();
            priority_actions.push(format!(
                "Address {} high-risk jurisdictions immediately ({})",
                high_risk.len(),
                codes.join(", ")
            ));
        }
        if total_penalties > Decimal::ZERO {
            priority_actions.push(format!(
                "Penalties and interest of {} are accruing; consider a Voluntary Disclosure Agreement",
                format_money(total_penalties + total_interest)
            ));
        }
        if total_mid > COMPLIANCE_PLAN_THRESHOLD {
            priority_actions.push(format!(
                "Total estimated liability of {} warrants a prioritized compliance plan",
                format_money(total_mid)
            ));
        }
        if priority_actions.is_empty() && !estimates.is_empty() {
            priority_actions.push(DEFAULT_ACTION.to_string());
        }

        Self {
            jurisdictions: estimates.len(),
            total_low,
            total_mid,
            total_high,
            total_lookback,
            total_penalties,
            total_interest,
            total_with_penalties,
            by_risk,
            top_exposures,
            priority_actions,
        }
    }
}

fn sum_field(
    estimates: &[LiabilityEstimate],
    field: fn(&LiabilityEstimate) -> Option<Decimal>,
) -> Decimal {
    estimates.iter().filter_map(|estimate| field(estimate)).sum()
}

impl AnalysisOutcome {
    pub fn nexus_summary(&self) -> NexusSummary {
        NexusSummary::from_determinations(&self.determinations)
    }

    pub fn liability_summary(&self) -> LiabilitySummary {
        LiabilitySummary::from_estimates(&self.estimates)
    }
}
