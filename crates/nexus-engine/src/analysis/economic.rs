use super::aggregate::{ActivitySnapshot, JurisdictionActivity, LedgerEntry, MeasurementWindow};
use crate::config::EngineConfig;
use crate::domain::{ConfidenceLevel, Jurisdiction, MeasurementPeriod, NexusStatus, NexusType};
use crate::error::{DataQualityWarning, WarningKind};
use crate::reference::{JurisdictionNexusRule, ReferenceData};
use crate::report::format_money;
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const VELOCITY_SAMPLE: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicSignal {
    /// False when no threshold test ran (no sales tax, or no rule on file).
    pub evaluated: bool,
    pub has_economic_nexus: bool,
    pub status: NexusStatus,
    pub threshold_pct: Option<Decimal>,
    pub confidence: ConfidenceLevel,
    pub established_date: Option<NaiveDate>,
    pub registration_deadline: Option<NaiveDate>,
    pub measurement_period: Option<MeasurementPeriod>,
    pub sales_threshold: Option<Decimal>,
    pub transaction_threshold: Option<u32>,
    /// Gross figures of the measurement window, for display.
    pub total_sales: Decimal,
    pub transaction_count: u32,
    pub days_until_threshold: Option<u32>,
    pub notes: Vec<String>,
    pub warnings: Vec<DataQualityWarning>,
}

impl EconomicSignal {
    fn not_evaluated(activity: &JurisdictionActivity, confidence: ConfidenceLevel) -> Self {
        Self {
            evaluated: false,
            has_economic_nexus: false,
            status: NexusStatus::NoNexus,
            threshold_pct: None,
            confidence,
            established_date: None,
            registration_deadline: None,
            measurement_period: None,
            sales_threshold: None,
            transaction_threshold: None,
            total_sales: activity.analysis_period.gross_sales,
            transaction_count: activity.analysis_period.transaction_count,
            days_until_threshold: None,
            notes: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Sales and transaction figures after marketplace exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Compared {
    sales: Decimal,
    transactions: u32,
}

impl Compared {
    fn include(rule: &JurisdictionNexusRule, entry: &LedgerEntry) -> bool {
        !(rule.marketplace_facilitator_law && entry.is_marketplace)
    }
}

/// Outcome of each threshold test; `None` when the rule lacks that threshold.
#[derive(Debug, Clone, Copy)]
struct ThresholdTest {
    sales_met: Option<bool>,
    transactions_met: Option<bool>,
}

impl ThresholdTest {
    fn run(rule: &JurisdictionNexusRule, compared: Compared) -> Self {
        let sales_met = rule
            .sales_threshold
            .filter(|_| rule.nexus_type.uses_sales())
            .map(|threshold| compared.sales >= threshold);
        let transactions_met = rule
            .transaction_threshold
            .filter(|_| rule.nexus_type.uses_transactions())
            .map(|threshold| compared.transactions >= threshold);
        Self {
            sales_met,
            transactions_met,
        }
    }

    fn met(&self, nexus_type: NexusType) -> bool {
        let sales = self.sales_met == Some(true);
        let transactions = self.transactions_met == Some(true);
        match nexus_type {
            NexusType::Sales => sales,
            NexusType::Transactions => transactions,
            NexusType::Either => sales || transactions,
            NexusType::Both => sales && transactions,
        }
    }
}

pub struct EconomicNexusEvaluator<'a> {
    reference: &'a ReferenceData,
    snapshot: &'a ActivitySnapshot,
    config: &'a EngineConfig,
}

impl<'a> EconomicNexusEvaluator<'a> {
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

    pub fn evaluate(&self, jurisdiction: Jurisdiction) -> EconomicSignal {
        let activity = self.snapshot.activity(jurisdiction);

        let tax_config = self.reference.tax_config(jurisdiction);
        if tax_config.is_some_and(|config| !config.has_sales_tax) {
            let mut signal = EconomicSignal::not_evaluated(activity, ConfidenceLevel::High);
            signal
                .notes
                .push(format!("{} does not impose a sales tax", jurisdiction.name()));
            return signal;
        }

        let mut warnings = Vec::new();
        if tax_config.is_none() {
            warnings.push(DataQualityWarning::for_jurisdiction(
                jurisdiction,
                WarningKind::MissingTaxConfig,
                "no tax rate configuration on file; sales tax assumed, liability not estimated",
            ));
        }

        let Some(rule) = self.reference.rule(jurisdiction) else {
            let mut signal = EconomicSignal::not_evaluated(activity, ConfidenceLevel::Low);
            warnings.push(DataQualityWarning::for_jurisdiction(
                jurisdiction,
                WarningKind::MissingNexusRule,
                "no economic nexus rule on file; economic evaluation skipped",
            ));
            signal.warnings = warnings;
            return signal;
        };

        let mut config_complete = tax_config.is_some();
        if !rule.is_complete() {
            config_complete = false;
            warnings.push(DataQualityWarning::for_jurisdiction(
                jurisdiction,
                WarningKind::IncompleteRule,
                format!(
                    "rule type '{}' is missing a threshold it requires",
                    rule.nexus_type.label()
                ),
            ));
        }

        let window = self.snapshot.window(rule.measurement_period);
        let totals = activity.window(rule.measurement_period);
        let compared = if rule.marketplace_facilitator_law {
            Compared {
                sales: totals.sales_excluding_marketplace(),
                transactions: totals.transactions_excluding_marketplace(),
            }
        } else {
            Compared {
                sales: totals.gross_sales,
                transactions: totals.transaction_count,
            }
        };

        let mut notes = Vec::new();
        let in_effect = rule.effective_date <= window.end;
        if !in_effect {
            notes.push(format!(
                "Economic nexus rule takes effect {}, after the measurement window",
                rule.effective_date
            ));
        }

        let test = ThresholdTest::run(rule, compared);
        let has_economic_nexus = in_effect && test.met(rule.nexus_type);
        let threshold_pct = threshold_pct(rule, compared);

        let status = if has_economic_nexus {
            NexusStatus::HasNexus
        } else if threshold_pct
            .map(|pct| pct >= self.config.close_to_threshold_pct)
            .unwrap_or(false)
        {
            NexusStatus::CloseToThreshold
        } else {
            NexusStatus::NoNexus
        };

        let confidence = if !config_complete {
            ConfidenceLevel::Low
        } else if !self.snapshot.covers(&window) {
            warnings.push(DataQualityWarning::for_jurisdiction(
                jurisdiction,
                WarningKind::PartialPeriodCoverage,
                format!(
                    "data starts {} but the {} window starts {}",
                    self.snapshot.coverage_start,
                    rule.measurement_period.label().to_lowercase(),
                    window.start
                ),
            ));
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::High
        };

        if rule.marketplace_facilitator_law && totals.marketplace_sales != Decimal::ZERO {
            notes.push(format!(
                "Excluded {} in marketplace facilitator sales",
                format_money(totals.marketplace_sales)
            ));
        }
        if has_economic_nexus {
            notes.push(met_reason(rule, compared, &test));
        }

        let established_date = if has_economic_nexus {
            crossing_date(activity, rule, &window)
        } else {
            None
        };
        if let Some(date) = established_date {
            tracing::debug!(
                jurisdiction = jurisdiction.code(),
                %date,
                "economic threshold crossed"
            );
        }
        let registration_deadline = established_date.and_then(|date| {
            self.reference
                .registration_grace_days(jurisdiction)
                .and_then(|days| date.checked_add_days(Days::new(u64::from(days))))
        });

        let days_until_threshold = if status == NexusStatus::CloseToThreshold {
            estimate_days_until_threshold(activity, rule, &window, compared)
        } else {
            None
        };

        EconomicSignal {
            evaluated: true,
            has_economic_nexus,
            status,
            threshold_pct,
            confidence,
            established_date,
            registration_deadline,
            measurement_period: Some(rule.measurement_period),
            sales_threshold: rule.sales_threshold,
            transaction_threshold: rule.transaction_threshold,
            total_sales: totals.gross_sales,
            transaction_count: totals.transaction_count,
            days_until_threshold,
            notes,
            warnings,
        }
    }
}

fn threshold_pct(rule: &JurisdictionNexusRule, compared: Compared) -> Option<Decimal> {
    let hundred = Decimal::ONE_HUNDRED;
    let sales_pct = rule
        .sales_threshold
        .filter(|_| rule.nexus_type.uses_sales())
        .and_then(|threshold| compared.sales.checked_div(threshold))
        .map(|ratio| ratio * hundred);
    let transactions_pct = rule
        .transaction_threshold
        .filter(|_| rule.nexus_type.uses_transactions())
        .and_then(|threshold| {
            Decimal::from(compared.transactions).checked_div(Decimal::from(threshold))
        })
        .map(|ratio| ratio * hundred);

    let pct = match (sales_pct, transactions_pct) {
        (Some(sales), Some(transactions)) => Some(sales.max(transactions)),
        (Some(pct), None) | (None, Some(pct)) => Some(pct),
        (None, None) => None,
    };
    pct.map(|pct| pct.max(Decimal::ZERO).round_dp(2))
}

fn met_reason(rule: &JurisdictionNexusRule, compared: Compared, test: &ThresholdTest) -> String {
    let mut reasons = Vec::new();
    if let (Some(true), Some(threshold)) = (test.sales_met, rule.sales_threshold) {
        reasons.push(format!(
            "Sales {} >= {}",
            format_money(compared.sales),
            format_money(threshold)
        ));
    }
    if let (Some(true), Some(threshold)) = (test.transactions_met, rule.transaction_threshold) {
        reasons.push(format!(
            "{} transactions >= {}",
            compared.transactions, threshold
        ));
    }
    let joiner = if rule.nexus_type == NexusType::Both {
        " AND "
    } else {
        "; "
    };
    reasons.join(joiner)
}

/// Chronological fold over the window: the date of the entry at which the running
/// totals first satisfy the rule, no earlier than the rule's effective date.
fn crossing_date(
    activity: &JurisdictionActivity,
    rule: &JurisdictionNexusRule,
    window: &MeasurementWindow,
) -> Option<NaiveDate> {
    let mut running = Compared {
        sales: Decimal::ZERO,
        transactions: 0,
    };

    activity
        .entries_between(window.start, window.end)
        .filter(|entry| Compared::include(rule, entry))
        .find_map(|entry| {
            running.sales += entry.amount;
            running.transactions += 1;
            ThresholdTest::run(rule, running)
                .met(rule.nexus_type)
                .then(|| entry.date.max(rule.effective_date))
        })
}

fn estimate_days_until_threshold(
    activity: &JurisdictionActivity,
    rule: &JurisdictionNexusRule,
    window: &MeasurementWindow,
    compared: Compared,
) -> Option<u32> {
    let threshold = rule
        .sales_threshold
        .filter(|_| rule.nexus_type.uses_sales())?;

    let entries: Vec<&LedgerEntry> = activity
        .entries_between(window.start, window.end)
        .filter(|entry| Compared::include(rule, entry))
        .collect();
    let recent = &entries[entries.len().saturating_sub(VELOCITY_SAMPLE)..];
    let (first, last) = (recent.first()?, recent.last()?);
    if recent.len() < 2 {
        return None;
    }

    let span_days = (last.date - first.date).num_days();
    if span_days <= 0 {
        return None;
    }

    let recent_sales: Decimal = recent.iter().map(|entry| entry.amount).sum();
    let daily_rate = recent_sales / Decimal::from(span_days);
    if daily_rate <= Decimal::ZERO {
        return None;
    }

    let remaining = (threshold - compared.sales).max(Decimal::ZERO);
    (remaining / daily_rate).floor().to_u32()
}
