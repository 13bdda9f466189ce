use super::economic::EconomicSignal;
use super::physical::PhysicalSignal;
use super::NexusDetermination;
use crate::config::EngineConfig;
use crate::domain::{ConfidenceLevel, Jurisdiction, NexusStatus};
use crate::reference::ReferenceData;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

/// Folds the physical and economic signals into one determination.
pub struct NexusDecisionMerger<'a> {
    reference: &'a ReferenceData,
    config: &'a EngineConfig,
}

impl<'a> NexusDecisionMerger<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a EngineConfig) -> Self {
        Self { reference, config }
    }

    pub fn merge(
        &self,
        jurisdiction: Jurisdiction,
        physical: PhysicalSignal,
        economic: EconomicSignal,
    ) -> NexusDetermination {
        let has_sales_tax = self.reference.has_sales_tax(jurisdiction);
        let has_nexus = physical.has_physical_nexus || economic.has_economic_nexus;

        let nexus_status = if has_nexus {
            NexusStatus::HasNexus
        } else {
            economic.status
        };
        let confidence = if self.reference.tax_config(jurisdiction).is_none() {
            ConfidenceLevel::Low
        } else if physical.has_physical_nexus {
            physical.confidence.max(economic.confidence)
        } else {
            economic.confidence
        };

        let established_date = match (physical.established_date, economic.established_date) {
            (Some(physical), Some(economic)) => Some(physical.min(economic)),
            (date, None) | (None, date) => date,
        };
        let registration_deadline = if established_date == economic.established_date {
            economic.registration_deadline
        } else {
            established_date.and_then(|date| self.deadline_from(jurisdiction, date))
        };

        let mut notes = Vec::new();
        if physical.has_physical_nexus {
            let kinds: Vec<&str> = physical
                .location_types
                .iter()
                .map(|kind| kind.label())
                .collect();
            notes.push(format!("Physical presence: {}", kinds.join(", ")));
        }
        notes.extend(economic.notes);

        let recommendation = self.recommendation(
            jurisdiction,
            has_sales_tax,
            nexus_status,
            registration_deadline,
            economic.threshold_pct,
            economic.days_until_threshold,
        );

        NexusDetermination {
            jurisdiction,
            has_sales_tax,
            has_physical_nexus: physical.has_physical_nexus,
            has_economic_nexus: economic.has_economic_nexus,
            nexus_status,
            total_sales: economic.total_sales,
            transaction_count: economic.transaction_count,
            threshold_pct: economic.threshold_pct,
            confidence,
            established_date,
            registration_deadline,
            measurement_period: economic.measurement_period,
            sales_threshold: economic.sales_threshold,
            transaction_threshold: economic.transaction_threshold,
            days_until_threshold: economic.days_until_threshold,
            location_types: physical.location_types,
            recommendation,
            notes,
            warnings: economic.warnings,
        }
    }

    fn deadline_from(
        &self,
        jurisdiction: Jurisdiction,
        established: NaiveDate,
    ) -> Option<NaiveDate> {
        self.reference
            .registration_grace_days(jurisdiction)
            .and_then(|days| established.checked_add_days(Days::new(u64::from(days))))
    }

    fn recommendation(
        &self,
        jurisdiction: Jurisdiction,
        has_sales_tax: bool,
        status: NexusStatus,
        deadline: Option<NaiveDate>,
        threshold_pct: Option<Decimal>,
        days_until_threshold: Option<u32>,
    ) -> String {
        let name = jurisdiction.name();
        if !has_sales_tax {
            return format!("{name} imposes no sales tax; no registration required.");
        }

        match status {
            NexusStatus::HasNexus => match deadline {
                Some(deadline) if deadline < self.config.as_of => format!(
                    "Register in {name} immediately; the registration deadline of {deadline} has passed."
                ),
                Some(deadline) => format!("Register in {name} by {deadline}."),
                None => format!(
                    "Register in {name}; confirm the registration deadline with the state."
                ),
            },
            NexusStatus::CloseToThreshold => {
                let pct = threshold_pct.map(|pct| pct.to_string()).unwrap_or_default();
                match days_until_threshold {
                    Some(days) => format!(
                        "Monitor {name} sales: {pct}% of threshold, about {days} days from crossing at the current pace."
                    ),
                    None => format!("Monitor {name} sales: {pct}% of threshold."),
                }
            }
            NexusStatus::NoNexus => format!("No action required in {name}."),
        }
    }
}
