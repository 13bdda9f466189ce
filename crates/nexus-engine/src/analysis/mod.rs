//! Nexus determination across all 51 jurisdictions.
//!
//! Each run aggregates the transactions once, then maps every jurisdiction through
//! the physical and economic evaluators, the merger and the liability estimator.
//! Jurisdictions never share mutable state, so the map runs on the rayon pool and is
//! collected back into [`Jurisdiction::ALL`] order.

pub mod aggregate;
mod economic;
mod merge;
mod physical;

pub use economic::{EconomicNexusEvaluator, EconomicSignal};
pub use merge::NexusDecisionMerger;
pub use physical::{PhysicalNexusEvaluator, PhysicalSignal};

use crate::config::EngineConfig;
use crate::domain::{
    AnalysisPeriod, BusinessProfile, ConfidenceLevel, Jurisdiction, LocationType,
    MeasurementPeriod, NexusStatus, Transaction,
};
use crate::error::{DataQualityWarning, NexusError};
use crate::liability::{LiabilityEstimate, LiabilityEstimator};
use crate::reference::ReferenceData;
use aggregate::ActivitySnapshot;
use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NexusDetermination {
    pub jurisdiction: Jurisdiction,
    pub has_sales_tax: bool,
    pub has_physical_nexus: bool,
    pub has_economic_nexus: bool,
    pub nexus_status: NexusStatus,
    pub total_sales: Decimal,
    pub transaction_count: u32,
    pub threshold_pct: Option<Decimal>,
    pub confidence: ConfidenceLevel,
    pub established_date: Option<NaiveDate>,
    pub registration_deadline: Option<NaiveDate>,
    pub measurement_period: Option<MeasurementPeriod>,
    pub sales_threshold: Option<Decimal>,
    pub transaction_threshold: Option<u32>,
    pub days_until_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location_types: Vec<LocationType>,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DataQualityWarning>,
}

impl NexusDetermination {
    pub fn has_nexus(&self) -> bool {
        self.nexus_status == NexusStatus::HasNexus
    }
}

/// Everything a single run consumes besides configuration and reference tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub period: AnalysisPeriod,
    #[serde(default)]
    pub profile: BusinessProfile,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub period: AnalysisPeriod,
    pub as_of: NaiveDate,
    /// One entry per jurisdiction in [`Jurisdiction::ALL`] order.
    pub determinations: Vec<NexusDetermination>,
    /// Jurisdictions with nexus and a sales tax, in the same order.
    pub estimates: Vec<LiabilityEstimate>,
    pub warnings: Vec<DataQualityWarning>,
}

impl AnalysisOutcome {
    pub fn determination(&self, jurisdiction: Jurisdiction) -> &NexusDetermination {
        &self.determinations[jurisdiction.index()]
    }

    pub fn estimate(&self, jurisdiction: Jurisdiction) -> Option<&LiabilityEstimate> {
        self.estimates
            .iter()
            .find(|estimate| estimate.jurisdiction == jurisdiction)
    }

    /// Estimates ordered by descending priority.
    pub fn prioritized_estimates(&self) -> Vec<&LiabilityEstimate> {
        let mut ranked: Vec<&LiabilityEstimate> = self.estimates.iter().collect();
        ranked.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.jurisdiction.cmp(&b.jurisdiction))
        });
        ranked
    }
}

/// Runs nexus determination and liability estimation for one input snapshot.
pub struct NexusAnalyzer {
    config: EngineConfig,
    reference: ReferenceData,
}

impl NexusAnalyzer {
    pub fn new(config: EngineConfig, reference: ReferenceData) -> Self {
        Self { config, reference }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisOutcome, NexusError> {
        self.analyze_with_cancel(input, &AtomicBool::new(false))
    }

    /// Like [`NexusAnalyzer::analyze`], checking `cancel` before each jurisdiction.
    pub fn analyze_with_cancel(
        &self,
        input: &AnalysisInput,
        cancel: &AtomicBool,
    ) -> Result<AnalysisOutcome, NexusError> {
        let period = input.period;
        if !period.is_valid() {
            return Err(NexusError::InvalidPeriod {
                start: period.start,
                end: period.end,
            });
        }

        tracing::info!(
            start = %period.start,
            end = %period.end,
            as_of = %self.config.as_of,
            transactions = input.transactions.len(),
            locations = input.profile.locations.len(),
            "starting nexus analysis"
        );

        let snapshot = aggregate::aggregate(&input.transactions, &period);
        let physical = PhysicalNexusEvaluator::new(&input.profile, &period);
        let economic = EconomicNexusEvaluator::new(&self.reference, &snapshot, &self.config);
        let merger = NexusDecisionMerger::new(&self.reference, &self.config);
        let estimator = LiabilityEstimator::new(&self.reference, &snapshot, &self.config);

        let results: Vec<(NexusDetermination, Option<LiabilityEstimate>)> = Jurisdiction::ALL
            .par_iter()
            .map(|&jurisdiction| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(NexusError::Cancelled);
                }
                let determination = merger.merge(
                    jurisdiction,
                    physical.evaluate(jurisdiction),
                    economic.evaluate(jurisdiction),
                );
                let estimate = estimator.estimate(&determination);
                Ok((determination, estimate))
            })
            .collect::<Result<_, _>>()?;

        let outcome = self.assemble(&snapshot, &physical, results);
        tracing::info!(
            with_nexus = outcome
                .determinations
                .iter()
                .filter(|determination| determination.has_nexus())
                .count(),
            estimates = outcome.estimates.len(),
            warnings = outcome.warnings.len(),
            "nexus analysis complete"
        );
        Ok(outcome)
    }

    fn assemble(
        &self,
        snapshot: &ActivitySnapshot,
        physical: &PhysicalNexusEvaluator<'_>,
        results: Vec<(NexusDetermination, Option<LiabilityEstimate>)>,
    ) -> AnalysisOutcome {
        let mut warnings = snapshot.warnings.clone();
        warnings.extend(physical.profile_warnings());

        let mut determinations = Vec::with_capacity(results.len());
        let mut estimates = Vec::new();
        for (determination, estimate) in results {
            warnings.extend(determination.warnings.iter().cloned());
            if let Some(estimate) = estimate {
                estimates.push(estimate);
            }
            determinations.push(determination);
        }

        AnalysisOutcome {
            period: snapshot.period,
            as_of: self.config.as_of,
            determinations,
            estimates,
            warnings,
        }
    }
}
