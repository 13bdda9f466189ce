//! Immutable per-invocation lookup over the jurisdiction reference tables.
//!
//! Tables are validated once when the lookup is built. Structural problems (an empty
//! table, duplicate rows, impossible rates or thresholds) fail the whole run; a single
//! jurisdiction missing from a table is left for the evaluators to report as a warning.

mod seed;

use crate::domain::{Jurisdiction, MeasurementPeriod, NexusType};
use crate::error::NexusError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Economic nexus threshold rule for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionNexusRule {
    pub jurisdiction: Jurisdiction,
    pub nexus_type: NexusType,
    #[serde(default)]
    pub sales_threshold: Option<Decimal>,
    #[serde(default)]
    pub transaction_threshold: Option<u32>,
    pub measurement_period: MeasurementPeriod,
    pub marketplace_facilitator_law: bool,
    pub effective_date: NaiveDate,
}

impl JurisdictionNexusRule {
    /// A rule is complete when every threshold its nexus type tests is present.
    pub fn is_complete(&self) -> bool {
        let sales_ok = !self.nexus_type.uses_sales() || self.sales_threshold.is_some();
        let transactions_ok =
            !self.nexus_type.uses_transactions() || self.transaction_threshold.is_some();
        sales_ok && transactions_ok
    }
}

/// Rates are fractions (`0.0625` is 6.25%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionTaxConfig {
    pub jurisdiction: Jurisdiction,
    pub state_rate: Decimal,
    pub avg_local_rate: Decimal,
    pub has_sales_tax: bool,
}

/// Registration grace and retroactive assessment windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionPolicy {
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub registration_grace_days: Option<u32>,
    #[serde(default)]
    pub lookback_months: Option<u32>,
}

/// Raw tables as supplied by the reference-data store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    pub rules: Vec<JurisdictionNexusRule>,
    pub tax_configs: Vec<JurisdictionTaxConfig>,
    pub policies: Vec<JurisdictionPolicy>,
}

#[derive(Debug, Clone)]
pub struct ReferenceData {
    rules: Vec<Option<JurisdictionNexusRule>>,
    tax_configs: Vec<Option<JurisdictionTaxConfig>>,
    policies: Vec<Option<JurisdictionPolicy>>,
}

impl ReferenceData {
    pub fn from_tables(tables: ReferenceTables) -> Result<Self, NexusError> {
        if tables.rules.is_empty() {
            return Err(NexusError::configuration("nexus rule", "is empty"));
        }
        if tables.tax_configs.is_empty() {
            return Err(NexusError::configuration("tax config", "is empty"));
        }

        for rule in &tables.rules {
            validate_rule(rule)?;
        }
        for config in &tables.tax_configs {
            validate_tax_config(config)?;
        }
        if tables.rules.iter().all(|rule| !rule.is_complete()) {
            return Err(NexusError::configuration(
                "nexus rule",
                "has no rule with the thresholds its nexus type requires",
            ));
        }

        Ok(Self {
            rules: index_rows("nexus rule", tables.rules, |rule| rule.jurisdiction)?,
            tax_configs: index_rows("tax config", tables.tax_configs, |config| {
                config.jurisdiction
            })?,
            policies: index_rows("policy", tables.policies, |policy| policy.jurisdiction)?,
        })
    }

    /// The bundled 51-jurisdiction tables.
    pub fn standard() -> Result<Self, NexusError> {
        Self::from_tables(Self::standard_tables())
    }

    pub fn standard_tables() -> ReferenceTables {
        ReferenceTables {
            rules: seed::nexus_rules(),
            tax_configs: seed::tax_configs(),
            policies: seed::policies(),
        }
    }

    pub fn rule(&self, jurisdiction: Jurisdiction) -> Option<&JurisdictionNexusRule> {
        self.rules[jurisdiction.index()].as_ref()
    }

    pub fn tax_config(&self, jurisdiction: Jurisdiction) -> Option<&JurisdictionTaxConfig> {
        self.tax_configs[jurisdiction.index()].as_ref()
    }

    pub fn policy(&self, jurisdiction: Jurisdiction) -> Option<&JurisdictionPolicy> {
        self.policies[jurisdiction.index()].as_ref()
    }

    pub fn registration_grace_days(&self, jurisdiction: Jurisdiction) -> Option<u32> {
        self.policy(jurisdiction)
            .and_then(|policy| policy.registration_grace_days)
    }

    pub fn lookback_months(&self, jurisdiction: Jurisdiction) -> Option<u32> {
        self.policy(jurisdiction)
            .and_then(|policy| policy.lookback_months)
    }

    /// Sales tax applicability. A jurisdiction without a tax config is assumed to tax
    /// sales; the missing config is reported as a data quality warning by the caller.
    pub fn has_sales_tax(&self, jurisdiction: Jurisdiction) -> bool {
        self.tax_config(jurisdiction)
            .map_or(true, |config| config.has_sales_tax)
    }
}

fn index_rows<T>(
    table: &'static str,
    rows: Vec<T>,
    key: impl Fn(&T) -> Jurisdiction,
) -> Result<Vec<Option<T>>, NexusError> {
    let mut slots: Vec<Option<T>> = Jurisdiction::ALL.iter().map(|_| None).collect();
    for row in rows {
        let jurisdiction = key(&row);
        let slot = &mut slots[jurisdiction.index()];
        if slot.is_some() {
            return Err(NexusError::configuration(
                table,
                format!("has duplicate rows for {jurisdiction}"),
            ));
        }
        *slot = Some(row);
    }
    Ok(slots)
}

fn validate_rule(rule: &JurisdictionNexusRule) -> Result<(), NexusError> {
    if rule
        .sales_threshold
        .map(|threshold| threshold <= Decimal::ZERO)
        .unwrap_or(false)
    {
        return Err(NexusError::configuration(
            "nexus rule",
            format!("has a non-positive sales threshold for {}", rule.jurisdiction),
        ));
    }
    if rule.transaction_threshold == Some(0) {
        return Err(NexusError::configuration(
            "nexus rule",
            format!("has a zero transaction threshold for {}", rule.jurisdiction),
        ));
    }
    Ok(())
}

fn validate_tax_config(config: &JurisdictionTaxConfig) -> Result<(), NexusError> {
    let in_range = |rate: Decimal| rate >= Decimal::ZERO && rate < Decimal::ONE;
    if !in_range(config.state_rate) || !in_range(config.avg_local_rate) {
        return Err(NexusError::configuration(
            "tax config",
            format!(
                "has rates outside [0, 1) for {} (state {}, local {})",
                config.jurisdiction, config.state_rate, config.avg_local_rate
            ),
        ));
    }
    Ok(())
}
