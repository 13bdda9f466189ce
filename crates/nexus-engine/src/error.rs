use crate::domain::Jurisdiction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Failures that abort an entire analysis run.
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    #[error("reference data unusable: {table} table {issue}")]
    Configuration { table: &'static str, issue: String },
    #[error("analysis period ends ({end}) before it starts ({start})")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("analysis cancelled before all jurisdictions were evaluated")]
    Cancelled,
}

impl NexusError {
    pub(crate) fn configuration(table: &'static str, issue: impl Into<String>) -> Self {
        Self::Configuration {
            table,
            issue: issue.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingTaxConfig,
    MissingNexusRule,
    IncompleteRule,
    PartialPeriodCoverage,
    UnknownJurisdiction,
    ProfileInconsistency,
}

impl WarningKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingTaxConfig => "Missing tax config",
            Self::MissingNexusRule => "Missing nexus rule",
            Self::IncompleteRule => "Incomplete nexus rule",
            Self::PartialPeriodCoverage => "Partial period coverage",
            Self::UnknownJurisdiction => "Unknown jurisdiction",
            Self::ProfileInconsistency => "Profile inconsistency",
        }
    }
}

/// Non-fatal issue attached to the affected jurisdiction's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,
    pub kind: WarningKind,
    pub detail: String,
}

impl DataQualityWarning {
    pub fn new(
        jurisdiction: Option<Jurisdiction>,
        kind: WarningKind,
        detail: impl Into<String>,
    ) -> Self {
        let warning = Self {
            jurisdiction,
            kind,
            detail: detail.into(),
        };
        tracing::warn!(
            jurisdiction = warning.jurisdiction.map(Jurisdiction::code),
            kind = warning.kind.label(),
            "{}",
            warning.detail
        );
        warning
    }

    pub fn for_jurisdiction(
        jurisdiction: Jurisdiction,
        kind: WarningKind,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(Some(jurisdiction), kind, detail)
    }
}
