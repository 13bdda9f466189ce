pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod liability;
pub mod reference;
pub mod report;

pub use analysis::{AnalysisInput, AnalysisOutcome, NexusAnalyzer, NexusDetermination};
pub use config::{AppConfig, AppEnvironment, ConfigError, EngineConfig, TelemetryConfig};
pub use domain::{
    AnalysisPeriod, BusinessProfile, ConfidenceLevel, Jurisdiction, LocationType,
    MeasurementPeriod, NexusStatus, NexusType, PhysicalLocation, RiskLevel, Transaction,
};
pub use error::{DataQualityWarning, NexusError, WarningKind};
pub use liability::{LiabilityEstimate, PriorityKey};
pub use reference::{ReferenceData, ReferenceTables};
pub use report::{LiabilitySummary, NexusSummary};
