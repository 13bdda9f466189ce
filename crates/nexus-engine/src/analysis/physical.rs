use crate::domain::{AnalysisPeriod, BusinessProfile, ConfidenceLevel, Jurisdiction, LocationType};
use crate::error::{DataQualityWarning, WarningKind};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalSignal {
    pub has_physical_nexus: bool,
    pub confidence: ConfidenceLevel,
    pub established_date: Option<NaiveDate>,
    pub location_types: Vec<LocationType>,
}

/// Physical presence is decided by location history alone.
pub struct PhysicalNexusEvaluator<'a> {
    profile: &'a BusinessProfile,
    period: &'a AnalysisPeriod,
}

impl<'a> PhysicalNexusEvaluator<'a> {
    pub fn new(profile: &'a BusinessProfile, period: &'a AnalysisPeriod) -> Self {
        Self { profile, period }
    }

    pub fn evaluate(&self, jurisdiction: Jurisdiction) -> PhysicalSignal {
        let mut established_date: Option<NaiveDate> = None;
        let mut location_types = Vec::new();

        for location in self
            .profile
            .locations
            .iter()
            .filter(|location| location.jurisdiction == jurisdiction)
            .filter(|location| location.is_active_during(self.period))
        {
            let start = location.established_date.max(self.period.start);
            established_date = Some(established_date.map_or(start, |current| current.min(start)));
            if !location_types.contains(&location.location_type) {
                location_types.push(location.location_type);
            }
        }

        PhysicalSignal {
            has_physical_nexus: established_date.is_some(),
            confidence: ConfidenceLevel::High,
            established_date,
            location_types,
        }
    }

    /// Flags profile flags that contradict the location list.
    pub fn profile_warnings(&self) -> Vec<DataQualityWarning> {
        let mut warnings = Vec::new();
        if !self.profile.has_physical_presence && !self.profile.locations.is_empty() {
            warnings.push(DataQualityWarning::new(
                None,
                WarningKind::ProfileInconsistency,
                format!(
                    "profile reports no physical presence but lists {} location(s); locations were evaluated",
                    self.profile.locations.len()
                ),
            ));
        }
        for location in &self.profile.locations {
            if location
                .closed_date
                .map(|closed| closed <= location.established_date)
                .unwrap_or(false)
            {
                warnings.push(DataQualityWarning::for_jurisdiction(
                    location.jurisdiction,
                    WarningKind::ProfileInconsistency,
                    format!(
                        "{} location closes on or before its established date; it was ignored",
                        location.location_type.label()
                    ),
                ));
            }
        }
        warnings
    }
}
