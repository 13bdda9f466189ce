use crate::domain::RiskLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NexusSignal {
    Physical,
    Economic,
    Both,
}

impl NexusSignal {
    pub fn from_flags(physical: bool, economic: bool) -> Option<Self> {
        match (physical, economic) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Physical),
            (false, true) => Some(Self::Economic),
            (false, false) => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Economic => "Economic",
            Self::Both => "Physical and economic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Overdue,
    Pending { deadline: NaiveDate },
    Unknown,
}

impl RegistrationState {
    pub fn resolve(deadline: Option<NaiveDate>, as_of: NaiveDate) -> Self {
        match deadline {
            Some(deadline) if as_of > deadline => Self::Overdue,
            Some(deadline) => Self::Pending { deadline },
            None => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Pending { .. } => "Pending",
            Self::Unknown => "Unknown",
        }
    }
}

pub fn liability_recommendation(
    signal: Option<NexusSignal>,
    risk: RiskLevel,
    registration: RegistrationState,
    penalties_accruing: bool,
) -> String {
    let mut sentences: Vec<String> = Vec::new();

    match risk {
        RiskLevel::High => {
            sentences.push("HIGH RISK: consult a sales tax professional immediately.".to_string());
            if penalties_accruing {
                sentences.push(
                    "Penalties are accruing; consider a Voluntary Disclosure Agreement (VDA)."
                        .to_string(),
                );
            }
        }
        RiskLevel::Medium => sentences.push(
            "MEDIUM RISK: review with a tax advisor and consider filing options.".to_string(),
        ),
        RiskLevel::Low => {}
    }

    match registration {
        RegistrationState::Overdue => {
            sentences.push("Registration is overdue; register and file back returns.".to_string())
        }
        RegistrationState::Pending { deadline } => {
            sentences.push(format!("Register before {deadline} to avoid penalties."))
        }
        RegistrationState::Unknown => {
            sentences.push("Confirm the registration deadline with the state.".to_string())
        }
    }

    match signal {
        Some(NexusSignal::Physical) | Some(NexusSignal::Both) => {
            sentences.push("Physical presence creates a strong nexus obligation.".to_string())
        }
        Some(NexusSignal::Economic) => {
            sentences.push("Economic nexus was triggered by sales volume.".to_string())
        }
        None => {}
    }

    if risk == RiskLevel::Low {
        sentences.push("Register and begin collecting sales tax prospectively.".to_string());
    }

    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn overdue_high_risk_suggests_voluntary_disclosure() {
        let text = liability_recommendation(
            Some(NexusSignal::Economic),
            RiskLevel::High,
            RegistrationState::Overdue,
            true,
        );
        assert!(text.starts_with("HIGH RISK"));
        assert!(text.contains("Voluntary Disclosure Agreement"));
        assert!(text.contains("sales volume"));
    }

    #[test]
    fn pending_low_risk_names_the_deadline() {
        let registration = RegistrationState::resolve(Some(date(2025, 2, 1)), date(2025, 1, 10));
        let text = liability_recommendation(
            Some(NexusSignal::Physical),
            RiskLevel::Low,
            registration,
            false,
        );
        assert!(text.contains("Register before 2025-02-01"));
        assert!(text.ends_with("prospectively."));
    }

    #[test]
    fn registration_state_is_resolved_against_as_of() {
        let deadline = date(2025, 2, 1);
        assert_eq!(
            RegistrationState::resolve(Some(deadline), date(2025, 2, 1)),
            RegistrationState::Pending { deadline }
        );
        assert_eq!(
            RegistrationState::resolve(Some(deadline), date(2025, 2, 2)),
            RegistrationState::Overdue
        );
        assert_eq!(RegistrationState::resolve(None, deadline), RegistrationState::Unknown);
    }
}
