use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The 50 states plus the District of Columbia.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    AL,
    AK,
    AZ,
    AR,
    CA,
    CO,
    CT,
    DE,
    DC,
    FL,
    GA,
    HI,
    ID,
    IL,
    IN,
    IA,
    KS,
    KY,
    LA,
    ME,
    MD,
    MA,
    MI,
    MN,
    MS,
    MO,
    MT,
    NE,
    NV,
    NH,
    NJ,
    NM,
    NY,
    NC,
    ND,
    OH,
    OK,
    OR,
    PA,
    RI,
    SC,
    SD,
    TN,
    TX,
    UT,
    VT,
    VA,
    WA,
    WV,
    WI,
    WY,
}

impl Jurisdiction {
    pub const COUNT: usize = 51;

    pub const ALL: [Self; Self::COUNT] = [
        Self::AL,
        Self::AK,
        Self::AZ,
        Self::AR,
        Self::CA,
        Self::CO,
        Self::CT,
        Self::DE,
        Self::DC,
        Self::FL,
        Self::GA,
        Self::HI,
        Self::ID,
        Self::IL,
        Self::IN,
        Self::IA,
        Self::KS,
        Self::KY,
        Self::LA,
        Self::ME,
        Self::MD,
        Self::MA,
        Self::MI,
        Self::MN,
        Self::MS,
        Self::MO,
        Self::MT,
        Self::NE,
        Self::NV,
        Self::NH,
        Self::NJ,
        Self::NM,
        Self::NY,
        Self::NC,
        Self::ND,
        Self::OH,
        Self::OK,
        Self::OR,
        Self::PA,
        Self::RI,
        Self::SC,
        Self::SD,
        Self::TN,
        Self::TX,
        Self::UT,
        Self::VT,
        Self::VA,
        Self::WA,
        Self::WV,
        Self::WI,
        Self::WY,
    ];

    /// Position of the jurisdiction inside [`Jurisdiction::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::AL => "AL",
            Self::AK => "AK",
            Self::AZ => "AZ",
            Self::AR => "AR",
            Self::CA => "CA",
            Self::CO => "CO",
            Self::CT => "CT",
            Self::DE => "DE",
            Self::DC => "DC",
            Self::FL => "FL",
            Self::GA => "GA",
            Self::HI => "HI",
            Self::ID => "ID",
            Self::IL => "IL",
            Self::IN => "IN",
            Self::IA => "IA",
            Self::KS => "KS",
            Self::KY => "KY",
            Self::LA => "LA",
            Self::ME => "ME",
            Self::MD => "MD",
            Self::MA => "MA",
            Self::MI => "MI",
            Self::MN => "MN",
            Self::MS => "MS",
            Self::MO => "MO",
            Self::MT => "MT",
            Self::NE => "NE",
            Self::NV => "NV",
            Self::NH => "NH",
            Self::NJ => "NJ",
            Self::NM => "NM",
            Self::NY => "NY",
            Self::NC => "NC",
            Self::ND => "ND",
            Self::OH => "OH",
            Self::OK => "OK",
            Self::OR => "OR",
            Self::PA => "PA",
            Self::RI => "RI",
            Self::SC => "SC",
            Self::SD => "SD",
            Self::TN => "TN",
            Self::TX => "TX",
            Self::UT => "UT",
            Self::VT => "VT",
            Self::VA => "VA",
            Self::WA => "WA",
            Self::WV => "WV",
            Self::WI => "WI",
            Self::WY => "WY",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::AL => "Alabama",
            Self::AK => "Alaska",
            Self::AZ => "Arizona",
            Self::AR => "Arkansas",
            Self::CA => "California",
            Self::CO => "Colorado",
            Self::CT => "Connecticut",
            Self::DE => "Delaware",
            Self::DC => "District of Columbia",
            Self::FL => "Florida",
            Self::GA => "Georgia",
            Self::HI => "Hawaii",
            Self::ID => "Idaho",
            Self::IL => "Illinois",
            Self::IN => "Indiana",
            Self::IA => "Iowa",
            Self::KS => "Kansas",
            Self::KY => "Kentucky",
            Self::LA => "Louisiana",
            Self::ME => "Maine",
            Self::MD => "Maryland",
            Self::MA => "Massachusetts",
            Self::MI => "Michigan",
            Self::MN => "Minnesota",
            Self::MS => "Mississippi",
            Self::MO => "Missouri",
            Self::MT => "Montana",
            Self::NE => "Nebraska",
            Self::NV => "Nevada",
            Self::NH => "New Hampshire",
            Self::NJ => "New Jersey",
            Self::NM => "New Mexico",
            Self::NY => "New York",
            Self::NC => "North Carolina",
            Self::ND => "North Dakota",
            Self::OH => "Ohio",
            Self::OK => "Oklahoma",
            Self::OR => "Oregon",
            Self::PA => "Pennsylvania",
            Self::RI => "Rhode Island",
            Self::SC => "South Carolina",
            Self::SD => "South Dakota",
            Self::TN => "Tennessee",
            Self::TX => "Texas",
            Self::UT => "Utah",
            Self::VT => "Vermont",
            Self::VA => "Virginia",
            Self::WA => "Washington",
            Self::WV => "West Virginia",
            Self::WI => "Wisconsin",
            Self::WY => "Wyoming",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized jurisdiction code '{0}'")]
pub struct UnknownJurisdiction(pub String);

impl FromStr for Jurisdiction {
    type Err = UnknownJurisdiction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|jurisdiction| jurisdiction.code() == normalized)
            .ok_or_else(|| UnknownJurisdiction(value.to_string()))
    }
}

/// A single sale (or refund, when `amount` is negative) as delivered by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Raw two-letter code; unrecognized codes are dropped during aggregation.
    pub jurisdiction: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_exempt: bool,
    #[serde(default)]
    pub is_marketplace: bool,
}

impl Transaction {
    pub fn new(date: NaiveDate, jurisdiction: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            jurisdiction: jurisdiction.into(),
            amount,
            is_exempt: false,
            is_marketplace: false,
        }
    }

    pub fn exempt(mut self) -> Self {
        self.is_exempt = true;
        self
    }

    pub fn via_marketplace(mut self) -> Self {
        self.is_marketplace = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Office,
    Warehouse,
    RetailStore,
    Manufacturing,
    RemoteEmployee,
    Inventory,
    Other,
}

impl LocationType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Office => "Office",
            Self::Warehouse => "Warehouse",
            Self::RetailStore => "Retail Store",
            Self::Manufacturing => "Manufacturing",
            Self::RemoteEmployee => "Remote Employee",
            Self::Inventory => "Inventory",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalLocation {
    pub jurisdiction: Jurisdiction,
    pub location_type: LocationType,
    pub established_date: NaiveDate,
    #[serde(default)]
    pub closed_date: Option<NaiveDate>,
}

impl PhysicalLocation {
    /// Whether `[established_date, closed_date)` intersects `period`. A closing date on
    /// or before the established date leaves an empty interval.
    pub fn is_active_during(&self, period: &AnalysisPeriod) -> bool {
        let opened_in_time = self.established_date <= period.end;
        let still_open = self
            .closed_date
            .map(|closed| closed > period.start && closed > self.established_date)
            .unwrap_or(true);
        opened_in_time && still_open
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub legal_name: String,
    pub has_physical_presence: bool,
    pub uses_marketplace_facilitators: bool,
    pub has_exempt_sales: bool,
    pub sells_tangible_goods: bool,
    pub sells_digital_goods: bool,
    pub sells_services: bool,
    pub locations: Vec<PhysicalLocation>,
}

/// Inclusive date range under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Which volume test a jurisdiction applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NexusType {
    Sales,
    Transactions,
    Either,
    Both,
}

impl NexusType {
    pub const fn uses_sales(self) -> bool {
        !matches!(self, Self::Transactions)
    }

    pub const fn uses_transactions(self) -> bool {
        !matches!(self, Self::Sales)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sales => "Sales only",
            Self::Transactions => "Transactions only",
            Self::Either => "Sales or transactions",
            Self::Both => "Sales and transactions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementPeriod {
    CalendarYear,
    #[serde(rename = "rolling_12mo")]
    Rolling12Months,
    PreviousCalendarYear,
}

impl MeasurementPeriod {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::CalendarYear,
            Self::Rolling12Months,
            Self::PreviousCalendarYear,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CalendarYear => "Current calendar year",
            Self::Rolling12Months => "Rolling 12 months",
            Self::PreviousCalendarYear => "Previous calendar year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NexusStatus {
    HasNexus,
    CloseToThreshold,
    NoNexus,
}

impl NexusStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::HasNexus, Self::CloseToThreshold, Self::NoNexus]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HasNexus => "Has Nexus",
            Self::CloseToThreshold => "Close to Threshold",
            Self::NoNexus => "No Nexus",
        }
    }
}

/// Ordered so that `High` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Ordered so that `High` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}
