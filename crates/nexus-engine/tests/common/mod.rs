#![allow(dead_code)]

use chrono::NaiveDate;
use nexus_engine::{
    AnalysisInput, AnalysisOutcome, AnalysisPeriod, BusinessProfile, EngineConfig, Jurisdiction,
    LocationType, NexusAnalyzer, PhysicalLocation, ReferenceData, ReferenceTables, Transaction,
};
use rust_decimal::Decimal;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

pub fn period_2024() -> AnalysisPeriod {
    AnalysisPeriod::new(date(2024, 1, 1), date(2024, 12, 31))
}

pub fn config_as_of(today: NaiveDate) -> EngineConfig {
    EngineConfig::default().as_of(today)
}

pub fn standard_analyzer(today: NaiveDate) -> NexusAnalyzer {
    NexusAnalyzer::new(
        config_as_of(today),
        ReferenceData::standard().expect("bundled reference tables validate"),
    )
}

pub fn analyzer_with(tables: ReferenceTables, today: NaiveDate) -> NexusAnalyzer {
    NexusAnalyzer::new(
        config_as_of(today),
        ReferenceData::from_tables(tables).expect("reference tables validate"),
    )
}

pub fn input(transactions: Vec<Transaction>, profile: BusinessProfile) -> AnalysisInput {
    AnalysisInput {
        period: period_2024(),
        profile,
        transactions,
    }
}

pub fn remote_seller() -> BusinessProfile {
    BusinessProfile {
        legal_name: "Remote Seller Inc".to_string(),
        sells_tangible_goods: true,
        ..BusinessProfile::default()
    }
}

pub fn warehouse_in(jurisdiction: Jurisdiction, established: NaiveDate) -> BusinessProfile {
    BusinessProfile {
        legal_name: "Fulfillment Co".to_string(),
        has_physical_presence: true,
        sells_tangible_goods: true,
        locations: vec![PhysicalLocation {
            jurisdiction,
            location_type: LocationType::Warehouse,
            established_date: established,
            closed_date: None,
        }],
        ..BusinessProfile::default()
    }
}

/// Sales on the first of each month, `months` months long, starting in `start_month`.
pub fn monthly_sales(
    code: &str,
    year: i32,
    start_month: u32,
    months: u32,
    amount: Decimal,
) -> Vec<Transaction> {
    (start_month..start_month + months)
        .map(|month| Transaction::new(date(year, month, 1), code, amount))
        .collect()
}

/// A mixed multi-state book used by the idempotence and ordering checks.
pub fn mixed_book() -> Vec<Transaction> {
    let mut transactions = Vec::new();
    transactions.extend(monthly_sales("CA", 2023, 1, 12, Decimal::from(45_000)));
    transactions.extend(monthly_sales("TX", 2024, 1, 12, Decimal::from(35_000)));
    transactions.extend(monthly_sales("WA", 2024, 1, 12, Decimal::from(9_000)));
    transactions.extend(
        monthly_sales("WA", 2024, 1, 6, Decimal::from(4_000))
            .into_iter()
            .map(Transaction::via_marketplace),
    );
    transactions.extend(
        monthly_sales("NY", 2024, 1, 12, Decimal::from(1_000))
            .into_iter()
            .map(Transaction::exempt),
    );
    transactions.push(Transaction::new(date(2024, 3, 3), "CA", Decimal::from(-1_200)));
    transactions.push(Transaction::new(date(2024, 3, 3), "XX", Decimal::from(10)));
    transactions
}

pub fn run(analyzer: &NexusAnalyzer, input: &AnalysisInput) -> AnalysisOutcome {
    analyzer.analyze(input).expect("analysis completes")
}
