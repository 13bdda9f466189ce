use chrono::{Days, NaiveDate};
use nexus_engine::{
    AnalysisInput, AnalysisPeriod, BusinessProfile, Jurisdiction, LocationType, PhysicalLocation,
    Transaction,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// One sale on the 15th of every month of `year`.
fn monthly(code: &str, year: i32, amount: Decimal) -> impl Iterator<Item = Transaction> + '_ {
    (1..=12).map(move |month| Transaction::new(date(year, month, 15), code, amount))
}

/// A mid-sized online seller with a Nevada warehouse, a Portland office and sales
/// spread across several states in 2023 and 2024.
pub fn sample_input() -> AnalysisInput {
    let profile = BusinessProfile {
        legal_name: "Demo Outfitters LLC".to_string(),
        has_physical_presence: true,
        uses_marketplace_facilitators: true,
        has_exempt_sales: true,
        sells_tangible_goods: true,
        sells_digital_goods: false,
        sells_services: false,
        locations: vec![
            PhysicalLocation {
                jurisdiction: Jurisdiction::NV,
                location_type: LocationType::Warehouse,
                established_date: date(2023, 1, 1),
                closed_date: None,
            },
            PhysicalLocation {
                jurisdiction: Jurisdiction::OR,
                location_type: LocationType::Office,
                established_date: date(2022, 5, 1),
                closed_date: None,
            },
        ],
    };

    let mut transactions: Vec<Transaction> = Vec::new();
    transactions.extend(monthly("CA", 2023, dec!(45000)));
    transactions.extend(monthly("CA", 2024, dec!(52000)));
    transactions.push(Transaction::new(date(2024, 11, 20), "CA", dec!(-3500)));
    transactions.extend(monthly("TX", 2024, dec!(35000)));
    transactions.extend(monthly("WA", 2024, dec!(5000)));
    transactions.extend(monthly("WA", 2024, dec!(6000)).map(Transaction::via_marketplace));
    transactions.push(Transaction::new(date(2023, 8, 3), "FL", dec!(100001)));
    transactions.extend(monthly("FL", 2024, dec!(4000)));
    transactions.extend((0..250).map(|day| {
        Transaction::new(date(2023, 1, 1) + Days::new(day), "GA", dec!(40))
    }));
    transactions.extend(monthly("NY", 2024, dec!(30000)));
    transactions.extend(monthly("NY", 2024, dec!(2500)).map(Transaction::exempt));
    transactions.extend(monthly("NV", 2024, dec!(1800)));
    transactions.extend(monthly("OR", 2024, dec!(9000)));
    transactions.push(Transaction::new(date(2024, 6, 2), "PR", dec!(750)));

    AnalysisInput {
        period: AnalysisPeriod::new(date(2024, 1, 1), date(2024, 12, 31)),
        profile,
        transactions,
    }
}
