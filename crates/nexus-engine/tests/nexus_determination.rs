mod common;

use common::{
    analyzer_with, date, input, mixed_book, monthly_sales, remote_seller, run, standard_analyzer,
    warehouse_in,
};
use nexus_engine::{
    BusinessProfile, ConfidenceLevel, Jurisdiction, LocationType, NexusError, NexusStatus,
    ReferenceData, Transaction, WarningKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;

#[test]
fn every_jurisdiction_is_reported_in_fixed_order() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let outcome = run(&analyzer, &input(Vec::new(), BusinessProfile::default()));

    assert_eq!(outcome.determinations.len(), 51);
    for (determination, jurisdiction) in outcome.determinations.iter().zip(Jurisdiction::ALL) {
        assert_eq!(determination.jurisdiction, jurisdiction);
        assert_eq!(determination.total_sales, Decimal::ZERO);
        assert_eq!(determination.transaction_count, 0);
        assert_eq!(determination.nexus_status, NexusStatus::NoNexus);
        assert!(!determination.has_physical_nexus);
    }
    assert!(outcome.estimates.is_empty());
}

#[test]
fn identical_inputs_produce_identical_output() {
    let analyzer = standard_analyzer(date(2025, 6, 30));
    let book = input(mixed_book(), warehouse_in(Jurisdiction::NV, date(2023, 1, 1)));

    let first = run(&analyzer, &book);
    let second = run(&analyzer, &book);

    assert_eq!(
        serde_json::to_string(&first.determinations).expect("determinations serialize"),
        serde_json::to_string(&second.determinations).expect("determinations serialize")
    );
    assert_eq!(
        serde_json::to_string(&first.estimates).expect("estimates serialize"),
        serde_json::to_string(&second.estimates).expect("estimates serialize")
    );
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn sales_exactly_at_threshold_create_nexus() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let transactions = vec![Transaction::new(date(2024, 4, 10), "WA", dec!(100000))];

    let outcome = run(&analyzer, &input(transactions, remote_seller()));
    let washington = outcome.determination(Jurisdiction::WA);

    assert!(washington.has_economic_nexus);
    assert_eq!(washington.nexus_status, NexusStatus::HasNexus);
    assert_eq!(washington.threshold_pct, Some(dec!(100)));
    assert_eq!(washington.established_date, Some(date(2024, 4, 10)));
}

#[test]
fn marketplace_sales_leave_threshold_math_but_stay_in_totals() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let mut transactions = monthly_sales("WA", 2024, 1, 6, dec!(10000));
    transactions.extend(
        monthly_sales("WA", 2024, 7, 6, dec!(10000))
            .into_iter()
            .map(Transaction::via_marketplace),
    );

    let outcome = run(&analyzer, &input(transactions, remote_seller()));
    let washington = outcome.determination(Jurisdiction::WA);

    assert_eq!(washington.total_sales, dec!(120000));
    assert_eq!(washington.transaction_count, 12);
    assert!(!washington.has_economic_nexus);
    assert_eq!(washington.threshold_pct, Some(dec!(60)));
    assert_eq!(washington.nexus_status, NexusStatus::NoNexus);
}

#[test]
fn scenario_prior_year_sales_just_over_threshold() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let transactions = vec![Transaction::new(date(2023, 1, 1), "CO", dec!(100001))];

    let outcome = run(&analyzer, &input(transactions, remote_seller()));
    let colorado = outcome.determination(Jurisdiction::CO);

    assert!(colorado.has_economic_nexus);
    assert_eq!(colorado.threshold_pct, Some(dec!(100.00)));
    assert_eq!(colorado.confidence, ConfidenceLevel::High);
    assert_eq!(colorado.established_date, Some(date(2023, 1, 1)));
    assert_eq!(colorado.registration_deadline, Some(date(2023, 1, 31)));
    assert_eq!(colorado.total_sales, dec!(100001));
}

#[test]
fn scenario_close_to_threshold_band() {
    let analyzer = standard_analyzer(date(2025, 1, 31));

    let close = run(
        &analyzer,
        &input(
            vec![Transaction::new(date(2023, 1, 1), "CO", dec!(81000))],
            remote_seller(),
        ),
    );
    assert_eq!(
        close.determination(Jurisdiction::CO).nexus_status,
        NexusStatus::CloseToThreshold
    );

    let below = run(
        &analyzer,
        &input(
            vec![Transaction::new(date(2023, 1, 1), "CO", dec!(79000))],
            remote_seller(),
        ),
    );
    assert_eq!(
        below.determination(Jurisdiction::CO).nexus_status,
        NexusStatus::NoNexus
    );
}

#[test]
fn scenario_no_sales_tax_jurisdictions_never_get_estimates() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let mut profile = warehouse_in(Jurisdiction::OR, date(2020, 1, 1));
    profile.legal_name = "Portland Goods".to_string();
    let transactions = vec![
        Transaction::new(date(2024, 2, 1), "OR", dec!(2000000)),
        Transaction::new(date(2024, 2, 1), "AK", dec!(2000000)),
        Transaction::new(date(2024, 2, 1), "MT", dec!(2000000)),
    ];

    let outcome = run(&analyzer, &input(transactions, profile));

    let oregon = outcome.determination(Jurisdiction::OR);
    assert!(oregon.has_physical_nexus);
    assert_eq!(oregon.nexus_status, NexusStatus::HasNexus);
    assert!(!oregon.has_sales_tax);
    assert!(!outcome.determination(Jurisdiction::AK).has_economic_nexus);
    for jurisdiction in [Jurisdiction::OR, Jurisdiction::AK, Jurisdiction::MT] {
        assert!(outcome.estimate(jurisdiction).is_none(), "{jurisdiction}");
    }
}

#[test]
fn scenario_warehouse_creates_physical_nexus_without_sales() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let outcome = run(
        &analyzer,
        &input(Vec::new(), warehouse_in(Jurisdiction::NV, date(2023, 1, 1))),
    );

    let nevada = outcome.determination(Jurisdiction::NV);
    assert!(nevada.has_physical_nexus);
    assert!(!nevada.has_economic_nexus);
    assert_eq!(nevada.nexus_status, NexusStatus::HasNexus);
    assert_eq!(nevada.confidence, ConfidenceLevel::High);
    assert_eq!(nevada.total_sales, Decimal::ZERO);
    assert_eq!(nevada.established_date, Some(date(2024, 1, 1)));
    assert!(outcome.estimate(Jurisdiction::NV).is_some());
}

#[test]
fn closed_location_overlapping_the_period_keeps_physical_nexus() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let mut profile = warehouse_in(Jurisdiction::OH, date(2022, 5, 1));
    profile.locations[0].location_type = LocationType::Office;
    profile.locations[0].closed_date = Some(date(2024, 3, 15));

    let outcome = run(&analyzer, &input(Vec::new(), profile));
    let ohio = outcome.determination(Jurisdiction::OH);

    assert!(ohio.has_nexus());
    assert!(ohio.has_physical_nexus);
    assert!(!ohio.has_economic_nexus);
    assert_eq!(ohio.total_sales, Decimal::ZERO);
    assert_eq!(ohio.established_date, Some(date(2024, 1, 1)));
    assert_eq!(ohio.location_types, vec![LocationType::Office]);
}

#[test]
fn location_closed_before_it_opened_creates_no_nexus() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let mut profile = warehouse_in(Jurisdiction::NV, date(2024, 6, 1));
    profile.locations[0].closed_date = Some(date(2024, 3, 1));

    let outcome = run(&analyzer, &input(Vec::new(), profile));
    let nevada = outcome.determination(Jurisdiction::NV);

    assert!(!nevada.has_physical_nexus);
    assert_eq!(nevada.nexus_status, NexusStatus::NoNexus);
    assert_eq!(nevada.established_date, None);
    assert!(outcome.estimate(Jurisdiction::NV).is_none());
    assert!(outcome.warnings.iter().any(|warning| {
        warning.kind == WarningKind::ProfileInconsistency
            && warning.jurisdiction == Some(Jurisdiction::NV)
    }));
}

#[test]
fn jurisdiction_missing_from_every_table_is_flagged_not_untaxed() {
    let mut tables = ReferenceData::standard_tables();
    tables.rules.retain(|rule| rule.jurisdiction != Jurisdiction::TX);
    tables
        .tax_configs
        .retain(|config| config.jurisdiction != Jurisdiction::TX);
    let analyzer = analyzer_with(tables, date(2025, 1, 31));
    let transactions = vec![Transaction::new(date(2024, 3, 1), "TX", dec!(900000))];

    let outcome = run(
        &analyzer,
        &input(transactions, warehouse_in(Jurisdiction::TX, date(2023, 1, 1))),
    );
    let texas = outcome.determination(Jurisdiction::TX);

    assert!(texas.has_sales_tax);
    assert_eq!(texas.nexus_status, NexusStatus::HasNexus);
    assert_eq!(texas.confidence, ConfidenceLevel::Low);
    assert!(!texas
        .notes
        .iter()
        .any(|note| note.contains("does not impose")));
    let kinds: Vec<WarningKind> = texas.warnings.iter().map(|warning| warning.kind).collect();
    assert!(kinds.contains(&WarningKind::MissingTaxConfig));
    assert!(kinds.contains(&WarningKind::MissingNexusRule));

    let estimate = outcome
        .estimate(Jurisdiction::TX)
        .expect("physical nexus with an assumed sales tax");
    assert_eq!(estimate.confidence, ConfidenceLevel::Low);
    assert_eq!(estimate.liability_mid, None);

    let missing_config = outcome
        .warnings
        .iter()
        .filter(|warning| {
            warning.kind == WarningKind::MissingTaxConfig
                && warning.jurisdiction == Some(Jurisdiction::TX)
        })
        .count();
    assert_eq!(missing_config, 1);
}

#[test]
fn estimates_cover_exactly_taxing_nexus_jurisdictions() {
    let analyzer = standard_analyzer(date(2025, 6, 30));
    let outcome = run(
        &analyzer,
        &input(mixed_book(), warehouse_in(Jurisdiction::NV, date(2023, 1, 1))),
    );

    let expected: Vec<Jurisdiction> = outcome
        .determinations
        .iter()
        .filter(|determination| determination.has_nexus() && determination.has_sales_tax)
        .map(|determination| determination.jurisdiction)
        .collect();
    let estimated: Vec<Jurisdiction> = outcome
        .estimates
        .iter()
        .map(|estimate| estimate.jurisdiction)
        .collect();

    assert_eq!(estimated, expected);
    assert!(estimated.contains(&Jurisdiction::CA));
    assert!(estimated.contains(&Jurisdiction::NV));
    assert_eq!(
        outcome.determination(Jurisdiction::TX).nexus_status,
        NexusStatus::CloseToThreshold
    );
}

#[test]
fn transaction_count_crossing_uses_chronological_order() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let start = date(2023, 1, 1);
    // Georgia: $100,000 or 200 transactions in the previous calendar year.
    let mut transactions: Vec<Transaction> = (0..199)
        .rev()
        .map(|offset| {
            Transaction::new(start + chrono::Days::new(offset), "GA", dec!(25))
        })
        .collect();
    transactions.push(Transaction::new(date(2023, 9, 1), "GA", dec!(25)));
    transactions.push(Transaction::new(date(2023, 8, 31), "GA", dec!(25)));

    let outcome = run(&analyzer, &input(transactions, remote_seller()));
    let georgia = outcome.determination(Jurisdiction::GA);

    assert!(georgia.has_economic_nexus);
    assert_eq!(georgia.transaction_count, 201);
    assert_eq!(georgia.established_date, Some(date(2023, 8, 31)));
}

#[test]
fn unknown_jurisdiction_codes_are_dropped_with_warning() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let transactions = vec![
        Transaction::new(date(2024, 3, 1), "PR", dec!(500000)),
        Transaction::new(date(2024, 3, 1), "tx", dec!(100)),
    ];

    let outcome = run(&analyzer, &input(transactions, remote_seller()));

    assert!(outcome
        .warnings
        .iter()
        .any(|warning| warning.kind == WarningKind::UnknownJurisdiction));
    assert_eq!(outcome.determination(Jurisdiction::TX).total_sales, dec!(100));
    let total: Decimal = outcome
        .determinations
        .iter()
        .map(|determination| determination.total_sales)
        .sum();
    assert_eq!(total, dec!(100));
}

#[test]
fn missing_rule_is_reported_and_skips_economic_test() {
    let mut tables = ReferenceData::standard_tables();
    tables.rules.retain(|rule| rule.jurisdiction != Jurisdiction::OH);
    let analyzer = analyzer_with(tables, date(2025, 1, 31));
    let transactions = vec![Transaction::new(date(2024, 3, 1), "OH", dec!(900000))];

    let outcome = run(&analyzer, &input(transactions, remote_seller()));
    let ohio = outcome.determination(Jurisdiction::OH);

    assert!(!ohio.has_economic_nexus);
    assert_eq!(ohio.confidence, ConfidenceLevel::Low);
    assert!(ohio
        .warnings
        .iter()
        .any(|warning| warning.kind == WarningKind::MissingNexusRule));
    assert!(outcome.estimate(Jurisdiction::OH).is_none());
}

#[test]
fn invalid_period_is_rejected_before_computation() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let mut request = input(Vec::new(), remote_seller());
    request.period.end = date(2023, 12, 31);

    match analyzer.analyze(&request) {
        Err(NexusError::InvalidPeriod { start, end }) => {
            assert_eq!(start, date(2024, 1, 1));
            assert_eq!(end, date(2023, 12, 31));
        }
        other => panic!("expected invalid period, got {other:?}"),
    }
}

#[test]
fn cancelled_run_returns_no_results() {
    let analyzer = standard_analyzer(date(2025, 1, 31));
    let cancel = AtomicBool::new(true);

    let result = analyzer.analyze_with_cancel(&input(mixed_book(), remote_seller()), &cancel);

    assert!(matches!(result, Err(NexusError::Cancelled)));
}
