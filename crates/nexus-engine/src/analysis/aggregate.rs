use crate::domain::{AnalysisPeriod, Jurisdiction, MeasurementPeriod, Transaction};
use crate::error::{DataQualityWarning, WarningKind};
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

/// Running totals for one jurisdiction over one date window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowTotals {
    pub gross_sales: Decimal,
    pub marketplace_sales: Decimal,
    /// Exempt sales that were not made through a marketplace.
    pub exempt_sales: Decimal,
    pub transaction_count: u32,
    pub marketplace_transaction_count: u32,
}

impl WindowTotals {
    pub(crate) fn record(&mut self, entry: &LedgerEntry) {
        self.gross_sales += entry.amount;
        // Refunds net the amount but still count as an event.
        self.transaction_count += 1;

        if entry.is_marketplace {
            self.marketplace_sales += entry.amount;
            self.marketplace_transaction_count += 1;
        } else if entry.is_exempt {
            self.exempt_sales += entry.amount;
        }
    }

    pub fn sales_excluding_marketplace(&self) -> Decimal {
        self.gross_sales - self.marketplace_sales
    }

    pub fn transactions_excluding_marketplace(&self) -> u32 {
        self.transaction_count - self.marketplace_transaction_count
    }

    pub fn sales_excluding_exempt(&self) -> Decimal {
        self.gross_sales - self.exempt_sales
    }

    /// Sales the seller itself must collect on: neither marketplace nor exempt.
    pub fn taxable_base(&self) -> Decimal {
        self.gross_sales - self.marketplace_sales - self.exempt_sales
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

/// Inclusive date window a measurement period resolves to for a given anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasurementWindow {
    pub period: MeasurementPeriod,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MeasurementWindow {
    pub fn resolve(period: MeasurementPeriod, anchor: NaiveDate) -> Self {
        let (start, end) = match period {
            MeasurementPeriod::CalendarYear => (year_start(anchor.year(), anchor), anchor),
            MeasurementPeriod::Rolling12Months => {
                let start = anchor
                    .checked_sub_months(Months::new(12))
                    .and_then(|date| date.checked_add_days(Days::new(1)))
                    .unwrap_or(anchor);
                (start, anchor)
            }
            MeasurementPeriod::PreviousCalendarYear => {
                let year = anchor.year() - 1;
                let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(anchor);
                (year_start(year, anchor), end)
            }
        };

        Self { period, start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn year_start(year: i32, fallback: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(fallback)
}

/// One accepted transaction in a jurisdiction's chronological ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Position in the caller's transaction slice, used to break same-day ties.
    pub sequence: usize,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub is_exempt: bool,
    pub is_marketplace: bool,
}

#[derive(Debug, Clone)]
pub struct JurisdictionActivity {
    pub jurisdiction: Jurisdiction,
    pub calendar_year: WindowTotals,
    pub rolling_12mo: WindowTotals,
    pub previous_calendar_year: WindowTotals,
    pub analysis_period: WindowTotals,
    ledger: Vec<LedgerEntry>,
}

impl JurisdictionActivity {
    fn empty(jurisdiction: Jurisdiction) -> Self {
        Self {
            jurisdiction,
            calendar_year: WindowTotals::default(),
            rolling_12mo: WindowTotals::default(),
            previous_calendar_year: WindowTotals::default(),
            analysis_period: WindowTotals::default(),
            ledger: Vec::new(),
        }
    }

    pub fn window(&self, period: MeasurementPeriod) -> &WindowTotals {
        match period {
            MeasurementPeriod::CalendarYear => &self.calendar_year,
            MeasurementPeriod::Rolling12Months => &self.rolling_12mo,
            MeasurementPeriod::PreviousCalendarYear => &self.previous_calendar_year,
        }
    }

    /// Entries ordered by date, then by ingestion order.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn entries_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.ledger
            .iter()
            .filter(move |entry| start <= entry.date && entry.date <= end)
    }

    pub fn totals_between(&self, start: NaiveDate, end: NaiveDate) -> WindowTotals {
        let mut totals = WindowTotals::default();
        for entry in self.entries_between(start, end) {
            totals.record(entry);
        }
        totals
    }
}

/// Aggregated activity for all 51 jurisdictions, indexed by [`Jurisdiction::index`].
#[derive(Debug, Clone)]
pub struct ActivitySnapshot {
    pub period: AnalysisPeriod,
    pub windows: [MeasurementWindow; 3],
    /// Earliest date covered by supplied data: the period start or an earlier transaction.
    pub coverage_start: NaiveDate,
    pub warnings: Vec<DataQualityWarning>,
    activities: Vec<JurisdictionActivity>,
}

impl ActivitySnapshot {
    pub fn activity(&self, jurisdiction: Jurisdiction) -> &JurisdictionActivity {
        &self.activities[jurisdiction.index()]
    }

    pub fn window(&self, period: MeasurementPeriod) -> MeasurementWindow {
        match period {
            MeasurementPeriod::CalendarYear => self.windows[0],
            MeasurementPeriod::Rolling12Months => self.windows[1],
            MeasurementPeriod::PreviousCalendarYear => self.windows[2],
        }
    }

    /// Whether the supplied data spans the whole measurement window.
    pub fn covers(&self, window: &MeasurementWindow) -> bool {
        self.coverage_start <= window.start && window.end <= self.period.end
    }
}

pub fn aggregate(transactions: &[Transaction], period: &AnalysisPeriod) -> ActivitySnapshot {
    let windows =
        MeasurementPeriod::ordered().map(|kind| MeasurementWindow::resolve(kind, period.end));
    let mut activities: Vec<JurisdictionActivity> = Jurisdiction::ALL
        .into_iter()
        .map(JurisdictionActivity::empty)
        .collect();
    let mut warnings = Vec::new();
    let mut coverage_start = period.start;

    for (sequence, transaction) in transactions.iter().enumerate() {
        let jurisdiction = match transaction.jurisdiction.parse::<Jurisdiction>() {
            Ok(jurisdiction) => jurisdiction,
            Err(err) => {
                warnings.push(DataQualityWarning::new(
                    None,
                    WarningKind::UnknownJurisdiction,
                    format!("transaction #{sequence} on {} dropped: {err}", transaction.date),
                ));
                continue;
            }
        };

        coverage_start = coverage_start.min(transaction.date);
        activities[jurisdiction.index()].ledger.push(LedgerEntry {
            sequence,
            date: transaction.date,
            amount: transaction.amount,
            is_exempt: transaction.is_exempt,
            is_marketplace: transaction.is_marketplace,
        });
    }

    for activity in &mut activities {
        // Stable sort keeps ingestion order for same-day entries.
        activity.ledger.sort_by_key(|entry| entry.date);

        let JurisdictionActivity {
            calendar_year,
            rolling_12mo,
            previous_calendar_year,
            analysis_period,
            ledger,
            ..
        } = activity;

        for entry in ledger.iter() {
            if windows[0].contains(entry.date) {
                calendar_year.record(entry);
            }
            if windows[1].contains(entry.date) {
                rolling_12mo.record(entry);
            }
            if windows[2].contains(entry.date) {
                previous_calendar_year.record(entry);
            }
            if period.contains(entry.date) {
                analysis_period.record(entry);
            }
        }
    }

    ActivitySnapshot {
        period: *period,
        windows,
        coverage_start,
        warnings,
        activities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn period_2024() -> AnalysisPeriod {
        AnalysisPeriod::new(date(2024, 1, 1), date(2024, 12, 31))
    }

    #[test]
    fn windows_resolve_against_period_end() {
        let anchor = date(2024, 6, 30);
        let calendar = MeasurementWindow::resolve(MeasurementPeriod::CalendarYear, anchor);
        assert_eq!((calendar.start, calendar.end), (date(2024, 1, 1), anchor));

        let rolling = MeasurementWindow::resolve(MeasurementPeriod::Rolling12Months, anchor);
        assert_eq!((rolling.start, rolling.end), (date(2023, 7, 1), anchor));

        let previous = MeasurementWindow::resolve(MeasurementPeriod::PreviousCalendarYear, anchor);
        assert_eq!(
            (previous.start, previous.end),
            (date(2023, 1, 1), date(2023, 12, 31))
        );
    }

    #[test]
    fn zero_activity_jurisdictions_still_have_records() {
        let snapshot = aggregate(&[], &period_2024());
        for jurisdiction in Jurisdiction::ALL {
            let activity = snapshot.activity(jurisdiction);
            assert_eq!(activity.jurisdiction, jurisdiction);
            assert!(activity.calendar_year.is_empty());
            assert_eq!(activity.analysis_period.gross_sales, Decimal::ZERO);
        }
    }

    #[test]
    fn every_window_is_computed_for_every_transaction() {
        let transactions = vec![
            Transaction::new(date(2023, 3, 10), "CO", dec!(500)),
            Transaction::new(date(2024, 2, 1), "CO", dec!(700)).via_marketplace(),
            Transaction::new(date(2024, 11, 5), "co", dec!(300)).exempt(),
        ];
        let snapshot = aggregate(&transactions, &period_2024());
        let activity = snapshot.activity(Jurisdiction::CO);

        assert_eq!(activity.previous_calendar_year.gross_sales, dec!(500));
        assert_eq!(activity.calendar_year.gross_sales, dec!(1000));
        assert_eq!(activity.calendar_year.marketplace_sales, dec!(700));
        assert_eq!(activity.calendar_year.exempt_sales, dec!(300));
        assert_eq!(activity.calendar_year.taxable_base(), Decimal::ZERO);
        assert_eq!(activity.rolling_12mo.transaction_count, 2);
        assert_eq!(activity.analysis_period.transactions_excluding_marketplace(), 1);
    }

    #[test]
    fn refunds_net_sales_but_count_as_events() {
        let transactions = vec![
            Transaction::new(date(2024, 4, 1), "TX", dec!(1000)),
            Transaction::new(date(2024, 4, 9), "TX", dec!(-250)),
        ];
        let snapshot = aggregate(&transactions, &period_2024());
        let totals = &snapshot.activity(Jurisdiction::TX).calendar_year;
        assert_eq!(totals.gross_sales, dec!(750));
        assert_eq!(totals.transaction_count, 2);
    }

    #[test]
    fn unknown_jurisdictions_are_dropped_with_a_warning() {
        let transactions = vec![
            Transaction::new(date(2024, 4, 1), "ZZ", dec!(1000)),
            Transaction::new(date(2024, 4, 2), "GA", dec!(10)),
        ];
        let snapshot = aggregate(&transactions, &period_2024());
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::UnknownJurisdiction);
        assert_eq!(snapshot.activity(Jurisdiction::GA).calendar_year.transaction_count, 1);
    }

    #[test]
    fn ledger_orders_by_date_then_ingestion() {
        let transactions = vec![
            Transaction::new(date(2024, 5, 2), "NJ", dec!(1)),
            Transaction::new(date(2024, 5, 1), "NJ", dec!(2)),
            Transaction::new(date(2024, 5, 2), "NJ", dec!(3)),
        ];
        let snapshot = aggregate(&transactions, &period_2024());
        let order: Vec<usize> = snapshot
            .activity(Jurisdiction::NJ)
            .ledger()
            .iter()
            .map(|entry| entry.sequence)
            .collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn earlier_transactions_extend_coverage() {
        let transactions = vec![Transaction::new(date(2023, 1, 1), "PA", dec!(1))];
        let snapshot = aggregate(&transactions, &period_2024());
        assert_eq!(snapshot.coverage_start, date(2023, 1, 1));
        assert!(snapshot.covers(&snapshot.window(MeasurementPeriod::PreviousCalendarYear)));
        assert!(!aggregate(&[], &period_2024())
            .covers(&snapshot.window(MeasurementPeriod::PreviousCalendarYear)));
    }
}
