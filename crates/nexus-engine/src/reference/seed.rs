use super::{JurisdictionNexusRule, JurisdictionPolicy, JurisdictionTaxConfig};
use crate::domain::Jurisdiction::{self, *};
use crate::domain::MeasurementPeriod::{
    self, CalendarYear, PreviousCalendarYear, Rolling12Months,
};
use crate::domain::NexusType::{self, Both, Either, Sales};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DEFAULT_LOOKBACK_MONTHS: u32 = 36;

type RuleRow = (
    Jurisdiction,
    NexusType,
    Option<Decimal>,
    Option<u32>,
    MeasurementPeriod,
    (i32, u32, u32),
);

// Economic nexus thresholds current as of October 2025.
const RULES: &[RuleRow] = &[
    (AL, Sales, Some(dec!(250000)), None, PreviousCalendarYear, (2018, 10, 1)),
    (AK, Either, Some(dec!(100000)), Some(200), CalendarYear, (2020, 4, 1)),
    (AZ, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 10, 1)),
    (AR, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 7, 1)),
    (CA, Sales, Some(dec!(500000)), None, PreviousCalendarYear, (2019, 4, 1)),
    (CO, Sales, Some(dec!(100000)), None, PreviousCalendarYear, (2019, 6, 1)),
    (CT, Both, Some(dec!(100000)), Some(200), Rolling12Months, (2019, 7, 1)),
    (FL, Sales, Some(dec!(100000)), None, PreviousCalendarYear, (2021, 7, 1)),
    (GA, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2020, 1, 1)),
    (HI, Either, Some(dec!(100000)), Some(200), CalendarYear, (2020, 7, 1)),
    (ID, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 6, 1)),
    (IL, Either, Some(dec!(100000)), Some(200), Rolling12Months, (2019, 10, 1)),
    (IN, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 10, 1)),
    (IA, Sales, Some(dec!(100000)), None, PreviousCalendarYear, (2019, 1, 1)),
    (KS, Sales, Some(dec!(100000)), None, CalendarYear, (2021, 7, 1)),
    (KY, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 7, 1)),
    (LA, Either, Some(dec!(100000)), Some(200), CalendarYear, (2020, 7, 1)),
    (ME, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 7, 1)),
    (MD, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 10, 1)),
    (MA, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 10, 1)),
    (MI, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 10, 1)),
    (MN, Either, Some(dec!(100000)), Some(200), Rolling12Months, (2019, 10, 1)),
    (MS, Sales, Some(dec!(250000)), None, Rolling12Months, (2020, 1, 1)),
    (MO, Sales, Some(dec!(100000)), None, PreviousCalendarYear, (2023, 1, 1)),
    (NE, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 4, 1)),
    (NV, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 10, 1)),
    (NJ, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2018, 11, 1)),
    (NM, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 7, 1)),
    (NY, Both, Some(dec!(500000)), Some(100), PreviousCalendarYear, (2019, 6, 1)),
    (NC, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 11, 1)),
    (ND, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 10, 1)),
    (OH, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 8, 1)),
    (OK, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 7, 1)),
    (PA, Sales, Some(dec!(100000)), None, Rolling12Months, (2019, 7, 1)),
    (RI, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 7, 1)),
    (SC, Sales, Some(dec!(100000)), None, PreviousCalendarYear, (2019, 4, 26)),
    (SD, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 3, 1)),
    (TN, Sales, Some(dec!(100000)), None, Rolling12Months, (2020, 7, 1)),
    (TX, Sales, Some(dec!(500000)), None, Rolling12Months, (2019, 10, 1)),
    (UT, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 10, 1)),
    (VT, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 7, 1)),
    (VA, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 7, 1)),
    (WA, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 10, 1)),
    (WV, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 1, 1)),
    (WI, Sales, Some(dec!(100000)), None, CalendarYear, (2019, 10, 1)),
    (WY, Either, Some(dec!(100000)), Some(200), CalendarYear, (2019, 7, 1)),
    (DC, Either, Some(dec!(100000)), Some(200), PreviousCalendarYear, (2019, 1, 1)),
];

// Rates as fractions; local rates are population-weighted averages.
const TAX_CONFIGS: &[(Jurisdiction, Decimal, Decimal, bool)] = &[
    (AL, dec!(0.04), dec!(0.0522), true),
    (AK, dec!(0.0), dec!(0.0176), false),
    (AZ, dec!(0.056), dec!(0.0277), true),
    (AR, dec!(0.065), dec!(0.0293), true),
    (CA, dec!(0.0725), dec!(0.0268), true),
    (CO, dec!(0.029), dec!(0.0487), true),
    (CT, dec!(0.0635), dec!(0.0), true),
    (DE, dec!(0.0), dec!(0.0), false),
    (FL, dec!(0.06), dec!(0.0105), true),
    (GA, dec!(0.04), dec!(0.0337), true),
    (HI, dec!(0.04), dec!(0.0044), true),
    (ID, dec!(0.06), dec!(0.0003), true),
    (IL, dec!(0.0625), dec!(0.0254), true),
    (IN, dec!(0.07), dec!(0.0), true),
    (IA, dec!(0.06), dec!(0.0094), true),
    (KS, dec!(0.065), dec!(0.0226), true),
    (KY, dec!(0.06), dec!(0.0), true),
    (LA, dec!(0.0445), dec!(0.0507), true),
    (ME, dec!(0.055), dec!(0.0), true),
    (MD, dec!(0.06), dec!(0.0), true),
    (MA, dec!(0.0625), dec!(0.0), true),
    (MI, dec!(0.06), dec!(0.0), true),
    (MN, dec!(0.06875), dec!(0.0065), true),
    (MS, dec!(0.07), dec!(0.0007), true),
    (MO, dec!(0.04225), dec!(0.0408), true),
    (MT, dec!(0.0), dec!(0.0), false),
    (NE, dec!(0.055), dec!(0.0142), true),
    (NV, dec!(0.0685), dec!(0.0153), true),
    (NH, dec!(0.0), dec!(0.0), false),
    (NJ, dec!(0.06625), dec!(0.0), true),
    (NM, dec!(0.05125), dec!(0.0269), true),
    (NY, dec!(0.04), dec!(0.0452), true),
    (NC, dec!(0.0475), dec!(0.0222), true),
    (ND, dec!(0.05), dec!(0.0223), true),
    (OH, dec!(0.0575), dec!(0.0148), true),
    (OK, dec!(0.045), dec!(0.0447), true),
    (OR, dec!(0.0), dec!(0.0), false),
    (PA, dec!(0.06), dec!(0.0034), true),
    (RI, dec!(0.07), dec!(0.0), true),
    (SC, dec!(0.06), dec!(0.0146), true),
    (SD, dec!(0.045), dec!(0.019), true),
    (TN, dec!(0.07), dec!(0.0255), true),
    (TX, dec!(0.0625), dec!(0.0194), true),
    (UT, dec!(0.061), dec!(0.0111), true),
    (VT, dec!(0.06), dec!(0.0037), true),
    (VA, dec!(0.053), dec!(0.0045), true),
    (WA, dec!(0.065), dec!(0.0289), true),
    (WV, dec!(0.06), dec!(0.005), true),
    (WI, dec!(0.05), dec!(0.0044), true),
    (WY, dec!(0.04), dec!(0.0136), true),
    (DC, dec!(0.06), dec!(0.0), true),
];

const REGISTRATION_GRACE_DAYS: &[(Jurisdiction, u32)] = &[
    (AL, 30),
    (AK, 30),
    (AZ, 60),
    (AR, 60),
    (CA, 90),
    (CO, 30),
    (CT, 60),
    (FL, 30),
    (GA, 60),
    (HI, 30),
    (ID, 60),
    (IL, 90),
    (IN, 60),
    (IA, 60),
    (KS, 30),
    (KY, 60),
    (LA, 30),
    (ME, 30),
    (MD, 60),
    (MA, 30),
    (MI, 60),
    (MN, 60),
    (MS, 30),
    (MO, 30),
    (NE, 60),
    (NV, 30),
    (NJ, 30),
    (NM, 60),
    (NY, 60),
    (NC, 60),
    (ND, 60),
    (OH, 30),
    (OK, 60),
    (PA, 60),
    (RI, 30),
    (SC, 60),
    (SD, 60),
    (TN, 30),
    (TX, 30),
    (UT, 60),
    (VT, 30),
    (VA, 60),
    (WA, 30),
    (WV, 60),
    (WI, 60),
    (WY, 60),
    (DC, 60),
];

pub(super) fn nexus_rules() -> Vec<JurisdictionNexusRule> {
    RULES
        .iter()
        .map(|&(jurisdiction, nexus_type, sales, transactions, period, (year, month, day))| {
            JurisdictionNexusRule {
                jurisdiction,
                nexus_type,
                sales_threshold: sales,
                transaction_threshold: transactions,
                measurement_period: period,
                marketplace_facilitator_law: true,
                effective_date: NaiveDate::from_ymd_opt(year, month, day)
                    .unwrap_or(NaiveDate::MIN),
            }
        })
        .collect()
}

pub(super) fn tax_configs() -> Vec<JurisdictionTaxConfig> {
    TAX_CONFIGS
        .iter()
        .map(
            |&(jurisdiction, state_rate, avg_local_rate, has_sales_tax)| JurisdictionTaxConfig {
                jurisdiction,
                state_rate,
                avg_local_rate,
                has_sales_tax,
            },
        )
        .collect()
}

pub(super) fn policies() -> Vec<JurisdictionPolicy> {
    TAX_CONFIGS
        .iter()
        .map(|&(jurisdiction, _, _, has_sales_tax)| {
            let registration_grace_days = REGISTRATION_GRACE_DAYS
                .iter()
                .find(|(code, _)| *code == jurisdiction)
                .map(|&(_, days)| days);
            JurisdictionPolicy {
                jurisdiction,
                registration_grace_days,
                lookback_months: has_sales_tax.then_some(DEFAULT_LOOKBACK_MONTHS),
            }
        })
        .collect()
}
