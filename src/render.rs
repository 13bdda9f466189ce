use nexus_engine::report::format_money;
use nexus_engine::{
    AnalysisOutcome, Jurisdiction, LiabilitySummary, NexusDetermination, NexusStatus,
    NexusSummary, ReferenceData,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};

/// JSON document emitted by `analyze --json`.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    #[serde(flatten)]
    pub outcome: &'a AnalysisOutcome,
    pub nexus_summary: NexusSummary,
    pub liability_summary: LiabilitySummary,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(outcome: &'a AnalysisOutcome) -> Self {
        Self {
            outcome,
            nexus_summary: outcome.nexus_summary(),
            liability_summary: outcome.liability_summary(),
        }
    }
}

fn signal_label(determination: &NexusDetermination) -> &'static str {
    match (
        determination.has_physical_nexus,
        determination.has_economic_nexus,
    ) {
        (true, true) => "physical + economic",
        (true, false) => "physical",
        (false, true) => "economic",
        (false, false) => "none",
    }
}

pub fn render_report(outcome: &AnalysisOutcome, out: &mut impl Write) -> io::Result<()> {
    let nexus = outcome.nexus_summary();
    let liability = outcome.liability_summary();

    writeln!(out, "Sales tax nexus analysis")?;
    writeln!(
        out,
        "Period: {} -> {} (evaluated {})",
        outcome.period.start, outcome.period.end, outcome.as_of
    )?;

    writeln!(out, "\nNexus overview")?;
    for entry in &nexus.by_status {
        writeln!(out, "- {}: {}", entry.status_label, entry.jurisdictions)?;
    }
    writeln!(
        out,
        "- Physical: {}, economic: {}, both: {}",
        nexus.physical_nexus, nexus.economic_nexus, nexus.physical_and_economic
    )?;

    let with_nexus: Vec<&NexusDetermination> = outcome
        .determinations
        .iter()
        .filter(|determination| determination.nexus_status == NexusStatus::HasNexus)
        .collect();
    if with_nexus.is_empty() {
        writeln!(out, "\nJurisdictions with nexus: none")?;
    } else {
        writeln!(out, "\nJurisdictions with nexus")?;
        for determination in with_nexus {
            let established = determination
                .established_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            writeln!(
                out,
                "- {} {} | {} | established {} | confidence {}",
                determination.jurisdiction.code(),
                determination.jurisdiction.name(),
                signal_label(determination),
                established,
                determination.confidence.label()
            )?;
            writeln!(out, "  {}", determination.recommendation)?;
        }
    }

    if !nexus.approaching.is_empty() {
        writeln!(out, "\nApproaching thresholds")?;
        for entry in &nexus.approaching {
            let pct = entry
                .threshold_pct
                .map(|pct| format!("{pct}%"))
                .unwrap_or_default();
            match entry.days_until_threshold {
                Some(days) => writeln!(
                    out,
                    "- {} {}: {} (about {} days to cross)",
                    entry.jurisdiction.code(),
                    entry.name,
                    pct,
                    days
                )?,
                None => writeln!(out, "- {} {}: {}", entry.jurisdiction.code(), entry.name, pct)?,
            }
        }
    }

    if outcome.estimates.is_empty() {
        writeln!(out, "\nLiability estimates: none")?;
    } else {
        writeln!(out, "\nLiability estimates (by priority)")?;
        for estimate in outcome.prioritized_estimates() {
            let amount = |value: Option<Decimal>| {
                value.map(format_money).unwrap_or_else(|| "n/a".to_string())
            };
            writeln!(
                out,
                "- {}: mid {} (low {}, high {}), lookback {}, penalties {}, risk {}",
                estimate.jurisdiction.code(),
                amount(estimate.liability_mid),
                amount(estimate.liability_low),
                amount(estimate.liability_high),
                amount(estimate.lookback_liability),
                amount(
                    estimate
                        .penalty
                        .map(|penalty| penalty + estimate.interest.unwrap_or_default())
                ),
                estimate.risk.label()
            )?;
            writeln!(out, "  {}", estimate.recommendation)?;
        }

        writeln!(out, "\nLiability totals")?;
        writeln!(
            out,
            "- Estimated: {} (range {} - {})",
            format_money(liability.total_mid),
            format_money(liability.total_low),
            format_money(liability.total_high)
        )?;
        writeln!(out, "- Lookback: {}", format_money(liability.total_lookback))?;
        writeln!(
            out,
            "- Penalties and interest: {}",
            format_money(liability.total_penalties + liability.total_interest)
        )?;
    }

    if !liability.priority_actions.is_empty() {
        writeln!(out, "\nPriority actions")?;
        for action in &liability.priority_actions {
            writeln!(out, "- {action}")?;
        }
    }

    if !nexus.observations.is_empty() {
        writeln!(out, "\nObservations")?;
        for observation in &nexus.observations {
            writeln!(out, "- {observation}")?;
        }
    }

    if outcome.warnings.is_empty() {
        writeln!(out, "\nData quality warnings: none")?;
    } else {
        writeln!(out, "\nData quality warnings")?;
        for warning in &outcome.warnings {
            let scope = warning
                .jurisdiction
                .map(Jurisdiction::code)
                .unwrap_or("input");
            writeln!(out, "- [{}] {}: {}", warning.kind.label(), scope, warning.detail)?;
        }
    }

    Ok(())
}

pub fn render_rules(
    reference: &ReferenceData,
    only: Option<Jurisdiction>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "Economic nexus rules")?;
    let jurisdictions: Vec<Jurisdiction> = match only {
        Some(jurisdiction) => vec![jurisdiction],
        None => Jurisdiction::ALL.to_vec(),
    };

    for jurisdiction in jurisdictions {
        let rates = match reference.tax_config(jurisdiction) {
            Some(tax) if !tax.has_sales_tax => "no sales tax".to_string(),
            Some(tax) => format!(
                "state {}%, avg local {}%",
                (tax.state_rate * Decimal::ONE_HUNDRED).normalize(),
                (tax.avg_local_rate * Decimal::ONE_HUNDRED).normalize()
            ),
            None => "no tax config".to_string(),
        };

        match reference.rule(jurisdiction) {
            Some(rule) => {
                let mut thresholds = Vec::new();
                if let Some(sales) = rule.sales_threshold {
                    thresholds.push(format_money(sales));
                }
                if let Some(count) = rule.transaction_threshold {
                    thresholds.push(format!("{count} transactions"));
                }
                writeln!(
                    out,
                    "- {} {}: {} [{}] over {}, effective {} | {}",
                    jurisdiction.code(),
                    jurisdiction.name(),
                    rule.nexus_type.label(),
                    thresholds.join(" / "),
                    rule.measurement_period.label(),
                    rule.effective_date,
                    rates
                )?;
            }
            None => writeln!(
                out,
                "- {} {}: no economic nexus rule | {}",
                jurisdiction.code(),
                jurisdiction.name(),
                rates
            )?,
        }
    }

    Ok(())
}
