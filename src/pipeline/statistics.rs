use super::{Produced, StageOutput, StageResult, StateDelta};
use crate::model::{Bill, BillColumn, EntryType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Totals for the selected month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Statistics {
    /// True when a month is selected.
    pub(crate) show: bool,
    /// Total expenditure at index 0 and total revenue at index 1, as decimal strings.
    pub(crate) revenue: [String; 2],
    /// Expenditure per category, smallest first.
    pub(crate) expenditure: Vec<CategoryAmount>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: String,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            show: false,
            revenue: [String::from("0"), String::from("0")],
            expenditure: Vec::new(),
        }
    }
}

impl Statistics {
    pub fn show(&self) -> bool {
        self.show
    }

    pub fn revenue(&self) -> &[String; 2] {
        &self.revenue
    }

    pub fn expenditure(&self) -> &[CategoryAmount] {
        &self.expenditure
    }

    /// Totals `rows` exactly.
    fn summarize(rows: &[Arc<Bill>]) -> Self {
        let mut revenue = [Decimal::ZERO; 2];
        let mut categories: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, Decimal> = HashMap::new();

        for bill in rows {
            let amount = bill.amount().value();
            revenue[bill.r#type().index()] += amount;
            if bill.r#type() != EntryType::Expenditure {
                continue;
            }
            match totals.get_mut(bill.category()) {
                Some(total) => *total += amount,
                None => {
                    categories.push(bill.category());
                    totals.insert(bill.category(), amount);
                }
            }
        }

        let mut expenditure: Vec<(&str, Decimal)> = categories
            .into_iter()
            .map(|category| (category, totals.get(category).copied().unwrap_or_default()))
            .collect();
        // Stable, so equal totals keep first-seen order
        expenditure.sort_by(|a, b| a.1.cmp(&b.1));

        Self {
            show: true,
            revenue: revenue.map(format_decimal),
            expenditure: expenditure
                .into_iter()
                .map(|(category, amount)| CategoryAmount {
                    category: category.to_string(),
                    amount: format_decimal(amount),
                })
                .collect(),
        }
    }
}

/// Writes a decimal without trailing fractional zeros, e.g. `12700` rather than `12700.00`.
fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Computes statistics from the month-narrowed rows of this run's filter output. The category
/// filter is deliberately ignored so the breakdown always covers the whole month.
pub(super) fn apply(produced: &Produced) -> StageResult {
    let month_rows = produced
        .iter()
        .find_map(|(_, result)| match &result.output {
            StageOutput::Filter(filtered) => Some(filtered),
            _ => None,
        })
        .and_then(|filtered| filtered.get(BillColumn::Time));

    let statistics = match month_rows {
        Some(rows) => {
            trace!("Summarizing {} rows", rows.len());
            Statistics::summarize(rows)
        }
        None => Statistics::default(),
    };

    StageResult {
        delta: StateDelta {
            statistics: Some(statistics.clone()),
            ..StateDelta::default()
        },
        output: StageOutput::Statistics(statistics),
    }
}
