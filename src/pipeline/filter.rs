use super::{StageOutput, StageResult, StateDelta};
use crate::cache::Caches;
use crate::filter::{FilterResult, FILTER_ORDER};
use crate::model::BillTable;
use crate::state::CashbookState;
use tracing::trace;

/// Narrows the whole ledger column by column. Each intermediate table is kept in the output.
pub(super) fn apply(state: &CashbookState, caches: &mut Caches) -> StageResult {
    let config = &state.filter_config;
    let mut result = FilterResult::default();
    let mut table: BillTable = state.bill.clone();

    for column in FILTER_ORDER {
        let Some(wanted) = state.filters.get(column) else {
            continue;
        };
        table = table
            .into_iter()
            .filter(|bill| config.transformed(column, bill, caches).as_deref() == Some(wanted))
            .collect();
        trace!("{} rows match {column} = {wanted}", table.len());
        result.insert(column, table.clone());
    }

    StageResult {
        delta: StateDelta {
            display: Some(table),
            ..StateDelta::default()
        },
        output: StageOutput::Filter(result),
    }
}
