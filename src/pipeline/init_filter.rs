use super::{Delta, StageOutput, StageResult, StateDelta};
use crate::cache::Caches;
use crate::filter::FILTER_ORDER;
use crate::model::BillColumn;
use crate::state::CashbookState;
use tracing::debug;

/// Updates the filter set with the rows in `delta` only. The rest of the ledger is not scanned.
pub(super) fn apply(
    state: &CashbookState,
    delta: Option<&Delta>,
    caches: &mut Caches,
) -> StageResult {
    let config = &state.filter_config;
    let mut filter_set = state.filter_set.clone();

    if let Some(delta) = delta {
        let (rows, adding) = match delta {
            Delta::Add(rows) => (rows, true),
            Delta::Remove(rows) => (rows, false),
        };
        let columns: Vec<BillColumn> = FILTER_ORDER
            .into_iter()
            .filter(|&column| config.is_active(column))
            .collect();

        for bill in rows {
            for &column in &columns {
                let value = match config.transformed(column, bill, caches) {
                    Some(value) if !value.is_empty() => value,
                    _ => continue,
                };
                if adding {
                    filter_set.increment(column, &value);
                } else {
                    filter_set.decrement(column, &value);
                }
            }
        }
        debug!(
            "Filter set {} {} rows",
            if adding { "added" } else { "removed" },
            rows.len()
        );
    }

    StageResult {
        delta: StateDelta {
            filter_set: Some(filter_set.clone()),
            ..StateDelta::default()
        },
        output: StageOutput::FilterSet(filter_set),
    }
}
