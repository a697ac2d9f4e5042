//! The staged derivation of display, filter options and statistics from the ledger.
//!
//! A mutation enters the chain at one of four entry points. Stages in front of the entry point
//! are replayed from the result they cached the last time they ran, stages from the entry point
//! onward are recomputed. Every stage returns a partial state update, which is merged into the
//! running snapshot before the next stage runs, and an output that later stages of the same run
//! may read.

mod filter;
mod init_filter;
mod pagination;
mod statistics;

pub use pagination::Pagination;
pub use statistics::{CategoryAmount, Statistics};

use crate::cache::Caches;
use crate::filter::{FilterResult, FilterSet};
use crate::model::BillTable;
use crate::state::CashbookState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// The stages of the pipeline, which are also its entry points.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    /// Maintains the filter set from a batch of added or removed rows.
    InitFilter,
    /// Narrows the ledger by the selected filters.
    Filter,
    /// Cuts the filtered rows down to one page.
    Pagination,
    /// Totals the rows of the selected month.
    Statistics,
}

serde_plain::derive_display_from_serialize!(StageType);
serde_plain::derive_fromstr_from_deserialize!(StageType);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Step {
    Run(StageType),
    Replay(StageType),
}

impl StageType {
    fn chain(self) -> &'static [Step] {
        use StageType::*;
        use Step::*;
        match self {
            InitFilter => &[
                Run(InitFilter),
                Run(Filter),
                Run(Pagination),
                Run(Statistics),
            ],
            Filter => &[
                Replay(InitFilter),
                Run(Filter),
                Run(Pagination),
                Run(Statistics),
            ],
            // Page changes never move the totals, so statistics are left as they are.
            Pagination => &[Replay(Filter), Run(Pagination)],
            Statistics => &[Replay(Filter), Replay(Pagination), Run(Statistics)],
        }
    }
}

/// A batch of rows that entered or left the ledger, fed to the `InitFilter` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Add(BillTable),
    Remove(BillTable),
}

/// The part of the state a stage changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub filter_set: Option<FilterSet>,
    pub display: Option<BillTable>,
    pub pagination: Option<Pagination>,
    pub statistics: Option<Statistics>,
}

impl StateDelta {
    fn apply_to(&self, state: &mut CashbookState) {
        if let Some(filter_set) = &self.filter_set {
            state.filter_set = filter_set.clone();
        }
        if let Some(display) = &self.display {
            state.display = display.clone();
        }
        if let Some(pagination) = &self.pagination {
            state.pagination = *pagination;
        }
        if let Some(statistics) = &self.statistics {
            state.statistics = statistics.clone();
        }
    }
}

/// What a stage hands to the stages after it.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    FilterSet(FilterSet),
    Filter(FilterResult),
    Page(BillTable),
    Statistics(Statistics),
}

/// The state update and output of one stage run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub delta: StateDelta,
    pub output: StageOutput,
}

/// The last result of each stage type, used to replay stages in front of an entry point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageCache {
    results: BTreeMap<StageType, Arc<StageResult>>,
}

impl StageCache {
    pub fn get(&self, stage: StageType) -> Option<&StageResult> {
        self.results.get(&stage).map(|r| r.as_ref())
    }

    fn get_shared(&self, stage: StageType) -> Option<Arc<StageResult>> {
        self.results.get(&stage).cloned()
    }

    fn insert(&mut self, stage: StageType, result: Arc<StageResult>) {
        self.results.insert(stage, result);
    }
}

/// Results produced so far in the current run, in chain order.
type Produced = Vec<(StageType, Arc<StageResult>)>;

/// Runs the chain of `entry` over `state` and returns the settled snapshot.
///
/// `delta` is only read by the `InitFilter` stage.
pub(crate) fn run(
    mut state: CashbookState,
    entry: StageType,
    delta: Option<&Delta>,
    caches: &mut Caches,
) -> CashbookState {
    debug!("Running pipeline from {entry}");
    let mut produced: Produced = Vec::with_capacity(4);

    for step in entry.chain() {
        let (stage, result) = match *step {
            Step::Run(stage) => (
                stage,
                Arc::new(run_stage(stage, &state, &produced, delta, caches)),
            ),
            Step::Replay(stage) => match state.stages.get_shared(stage) {
                Some(result) => {
                    trace!("Replaying cached {stage} result");
                    (stage, result)
                }
                None => {
                    debug!("No cached {stage} result to replay, running it instead");
                    (stage, Arc::new(run_stage(stage, &state, &produced, None, caches)))
                }
            },
        };
        result.delta.apply_to(&mut state);
        produced.push((stage, result));
    }

    for (stage, result) in produced {
        state.stages.insert(stage, result);
    }
    state
}

fn run_stage(
    stage: StageType,
    state: &CashbookState,
    produced: &Produced,
    delta: Option<&Delta>,
    caches: &mut Caches,
) -> StageResult {
    trace!("Running {stage}");
    match stage {
        StageType::InitFilter => init_filter::apply(state, delta, caches),
        StageType::Filter => filter::apply(state, caches),
        StageType::Pagination => pagination::apply(state),
        StageType::Statistics => statistics::apply(produced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chains() {
        use StageType::*;
        use Step::*;
        assert_eq!(InitFilter.chain().len(), 4);
        assert!(InitFilter.chain().iter().all(|s| matches!(s, Run(_))));
        assert_eq!(Filter.chain()[0], Replay(InitFilter));
        assert_eq!(Pagination.chain(), &[Replay(Filter), Run(Pagination)]);
        assert_eq!(
            Statistics.chain(),
            &[Replay(Filter), Replay(Pagination), Run(Statistics)]
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(StageType::InitFilter.to_string(), "init_filter");
        assert_eq!(
            "pagination".parse::<StageType>().unwrap(),
            StageType::Pagination
        );
    }
}
