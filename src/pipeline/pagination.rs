use super::{StageOutput, StageResult, StateDelta};
use crate::model::BillTable;
use crate::state::CashbookState;
use serde::{Deserialize, Serialize};

/// Which page of the filtered rows is displayed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Zero based page index.
    pub(crate) current: usize,
    pub(crate) per_page: usize,
    /// Number of rows after filtering, recomputed on every pagination pass.
    pub(crate) total: usize,
}

impl Pagination {
    /// A page size of zero is raised to one.
    pub fn new(per_page: usize) -> Self {
        Self {
            current: 0,
            per_page: per_page.max(1),
            total: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// The number of pages needed to show `total` rows.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Slices the filtered rows in `state.display` down to the current page, falling back to the
/// first page when the current one is out of range.
pub(super) fn apply(state: &CashbookState) -> StageResult {
    let rows = &state.display;
    let mut pagination = Pagination {
        total: rows.len(),
        ..state.pagination
    };

    let mut start = pagination.current.saturating_mul(pagination.per_page);
    if start >= rows.len() {
        pagination.current = 0;
        start = 0;
    }
    let end = start.saturating_add(pagination.per_page).min(rows.len());
    let page: BillTable = rows[start..end].to_vec();

    StageResult {
        delta: StateDelta {
            display: Some(page.clone()),
            pagination: Some(pagination),
            ..StateDelta::default()
        },
        output: StageOutput::Page(page),
    }
}
