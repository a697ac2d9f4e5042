//! The cashbook state, the commands that change it and the transition between snapshots.

use crate::cache::Caches;
use crate::filter::{FilterConfig, FilterSet, Filters};
use crate::generate::{self, GenerateOptions};
use crate::model::{Bill, BillColumn, BillTable, CategoriesIndex, Category, Snapshot};
use crate::pipeline::{self, Delta, Pagination, StageCache, StageResult, StageType, Statistics};
use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Settings that shape a cashbook but are not part of its data.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Settings {
    /// Rows per page.
    pub per_page: usize,
    /// The offset used to group bill times into months.
    pub utc_offset: FixedOffset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            per_page: 20,
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// One immutable version of everything the user sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbookState {
    pub(crate) bill: BillTable,
    pub(crate) categories: Vec<Category>,
    pub(crate) categories_index: CategoriesIndex,
    pub(crate) filter_config: FilterConfig,
    pub(crate) filter_set: FilterSet,
    pub(crate) filters: Filters,
    pub(crate) pagination: Pagination,
    /// The current page of filtered rows.
    pub(crate) display: BillTable,
    pub(crate) statistics: Statistics,
    #[serde(skip)]
    pub(crate) stages: StageCache,
}

impl CashbookState {
    /// An empty ledger. The derived views have not been computed yet.
    pub fn new(settings: Settings) -> Self {
        Self {
            bill: Vec::new(),
            categories: Vec::new(),
            categories_index: CategoriesIndex::default(),
            filter_config: FilterConfig::default(),
            filter_set: FilterSet::default(),
            filters: Filters::default(),
            pagination: Pagination::new(settings.per_page),
            display: Vec::new(),
            statistics: Statistics::default(),
            stages: StageCache::default(),
        }
    }

    pub fn bill(&self) -> &BillTable {
        &self.bill
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn categories_index(&self) -> &CategoriesIndex {
        &self.categories_index
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter_config
    }

    pub fn filter_set(&self) -> &FilterSet {
        &self.filter_set
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn display(&self) -> &BillTable {
        &self.display
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// The cached result of the last run of `stage`.
    pub fn stage_result(&self, stage: StageType) -> Option<&StageResult> {
        self.stages.get(stage)
    }

    /// Copies both tables out for persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bill: self.bill.iter().map(|b| Bill::clone(b)).collect(),
            categories: self.categories.clone(),
        }
    }
}

/// Which table an import or addition targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Bill(Vec<Bill>),
    Categories(Vec<Category>),
}

/// A single new row.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Bill(Bill),
    Category(Category),
}

/// Every way the state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace everything with freshly loaded tables.
    Init(Snapshot),
    /// Append a batch of rows.
    Import(Table),
    /// Append one row.
    Add(Record),
    /// Remove the bill with the same id.
    Remove(Bill),
    SetFilter { column: BillColumn, value: String },
    RemoveFilter(BillColumn),
    /// Go to a zero based page.
    SetPagination(usize),
    SetPerPage(usize),
    /// Recompute statistics without touching the display.
    RefreshStatistics,
    /// Append synthetic bills for load testing.
    Generate(GenerateOptions),
}

/// Produces the snapshot that follows `state` once `command` is applied.
///
/// `state` is never modified. Each command enters the pipeline at exactly one point.
pub fn transition(state: &CashbookState, command: Command, caches: &mut Caches) -> CashbookState {
    match command {
        Command::Init(snapshot) => {
            caches.reset();
            let mut next = CashbookState {
                filter_config: state.filter_config.clone(),
                pagination: Pagination::new(state.pagination.per_page),
                ..CashbookState::new(Settings::default())
            };
            next.categories = snapshot.categories;
            next.categories_index = CategoriesIndex::build(&next.categories);
            let rows = assign_ids(snapshot.bill, caches);
            next.bill = rows.clone();
            debug!("Loaded {} bills and {} categories", next.bill.len(), next.categories.len());
            pipeline::run(next, StageType::InitFilter, Some(&Delta::Add(rows)), caches)
        }

        Command::Import(Table::Bill(rows)) => add_bills(state, rows, caches),
        Command::Add(Record::Bill(bill)) => add_bills(state, vec![bill], caches),
        Command::Generate(options) => {
            let rows = generate::bills(&state.categories, &options);
            add_bills(state, rows, caches)
        }

        Command::Import(Table::Categories(rows)) => add_categories(state, rows, caches),
        Command::Add(Record::Category(category)) => add_categories(state, vec![category], caches),

        Command::Remove(bill) => {
            let Some(ix) = state.bill.iter().position(|b| b.id == bill.id) else {
                warn!("There is no bill with id '{}' to remove", bill.id);
                return state.clone();
            };
            let mut next = state.clone();
            let removed = next.bill.remove(ix);
            pipeline::run(next, StageType::InitFilter, Some(&Delta::Remove(vec![removed])), caches)
        }

        Command::SetFilter { column, value } => {
            let mut next = state.clone();
            next.filters.set(column, value);
            pipeline::run(next, StageType::Filter, None, caches)
        }

        Command::RemoveFilter(column) => {
            let mut next = state.clone();
            next.filters.remove(column);
            pipeline::run(next, StageType::Filter, None, caches)
        }

        Command::SetPagination(page) => {
            let mut next = state.clone();
            next.pagination.current = page;
            pipeline::run(next, StageType::Pagination, None, caches)
        }

        Command::SetPerPage(per_page) => {
            let mut next = state.clone();
            next.pagination.per_page = per_page.max(1);
            pipeline::run(next, StageType::Pagination, None, caches)
        }

        Command::RefreshStatistics => {
            pipeline::run(state.clone(), StageType::Statistics, None, caches)
        }
    }
}

/// Gives every row an unused id, records its amount in the decimal cache and wraps it for sharing.
fn assign_ids(rows: Vec<Bill>, caches: &mut Caches) -> BillTable {
    rows.into_iter()
        .map(|mut bill| {
            caches.decimals().remember(bill.amount());
            let id = caches.ids().assign(&bill.id);
            if id != bill.id && !bill.id.is_empty() {
                debug!("Bill id '{}' is already used, assigned '{id}' instead", bill.id);
            }
            bill.id = id;
            Arc::new(bill)
        })
        .collect()
}

fn add_bills(state: &CashbookState, rows: Vec<Bill>, caches: &mut Caches) -> CashbookState {
    let rows = assign_ids(rows, caches);
    let mut next = state.clone();
    next.bill.extend(rows.iter().cloned());
    debug!("Added {} bills, the ledger now has {}", rows.len(), next.bill.len());
    pipeline::run(next, StageType::InitFilter, Some(&Delta::Add(rows)), caches)
}

/// Categories change no bill row, so only the statistics entry point is needed.
fn add_categories(
    state: &CashbookState,
    rows: Vec<Category>,
    caches: &mut Caches,
) -> CashbookState {
    let mut next = state.clone();
    next.categories.extend(rows);
    next.categories_index = CategoriesIndex::build(&next.categories);
    pipeline::run(next, StageType::Statistics, None, caches)
}

/// Owns the current snapshot and the caches that belong to it.
#[derive(Debug, Clone)]
pub struct Cashbook {
    state: Arc<CashbookState>,
    caches: Caches,
}

impl Cashbook {
    /// An empty cashbook with all derived views computed.
    pub fn new(settings: Settings) -> Self {
        let mut caches = Caches::new(settings.utc_offset);
        let state = pipeline::run(
            CashbookState::new(settings),
            StageType::InitFilter,
            None,
            &mut caches,
        );
        Self {
            state: Arc::new(state),
            caches,
        }
    }

    /// A cashbook holding `snapshot`.
    pub fn load(settings: Settings, snapshot: Snapshot) -> Self {
        let mut cashbook = Self::new(settings);
        cashbook.dispatch(Command::Init(snapshot));
        cashbook
    }

    pub fn state(&self) -> &CashbookState {
        &self.state
    }

    /// The current snapshot. It stays valid and unchanged after later dispatches.
    pub fn snapshot_state(&self) -> Arc<CashbookState> {
        Arc::clone(&self.state)
    }

    /// Applies `command` and makes the resulting snapshot current.
    pub fn dispatch(&mut self, command: Command) -> &CashbookState {
        let next = transition(&self.state, command, &mut self.caches);
        self.state = Arc::new(next);
        &self.state
    }

    pub fn caches(&mut self) -> &mut Caches {
        &mut self.caches
    }

    /// Empties the ledger and forgets every cached value.
    pub fn reset(&mut self) {
        self.dispatch(Command::Init(Snapshot::default()));
    }
}
