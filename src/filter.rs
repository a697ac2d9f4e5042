//! Column filtering: which columns can be filtered, how raw values are grouped, the histogram of
//! available values and the user's current selection.

use crate::cache::Caches;
use crate::model::{Bill, BillColumn, BillTable};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// The order in which column filters are applied and the filter set is built.
pub const FILTER_ORDER: [BillColumn; 3] =
    [BillColumn::Time, BillColumn::Category, BillColumn::Type];

/// Converts a raw column value into the value that is grouped and filtered on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Epoch milliseconds to `YYYY-MM` in the configured offset.
    Month,
}

/// Per-column filtering settings.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Whether the column contributes to the filter set.
    pub active: bool,
    /// `None` means the raw value is used as is.
    pub transform: Option<Transform>,
}

impl ColumnConfig {
    pub const fn active(transform: Option<Transform>) -> Self {
        Self {
            active: true,
            transform,
        }
    }

    pub const fn inactive() -> Self {
        Self {
            active: false,
            transform: None,
        }
    }
}

/// Filtering settings for all bill columns.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    columns: BTreeMap<BillColumn, ColumnConfig>,
}

impl Default for FilterConfig {
    /// Time (grouped by month) and category are active. Id, amount and type are reserved.
    fn default() -> Self {
        let columns = BillColumn::ALL
            .iter()
            .map(|&column| (column, ColumnConfig::inactive()))
            .collect();
        Self { columns }
            .with_column(BillColumn::Time, ColumnConfig::active(Some(Transform::Month)))
            .with_column(BillColumn::Category, ColumnConfig::active(None))
    }
}

impl FilterConfig {
    /// Replaces the settings of `column`.
    ///
    /// # Panics
    /// Panics if `column` is `time`, active and has no transform. Raw timestamps are never a
    /// meaningful filter value, so such a config is a programming error.
    pub fn with_column(mut self, column: BillColumn, config: ColumnConfig) -> Self {
        assert!(
            !(column == BillColumn::Time && config.active && config.transform.is_none()),
            "The active time column requires a transform"
        );
        self.columns.insert(column, config);
        self
    }

    pub fn column(&self, column: BillColumn) -> ColumnConfig {
        self.columns.get(&column).copied().unwrap_or_default()
    }

    pub fn is_active(&self, column: BillColumn) -> bool {
        self.column(column).active
    }

    /// The value of `column` for `bill` after its transform. `None` when the transform cannot be
    /// applied to the raw value.
    pub fn transformed<'a>(
        &self,
        column: BillColumn,
        bill: &'a Bill,
        caches: &'a mut Caches,
    ) -> Option<Cow<'a, str>> {
        match self.column(column).transform {
            None => Some(bill.raw(column)),
            Some(Transform::Month) => caches.months().month(bill.time()).map(Cow::Borrowed),
        }
    }
}

/// One selectable value of a column and the number of ledger rows that carry it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub count: usize,
}

/// The options of one column in first-seen order, with an index for constant time lookup.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnOptions {
    options: Vec<FilterOption>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ColumnOptions {
    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    pub fn count(&self, value: &str) -> Option<usize> {
        self.index.get(value).map(|&ix| self.options[ix].count)
    }

    fn increment(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&ix) => self.options[ix].count += 1,
            None => {
                self.index.insert(value.to_string(), self.options.len());
                self.options.push(FilterOption {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Counts stop at zero and the option is kept.
    fn decrement(&mut self, value: &str) {
        if let Some(&ix) = self.index.get(value) {
            let option = &mut self.options[ix];
            option.count = option.count.saturating_sub(1);
        }
    }
}

/// For each column, the distinct transformed values seen in the ledger with live counts.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FilterSet {
    columns: BTreeMap<BillColumn, ColumnOptions>,
}

impl Default for FilterSet {
    fn default() -> Self {
        let columns = BillColumn::ALL
            .iter()
            .map(|&column| (column, ColumnOptions::default()))
            .collect();
        Self { columns }
    }
}

impl FilterSet {
    pub fn column(&self, column: BillColumn) -> &[FilterOption] {
        self.columns
            .get(&column)
            .map(|c| c.options())
            .unwrap_or_default()
    }

    /// The count recorded for `value` in `column`, `None` if the value was never seen.
    pub fn count(&self, column: BillColumn, value: &str) -> Option<usize> {
        self.columns.get(&column).and_then(|c| c.count(value))
    }

    pub(crate) fn increment(&mut self, column: BillColumn, value: &str) {
        self.columns.entry(column).or_default().increment(value)
    }

    pub(crate) fn decrement(&mut self, column: BillColumn, value: &str) {
        if let Some(options) = self.columns.get_mut(&column) {
            options.decrement(value)
        }
    }
}

/// The currently selected transformed value per column. A missing column is unconstrained.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<BillColumn, String>);

impl Filters {
    pub fn get(&self, column: BillColumn) -> Option<&str> {
        self.0.get(&column).map(|s| s.as_str())
    }

    pub fn set(&mut self, column: BillColumn, value: impl Into<String>) {
        self.0.insert(column, value.into());
    }

    pub fn remove(&mut self, column: BillColumn) -> Option<String> {
        self.0.remove(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The rows left after each applied column filter, keyed by the column that narrowed them.
/// Only columns with an active filter are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterResult(BTreeMap<BillColumn, BillTable>);

impl FilterResult {
    pub fn get(&self, column: BillColumn) -> Option<&BillTable> {
        self.0.get(&column)
    }

    pub(crate) fn insert(&mut self, column: BillColumn, table: BillTable) {
        self.0.insert(column, table);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
