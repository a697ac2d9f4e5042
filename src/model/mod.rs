//! Types that represent the core data model, such as `Bill` and `Category`.
mod amount;
mod bill;
mod category;

pub use amount::{Amount, AmountError};
pub(crate) use amount::parse_decimal;
pub use bill::{parse_entry_time, Bill, BillColumn, BillTable, EntryType};
pub use category::{CategoriesIndex, Category, CategoryEntry};
use serde::{Deserialize, Serialize};

/// Represents both persisted tables of a cashbook.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Snapshot {
    /// Rows of the bill table.
    pub bill: Vec<Bill>,
    /// Rows of the categories table.
    pub categories: Vec<Category>,
}
