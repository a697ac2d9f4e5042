//! Read-only views of the ledger: the bill listing, month statistics and the filter options.

use crate::args::{ListArgs, StatsArgs};
use crate::commands::{open, Out};
use crate::filter::FilterSet;
use crate::model::{BillColumn, CategoriesIndex, EntryType};
use crate::pipeline::{Pagination, Statistics};
use crate::state::{Cashbook, Command};
use crate::{Config, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A bill as it is shown to the user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BillRow {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: EntryType,
    /// `YYYY-MM-DD` in the configured offset, or the raw time if it is not a timestamp.
    pub date: String,
    pub category: String,
    /// `None` when the category id is not in the categories table.
    pub category_name: Option<String>,
    pub amount: String,
}

/// One page of bills.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Listing {
    pub rows: Vec<BillRow>,
    pub pagination: Pagination,
    pub page_count: usize,
}

/// Lists one page of bills after applying the month, category and type filters.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Listing>> {
    let mut cashbook = open(&config).await?;
    if let Some(per_page) = args.per_page() {
        cashbook.dispatch(Command::SetPerPage(per_page));
    }
    apply_filters(&mut cashbook, args.filters());
    let state = cashbook.dispatch(Command::SetPagination(args.page()));

    let index = state.categories_index();
    let rows: Vec<BillRow> = state
        .display()
        .iter()
        .map(|bill| BillRow {
            id: bill.id().to_string(),
            r#type: bill.r#type(),
            date: format_date(bill.time(), config.utc_offset()),
            category: bill.category().to_string(),
            category_name: category_name(index, bill.category()),
            amount: bill.amount().to_string(),
        })
        .collect();
    let pagination = *state.pagination();
    let page_count = pagination.page_count();

    Ok(Out::new(
        format!(
            "Showing {} of {} bills, page {} of {}",
            rows.len(),
            pagination.total(),
            pagination.current() + 1,
            page_count.max(1)
        ),
        Listing {
            rows,
            pagination,
            page_count,
        },
    ))
}

/// Totals the given month. The category only narrows the listing, never the totals.
pub async fn stats(config: Config, args: StatsArgs) -> Result<Out<Statistics>> {
    let mut cashbook = open(&config).await?;
    let mut filters = vec![(BillColumn::Time, args.month().to_string())];
    if let Some(category) = args.category() {
        filters.push((BillColumn::Category, category.to_string()));
    }
    apply_filters(&mut cashbook, filters);
    let statistics = cashbook.state().statistics().clone();

    let [expenditure, revenue] = statistics.revenue();
    Ok(Out::new(
        format!(
            "{}: expenditure {expenditure}, revenue {revenue}",
            args.month()
        ),
        statistics,
    ))
}

/// Every value that can be filtered on, with the number of bills carrying it.
pub async fn filters(config: Config) -> Result<Out<FilterSet>> {
    let cashbook = open(&config).await?;
    let filter_set = cashbook.state().filter_set().clone();
    let months = filter_set.column(BillColumn::Time).len();
    let categories = filter_set.column(BillColumn::Category).len();
    Ok(Out::new(
        format!("{months} months and {categories} categories"),
        filter_set,
    ))
}

fn apply_filters(cashbook: &mut Cashbook, filters: Vec<(BillColumn, String)>) {
    for (column, value) in filters {
        cashbook.dispatch(Command::SetFilter { column, value });
    }
}

fn category_name(index: &CategoriesIndex, id: &str) -> Option<String> {
    index.name(id).map(str::to_string)
}

fn format_date(millis: &str, offset: FixedOffset) -> String {
    millis
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&offset).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ImportArgs, TableName};
    use crate::commands::import;
    use crate::test::{TestEnv, SAMPLE_BILL_CSV, SAMPLE_CATEGORY_CSV};

    async fn loaded() -> TestEnv {
        let env = TestEnv::new().await;
        let bill = env.write_file("bill.csv", SAMPLE_BILL_CSV).await;
        let categories = env.write_file("c.csv", SAMPLE_CATEGORY_CSV).await;
        import(env.config(), ImportArgs::new(TableName::Categories, &categories))
            .await
            .unwrap();
        import(env.config(), ImportArgs::new(TableName::Bill, &bill))
            .await
            .unwrap();
        env
    }

    #[test]
    fn test_format_date() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(format_date("1561910400000", offset), "2019-07-01");
        assert_eq!(format_date("soon", offset), "soon");
    }

    #[tokio::test]
    async fn test_list_page() {
        let env = loaded().await;
        let args = ListArgs::new(Some("2019-07".to_string()), None, None, 1, Some(3));
        let out = list(env.config(), args).await.unwrap();
        let listing = out.structure().unwrap();
        assert_eq!(listing.pagination.total(), 4);
        assert_eq!(listing.pagination.current(), 1);
        assert_eq!(listing.page_count, 2);
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.rows[0].category, "bsn20th0k2o");
        assert_eq!(listing.rows[0].date, "2019-07-31");
    }

    #[tokio::test]
    async fn test_list_out_of_range_page() {
        let env = loaded().await;
        let args = ListArgs::new(None, None, None, 10, Some(1));
        let listing = list(env.config(), args).await.unwrap().structure().unwrap().clone();
        assert_eq!(listing.pagination.current(), 0);
        assert_eq!(listing.rows[0].category, "8s0p77c323");
        assert_eq!(listing.rows[0].category_name, None);
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let env = loaded().await;
        let args = ListArgs::new(None, None, Some(EntryType::Revenue), 0, None);
        let listing = list(env.config(), args).await.unwrap().structure().unwrap().clone();
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.rows[0].amount, "-10000");
    }

    #[tokio::test]
    async fn test_stats() {
        let env = loaded().await;
        let out = stats(env.config(), StatsArgs::new("2019-07", None))
            .await
            .unwrap();
        let statistics = out.structure().unwrap();
        assert!(statistics.show());
        assert_eq!(statistics.revenue(), &["12700".to_string(), "0".to_string()]);
        assert_eq!(statistics.expenditure()[0].category, "0fnhbcle6hg");

        let narrowed = stats(
            env.config(),
            StatsArgs::new("2019-07", Some("8s0p77c323".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(narrowed.structure(), out.structure());
    }

    #[tokio::test]
    async fn test_filters() {
        let env = loaded().await;
        let out = filters(env.config()).await.unwrap();
        let set = out.structure().unwrap();
        assert_eq!(set.count(BillColumn::Time, "2019-07"), Some(4));
        assert_eq!(set.count(BillColumn::Time, "2019-12"), Some(1));
        assert_eq!(out.message(), "2 months and 5 categories");
    }
}
