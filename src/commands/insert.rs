//! Insert command handlers.

use crate::args::{AddBillArgs, AddCategoryArgs, GenerateArgs};
use crate::cache::Caches;
use crate::commands::{open, save, Out};
use crate::error::{ErrorType, IntoResult};
use crate::generate::GenerateOptions;
use crate::model::{parse_entry_time, Amount, Bill, Category};
use crate::state::{Command, Record};
use crate::{Config, Result};
use anyhow::{ensure, Context};
use tracing::warn;

/// Adds one bill and saves the ledger.
///
/// `time` is parsed in the configured offset. If `id` is missing or already taken a unique one is
/// generated. The stored bill, with its final id, is returned.
///
/// # Errors
///
/// - Returns an error if the time, amount or category cannot be used.
/// - Returns an error if the tables cannot be loaded or saved.
pub async fn add_bill(config: Config, args: AddBillArgs) -> Result<Out<Bill>> {
    let mut cashbook = open(&config).await?;
    let bill = bill_from_args(&config, &args, cashbook.caches()).pub_result(ErrorType::Input)?;
    if cashbook.state().categories_index().get(bill.category()).is_none() {
        warn!("The category '{}' is not known", bill.category());
    }

    let state = cashbook.dispatch(Command::Add(Record::Bill(bill)));
    let stored = state
        .bill()
        .last()
        .map(|b| Bill::clone(b))
        .context("The added bill is missing from the ledger")?;
    save(&config, &cashbook).await?;

    Ok(Out::new(
        format!("Added bill '{}'", stored.id()),
        stored,
    ))
}

fn bill_from_args(config: &Config, args: &AddBillArgs, caches: &mut Caches) -> Result<Bill> {
    ensure!(!args.category().trim().is_empty(), "A category is required");
    let time = parse_entry_time(args.time(), config.utc_offset())?;
    let amount = caches
        .decimals()
        .get(args.amount())
        .with_context(|| format!("Unable to parse the amount '{}'", args.amount()))?;
    let bill = Bill::new(args.r#type(), time, args.category().trim(), Amount::new(amount));
    Ok(match args.id() {
        Some(id) => bill.with_id(id),
        None => bill,
    })
}

/// Adds one category and saves the tables. A category with an existing id replaces the old one
/// in lookups.
pub async fn add_category(config: Config, args: AddCategoryArgs) -> Result<Out<Category>> {
    ensure!(!args.id().is_empty(), "A category id is required");
    let category = Category::new(args.id(), args.r#type(), args.name());
    let mut cashbook = open(&config).await?;
    if cashbook.state().categories_index().get(category.id()).is_some() {
        warn!("A category with id '{}' already exists", category.id());
    }

    cashbook.dispatch(Command::Add(Record::Category(category.clone())));
    save(&config, &cashbook).await?;

    Ok(Out::new(
        format!("Added category '{}'", category.name()),
        category,
    ))
}

/// Adds randomly generated bills and saves the ledger. Returns the number of bills afterwards.
pub async fn generate(config: Config, args: GenerateArgs) -> Result<Out<usize>> {
    let mut options = GenerateOptions::new(args.count());
    options.seed = args.seed();
    let mut cashbook = open(&config).await?;
    let total = cashbook.dispatch(Command::Generate(options)).bill().len();
    save(&config, &cashbook).await?;

    Ok(Out::new(
        format!("Generated {} bills, the ledger has {total}", args.count()),
        total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryType;
    use crate::store::Storage;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_bill() {
        let env = TestEnv::new().await;
        let args = AddBillArgs::new(
            EntryType::Expenditure,
            "2019-07-01",
            "8s0p77c323",
            "5400",
            Some("foo".to_string()),
        );
        let out = add_bill(env.config(), args.clone()).await.unwrap();
        let bill = out.structure().unwrap();
        assert_eq!(bill.id(), "foo");
        assert_eq!(bill.time(), "1561910400000");

        // The id is taken now, so the second bill gets a new one
        let out = add_bill(env.config(), args).await.unwrap();
        assert_ne!(out.structure().unwrap().id(), "foo");

        let snapshot = env.config().store().load().await.unwrap();
        assert_eq!(snapshot.bill.len(), 2);
    }

    #[tokio::test]
    async fn test_add_bill_amount_goes_through_decimal_cache() {
        let env = TestEnv::new().await;
        let config = env.config();
        let args = AddBillArgs::new(EntryType::Expenditure, "2019-07-01", "c", "12.50", None);
        let mut caches = crate::test::caches();
        let bill = bill_from_args(&config, &args, &mut caches).unwrap();
        assert_eq!(bill.amount().to_string(), "12.50");
        assert_eq!(caches.decimals().len(), 1);

        bill_from_args(&config, &args, &mut caches).unwrap();
        assert_eq!(caches.decimals().len(), 1);
    }

    #[tokio::test]
    async fn test_add_bill_bad_input() {
        let env = TestEnv::new().await;
        for (time, amount) in [("07/01/2019", "1"), ("2019-07-01", "lots")] {
            let args = AddBillArgs::new(EntryType::Revenue, time, "c", amount, None);
            let err = add_bill(env.config(), args).await.unwrap_err();
            assert_eq!(err.to_string(), "input error");
        }
        assert!(!env.config().store().bill_path().exists());
    }

    #[tokio::test]
    async fn test_add_category() {
        let env = TestEnv::new().await;
        let args = AddCategoryArgs::new("salary", EntryType::Revenue, "Salary");
        add_category(env.config(), args).await.unwrap();
        let snapshot = env.config().store().load().await.unwrap();
        assert_eq!(
            snapshot.categories,
            vec![Category::new("salary", EntryType::Revenue, "Salary")]
        );
    }

    #[tokio::test]
    async fn test_generate() {
        let env = TestEnv::new().await;
        let out = generate(env.config(), GenerateArgs::new(250, Some(5)))
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&250));
        let snapshot = env.config().store().load().await.unwrap();
        assert_eq!(snapshot.bill.len(), 250);
    }
}
