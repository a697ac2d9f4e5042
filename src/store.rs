//! Persistence of the two tables. Nothing here runs inside the pipeline: the CLI loads a snapshot
//! before dispatching and saves one afterwards.

use crate::model::{Bill, Category, Snapshot};
use crate::{utils, Result};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const BILL_JSON: &str = "bill.json";
pub const CATEGORIES_JSON: &str = "categories.json";

/// Loads and saves both tables of a cashbook.
#[async_trait::async_trait]
pub trait Storage {
    /// Missing tables load as empty.
    async fn load(&self) -> Result<Snapshot>;

    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Keeps each table as a JSON array in its own file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    bill_path: PathBuf,
    categories_path: PathBuf,
}

impl JsonStore {
    /// A store for the tables in `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            bill_path: dir.join(BILL_JSON),
            categories_path: dir.join(CATEGORIES_JSON),
        }
    }

    pub fn bill_path(&self) -> &Path {
        &self.bill_path
    }

    pub fn categories_path(&self) -> &Path {
        &self.categories_path
    }
}

#[async_trait::async_trait]
impl Storage for JsonStore {
    async fn load(&self) -> Result<Snapshot> {
        let bill: Vec<Bill> = load_table(&self.bill_path).await?;
        let categories: Vec<Category> = load_table(&self.categories_path).await?;
        debug!(
            "Loaded {} bills and {} categories from storage",
            bill.len(),
            categories.len()
        );
        Ok(Snapshot { bill, categories })
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        utils::serialize(&self.bill_path, &snapshot.bill)
            .await
            .context("Unable to save the bill table")?;
        utils::serialize(&self.categories_path, &snapshot.categories)
            .await
            .context("Unable to save the categories table")?;
        debug!(
            "Saved {} bills and {} categories",
            snapshot.bill.len(),
            snapshot.categories.len()
        );
        Ok(())
    }
}

async fn load_table<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    match utils::read_optional(path).await? {
        None => Ok(Vec::new()),
        Some(content) => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON file at {}", path.display())),
    }
}
