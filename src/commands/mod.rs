//! Command handlers for the cashbook CLI.
//!
//! Every handler loads the stored tables into a `Cashbook`, dispatches commands to it and saves
//! the tables again if they changed.

mod delete;
mod import;
mod init;
mod insert;
mod query;

use crate::error::{ErrorType, IntoResult};
use crate::state::Cashbook;
use crate::store::Storage;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use delete::remove;
pub use import::{export, import, ImportSummary};
pub use init::init;
pub use insert::{add_bill, add_category, generate};
pub use query::{filters, list, stats, BillRow, Listing};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            match serde_json::to_string_pretty(structure) {
                Ok(json) => println!("{json}"),
                Err(e) => debug!("Unable to serialize command output: {e}"),
            }
        }
    }
}

/// Loads the stored tables into a cashbook.
async fn open(config: &Config) -> Result<Cashbook> {
    let snapshot = config
        .store()
        .load()
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Cashbook::load(config.settings(), snapshot))
}

/// Writes both tables of `cashbook` back to storage.
async fn save(config: &Config, cashbook: &Cashbook) -> Result<()> {
    config
        .store()
        .save(&cashbook.state().snapshot())
        .await
        .pub_result(ErrorType::Storage)
}
