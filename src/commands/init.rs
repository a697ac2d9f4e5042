use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and an initial `config.json` with default settings.
///
/// # Arguments
/// - `cashbook_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/cashbook`
///
/// # Errors
/// - Returns an error if any file operations fail or the directory is already initialized.
pub async fn init(cashbook_home: &Path) -> Result<Out<()>> {
    let config = Config::create(cashbook_home)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the cashbook directory at {}",
        config.root().display()
    )
    .into())
}
