//! Import and export of CSV tables.

use crate::args::{ExportArgs, ImportArgs, TableName};
use crate::commands::{open, save, Out};
use crate::error::{ErrorType, IntoResult};
use crate::import::{export_bills, export_categories, parse_bills, parse_categories};
use crate::state::{Command, Table};
use crate::store::Storage;
use crate::{utils, Config, Result};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// What an import added.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ImportSummary {
    pub table: TableName,
    /// Rows read from the file
    pub imported: usize,
    /// Rows in the table afterwards
    pub total: usize,
}

/// Reads a CSV table and appends its rows. A file that breaks the CSV contract is rejected as a
/// whole and nothing is saved.
pub async fn import(config: Config, args: ImportArgs) -> Result<Out<ImportSummary>> {
    let text = utils::read(args.file()).await.pub_result(ErrorType::Input)?;
    let mut cashbook = open(&config).await?;

    let (command, imported) = match args.table() {
        TableName::Bill => {
            let rows = parse_bills(&text, cashbook.caches()).pub_result(ErrorType::Format)?;
            let n = rows.len();
            (Command::Import(Table::Bill(rows)), n)
        }
        TableName::Categories => {
            let rows = parse_categories(&text).pub_result(ErrorType::Format)?;
            let n = rows.len();
            (Command::Import(Table::Categories(rows)), n)
        }
    };

    let state = cashbook.dispatch(command);
    let total = match args.table() {
        TableName::Bill => state.bill().len(),
        TableName::Categories => state.categories().len(),
    };
    save(&config, &cashbook).await?;

    Ok(Out::new(
        format!(
            "Imported {imported} rows into the {} table from {}",
            args.table(),
            args.file().display()
        ),
        ImportSummary {
            table: args.table(),
            imported,
            total,
        },
    ))
}

/// Writes a table as CSV to `--file`, or to stdout.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<()>> {
    let snapshot = config
        .store()
        .load()
        .await
        .pub_result(ErrorType::Storage)?;
    let (text, rows) = match args.table() {
        TableName::Bill => (export_bills(&snapshot.bill)?, snapshot.bill.len()),
        TableName::Categories => (
            export_categories(&snapshot.categories)?,
            snapshot.categories.len(),
        ),
    };

    match args.file() {
        Some(path) => {
            utils::write(path, &text).await.pub_result(ErrorType::Input)?;
            Ok(format!("Exported {rows} rows to {}", path.display()).into())
        }
        None => {
            debug!("Writing {} bytes of CSV to stdout", text.len());
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
            Ok(format!("Exported {rows} rows").into())
        }
    }
}
