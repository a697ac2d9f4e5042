//! These structs provide the CLI interface for the cashbook CLI.

use crate::model::{BillColumn, EntryType};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// cashbook: A command-line ledger of bills and categories.
///
/// Import bill and category tables from CSV, add and remove bills, then list them by month and
/// category, page through them and see revenue and expenditure totals for a month.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and its configuration file.
    ///
    /// By default the data directory is $HOME/cashbook. Pass --cashbook-home or set
    /// CASHBOOK_HOME to put it somewhere else.
    Init,
    /// Import a CSV table. The header must be exactly `type,time,category,amount` for bills or
    /// `id,type,name` for categories. Nothing is imported if any row is invalid.
    Import(ImportArgs),
    /// Write a table as CSV, to stdout unless --file is given.
    Export(ExportArgs),
    /// Add a single bill or category.
    #[command(subcommand)]
    Add(AddSubcommand),
    /// Remove the bill with the given id.
    Remove(RemoveArgs),
    /// List one page of bills, optionally narrowed by month, category and type.
    List(ListArgs),
    /// Show revenue and expenditure totals for a month.
    Stats(StatsArgs),
    /// Show the values that can be filtered on, with the number of bills for each.
    Filters,
    /// Add randomly generated bills, for trying things out at scale.
    Generate(GenerateArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where cashbook data and configuration is held. Defaults to ~/cashbook
    #[arg(long, env = "CASHBOOK_HOME", default_value_t = default_cashbook_home())]
    cashbook_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, cashbook_home: PathBuf) -> Self {
        Self {
            log_level,
            cashbook_home: cashbook_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn cashbook_home(&self) -> &DisplayPath {
        &self.cashbook_home
    }
}

/// The two tables of a cashbook.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    #[default]
    Bill,
    Categories,
}

serde_plain::derive_display_from_serialize!(TableName);
serde_plain::derive_fromstr_from_deserialize!(TableName);

/// (Not shown): Args for the `cashbook import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// Which table the file holds.
    table: TableName,

    /// The CSV file to import.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(table: TableName, file: impl Into<PathBuf>) -> Self {
        Self {
            table,
            file: file.into(),
        }
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// (Not shown): Args for the `cashbook export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Which table to write.
    table: TableName,

    /// Write the CSV here instead of stdout.
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(table: TableName, file: Option<PathBuf>) -> Self {
        Self { table, file }
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddSubcommand {
    /// Add a bill.
    Bill(AddBillArgs),
    /// Add a category.
    Category(AddCategoryArgs),
}

/// (Not shown): Args for the `cashbook add bill` command.
#[derive(Debug, Parser, Clone)]
pub struct AddBillArgs {
    /// 0 for expenditure, 1 for revenue.
    #[arg(long = "type", value_parser = parse_entry_type)]
    entry_type: EntryType,

    /// When the bill happened, as YYYY-MM-DD or "YYYY-MM-DD HH:MM" in the configured offset.
    #[arg(long)]
    time: String,

    /// The id of the bill's category.
    #[arg(long)]
    category: String,

    /// The amount, e.g. 5400 or 12.50.
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    /// Use this id instead of a generated one. It is replaced if it is already taken.
    #[arg(long)]
    id: Option<String>,
}

impl AddBillArgs {
    pub fn new(
        r#type: EntryType,
        time: impl Into<String>,
        category: impl Into<String>,
        amount: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        Self {
            entry_type: r#type,
            time: time.into(),
            category: category.into(),
            amount: amount.into(),
            id,
        }
    }

    pub fn r#type(&self) -> EntryType {
        self.entry_type
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// (Not shown): Args for the `cashbook add category` command.
#[derive(Debug, Parser, Clone)]
pub struct AddCategoryArgs {
    #[arg(long)]
    id: String,

    /// 0 for expenditure, 1 for revenue.
    #[arg(long = "type", value_parser = parse_entry_type)]
    entry_type: EntryType,

    #[arg(long)]
    name: String,
}

impl AddCategoryArgs {
    pub fn new(id: impl Into<String>, r#type: EntryType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entry_type: r#type,
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn r#type(&self) -> EntryType {
        self.entry_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// (Not shown): Args for the `cashbook remove` command.
#[derive(Debug, Parser, Clone)]
pub struct RemoveArgs {
    /// The id of the bill to remove.
    id: String,
}

impl RemoveArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `cashbook list` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ListArgs {
    /// Only bills in this month, e.g. 2019-07.
    #[arg(long)]
    month: Option<String>,

    /// Only bills with this category id.
    #[arg(long)]
    category: Option<String>,

    /// Only expenditure (0) or revenue (1).
    #[arg(long = "type", value_parser = parse_entry_type)]
    entry_type: Option<EntryType>,

    /// Zero based page number. An out of range page shows the first page.
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Rows per page. Defaults to per_page in config.json.
    #[arg(long)]
    per_page: Option<usize>,
}

impl ListArgs {
    pub fn new(
        month: Option<String>,
        category: Option<String>,
        r#type: Option<EntryType>,
        page: usize,
        per_page: Option<usize>,
    ) -> Self {
        Self {
            month,
            category,
            entry_type: r#type,
            page,
            per_page,
        }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn r#type(&self) -> Option<EntryType> {
        self.entry_type
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> Option<usize> {
        self.per_page
    }

    /// The column filters these arguments select, in the order they are applied.
    pub fn filters(&self) -> Vec<(BillColumn, String)> {
        let mut filters = Vec::new();
        if let Some(month) = self.month() {
            filters.push((BillColumn::Time, month.to_string()));
        }
        if let Some(category) = self.category() {
            filters.push((BillColumn::Category, category.to_string()));
        }
        if let Some(r#type) = self.entry_type {
            filters.push((BillColumn::Type, r#type.to_string()));
        }
        filters
    }
}

/// (Not shown): Args for the `cashbook stats` command.
#[derive(Debug, Parser, Clone)]
pub struct StatsArgs {
    /// The month to total, e.g. 2019-07.
    #[arg(long)]
    month: String,

    /// Also narrow the listing by category. The totals always cover the whole month.
    #[arg(long)]
    category: Option<String>,
}

impl StatsArgs {
    pub fn new(month: impl Into<String>, category: Option<String>) -> Self {
        Self {
            month: month.into(),
            category,
        }
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// (Not shown): Args for the `cashbook generate` command.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// How many bills to add.
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Seed for the random generator, for repeatable output.
    #[arg(long)]
    seed: Option<u64>,
}

impl GenerateArgs {
    pub fn new(count: usize, seed: Option<u64>) -> Self {
        Self { count, seed }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    EntryType::from_str(s)
}

fn default_cashbook_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cashbook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --cashbook-home or CASHBOOK_HOME instead of relying on the \
                default cashbook home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("cashbook")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_bill() {
        let args = Args::try_parse_from([
            "cashbook",
            "--cashbook-home",
            "/tmp/cb",
            "add",
            "bill",
            "--type",
            "1",
            "--time",
            "2019-12-26",
            "--category",
            "1vjj47vpd28",
            "--amount",
            "-10000",
        ])
        .unwrap();
        assert_eq!(args.common().cashbook_home().path(), Path::new("/tmp/cb"));
        let Command::Add(AddSubcommand::Bill(bill)) = args.command() else {
            panic!("expected add bill, got {:?}", args.command());
        };
        assert_eq!(bill.r#type(), EntryType::Revenue);
        assert_eq!(bill.amount(), "-10000");
        assert_eq!(bill.id(), None);
    }

    #[test]
    fn test_parse_bad_type() {
        let result = Args::try_parse_from([
            "cashbook", "add", "category", "--id", "a", "--type", "3", "--name", "A",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_filters_in_order() {
        let args = Args::try_parse_from([
            "cashbook",
            "list",
            "--type",
            "0",
            "--category",
            "c",
            "--month",
            "2019-07",
        ])
        .unwrap();
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        assert_eq!(
            list.filters(),
            vec![
                (BillColumn::Time, "2019-07".to_string()),
                (BillColumn::Category, "c".to_string()),
                (BillColumn::Type, "0".to_string()),
            ]
        );
        assert_eq!(list.page(), 0);
        assert_eq!(list.per_page(), None);
    }

    #[test]
    fn test_table_names() {
        let args = Args::try_parse_from(["cashbook", "import", "categories", "c.csv"]).unwrap();
        let Command::Import(import) = args.command() else {
            panic!("expected import");
        };
        assert_eq!(import.table(), TableName::Categories);
        assert_eq!(import.file(), Path::new("c.csv"));
        assert_eq!(TableName::Bill.to_string(), "bill");
    }
}
