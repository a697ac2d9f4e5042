use crate::model::Amount;
use anyhow::{bail, Context};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An ordered collection of bills. Rows are shared between snapshots, so cloning a table never
/// copies the bills themselves.
pub type BillTable = Vec<Arc<Bill>>;

/// Whether money went out or came in. Stored as `0` or `1` in both tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EntryType {
    #[default]
    Expenditure,
    Revenue,
}

impl EntryType {
    /// The position of this type in the `revenue` totals of the statistics.
    pub fn index(self) -> usize {
        match self {
            EntryType::Expenditure => 0,
            EntryType::Revenue => 1,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EntryType::Expenditure => "0",
            EntryType::Revenue => "1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryType::Expenditure => "expenditure",
            EntryType::Revenue => "revenue",
        }
    }
}

impl TryFrom<u8> for EntryType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryType::Expenditure),
            1 => Ok(EntryType::Revenue),
            bad => Err(format!("Invalid type '{bad}', expected 0 or 1")),
        }
    }
}

impl From<EntryType> for u8 {
    fn from(value: EntryType) -> Self {
        value.index() as u8
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid type '{s}', expected 0 or 1"))?;
        EntryType::try_from(n)
    }
}

/// Represents one ledger entry.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Bill {
    /// Unique within the ledger. Empty until the bill is dispatched into a cashbook.
    #[serde(default)]
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) r#type: EntryType,
    /// Epoch milliseconds, kept as the text it was imported with.
    pub(crate) time: String,
    /// The id of a `Category`.
    pub(crate) category: String,
    pub(crate) amount: Amount,
}

impl Bill {
    /// Creates a bill without an id. One is assigned when the bill is added to a cashbook.
    pub fn new(
        r#type: EntryType,
        time: impl Into<String>,
        category: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            id: String::new(),
            r#type,
            time: time.into(),
            category: category.into(),
            amount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn r#type(&self) -> EntryType {
        self.r#type
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The untransformed value of `column` as text.
    pub fn raw(&self, column: BillColumn) -> Cow<'_, str> {
        match column {
            BillColumn::Id => Cow::Borrowed(&self.id),
            BillColumn::Type => Cow::Borrowed(self.r#type.as_str()),
            BillColumn::Time => Cow::Borrowed(&self.time),
            BillColumn::Category => Cow::Borrowed(&self.category),
            BillColumn::Amount => Cow::Owned(self.amount.to_string()),
        }
    }
}

/// Represents the columns of the bill table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillColumn {
    Id,
    Type,
    Time,
    Category,
    Amount,
}

serde_plain::derive_display_from_serialize!(BillColumn);
serde_plain::derive_fromstr_from_deserialize!(BillColumn);

impl BillColumn {
    pub const ALL: [BillColumn; 5] = [
        BillColumn::Id,
        BillColumn::Type,
        BillColumn::Time,
        BillColumn::Category,
        BillColumn::Amount,
    ];
}

/// Converts user entered time, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, into epoch milliseconds in the
/// given offset.
pub fn parse_entry_time(s: &str, offset: FixedOffset) -> crate::Result<String> {
    let s = s.trim();
    let naive = match s.len() {
        16 => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .with_context(|| format!("Unable to parse '{s}' as YYYY-MM-DD HH:MM"))?,
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Unable to parse '{s}' as YYYY-MM-DD"))?
            .and_hms_opt(0, 0, 0)
            .context("Midnight should always exist")?,
        _ => bail!("The time '{s}' must look like YYYY-MM-DD or YYYY-MM-DD HH:MM"),
    };
    let local = offset
        .from_local_datetime(&naive)
        .single()
        .with_context(|| format!("The time '{s}' is ambiguous in offset {offset}"))?;
    Ok(local.timestamp_millis().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn beijing() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_entry_type_serde() {
        assert_eq!(serde_json::to_string(&EntryType::Revenue).unwrap(), "1");
        let t: EntryType = serde_json::from_str("0").unwrap();
        assert_eq!(t, EntryType::Expenditure);
        assert!(serde_json::from_str::<EntryType>("2").is_err());
    }

    #[test]
    fn test_entry_type_from_str() {
        assert_eq!(EntryType::from_str(" 1").unwrap(), EntryType::Revenue);
        assert!(EntryType::from_str("x").is_err());
    }

    #[test]
    fn test_bill_json_with_numeric_fields() {
        let json = r#"{"id":"abc","type":0,"time":"1561910400000","category":"8s0p77c323","amount":5400}"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.id(), "abc");
        assert_eq!(bill.r#type(), EntryType::Expenditure);
        assert_eq!(bill.amount().to_string(), "5400");
    }

    #[test]
    fn test_bill_json_without_id() {
        let json = r#"{"type":1,"time":"1","category":"c","amount":"1.5"}"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.id(), "");
    }

    #[test]
    fn test_raw_values() {
        let bill = Bill::new(
            EntryType::Revenue,
            "1561910400000",
            "food",
            Amount::from_str("12.50").unwrap(),
        )
        .with_id("x");
        assert_eq!(bill.raw(BillColumn::Id), "x");
        assert_eq!(bill.raw(BillColumn::Type), "1");
        assert_eq!(bill.raw(BillColumn::Time), "1561910400000");
        assert_eq!(bill.raw(BillColumn::Category), "food");
        assert_eq!(bill.raw(BillColumn::Amount), "12.50");
    }

    #[test]
    fn test_column_names() {
        assert_eq!(BillColumn::Category.to_string(), "category");
        assert_eq!(BillColumn::from_str("time").unwrap(), BillColumn::Time);
        assert!(BillColumn::from_str("month").is_err());
    }

    #[test]
    fn test_parse_entry_time_date() {
        let millis = parse_entry_time("2019-07-01", beijing()).unwrap();
        assert_eq!(millis, "1561910400000");
    }

    #[test]
    fn test_parse_entry_time_minutes() {
        let millis = parse_entry_time("2019-07-01 08:30", beijing()).unwrap();
        assert_eq!(millis, (1561910400000_i64 + 8 * 3_600_000 + 30 * 60_000).to_string());
    }

    #[test]
    fn test_parse_entry_time_rejects_other_shapes() {
        assert!(parse_entry_time("2019-7-1", beijing()).is_err());
        assert!(parse_entry_time("2019-02-30", beijing()).is_err());
    }
}
