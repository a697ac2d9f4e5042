//! The CSV contract for importing and exporting both tables.
//!
//! Import is all or nothing: a wrong header or a single bad row rejects the whole text.

use crate::cache::Caches;
use crate::error::FormatError;
use crate::model::{Amount, Bill, Category, EntryType};
use crate::Result;
use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::str::FromStr;
use tracing::debug;

pub const BILL_HEADER: &str = "type,time,category,amount";
pub const CATEGORY_HEADER: &str = "id,type,name";

/// Parses bill CSV. Amounts go through the decimal cache. Parsed bills carry no id.
pub fn parse_bills(text: &str, caches: &mut Caches) -> Result<Vec<Bill>> {
    let rows = read_rows(text, BILL_HEADER)?;
    let mut bills = Vec::with_capacity(rows.len());
    for (line, record) in rows {
        let r#type = parse_type(&record[0], line)?;
        let amount = caches
            .decimals()
            .get(&record[3])
            .map_err(|e| FormatError::new(format!("Line {line}: invalid amount: {e}")))?;
        bills.push(Bill::new(r#type, &record[1], &record[2], Amount::new(amount)));
    }
    debug!("Parsed {} bills", bills.len());
    Ok(bills)
}

pub fn parse_categories(text: &str) -> Result<Vec<Category>> {
    let rows = read_rows(text, CATEGORY_HEADER)?;
    let categories = rows
        .into_iter()
        .map(|(line, record)| {
            let r#type = parse_type(&record[1], line)?;
            Ok(Category::new(&record[0], r#type, &record[2]))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Parsed {} categories", categories.len());
    Ok(categories)
}

/// Writes bills in import order. Ids are not part of the contract and are left out.
pub fn export_bills<'a>(bills: impl IntoIterator<Item = &'a Bill>) -> Result<String> {
    let rows = bills.into_iter().map(|b| {
        [
            b.r#type().to_string(),
            b.time().to_string(),
            b.category().to_string(),
            b.amount().to_string(),
        ]
    });
    write_rows(BILL_HEADER, rows)
}

pub fn export_categories<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Result<String> {
    let rows = categories.into_iter().map(|c| {
        [
            c.id().to_string(),
            c.r#type().to_string(),
            c.name().to_string(),
        ]
    });
    write_rows(CATEGORY_HEADER, rows)
}

/// Validates the header against `expected` exactly and returns each data row with its line
/// number.
fn read_rows(text: &str, expected: &str) -> Result<Vec<(usize, StringRecord)>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header = text.lines().next().unwrap_or_default().trim_end_matches('\r');
    if header != expected {
        return Err(FormatError::new(format!(
            "Expected the header '{expected}' but found '{header}'"
        ))
        .into());
    }

    let width = expected.split(',').count();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for (ix, record) in reader.records().enumerate() {
        let line = ix + 2;
        let record = record
            .map_err(|e| FormatError::new(format!("Line {line}: {e}")))
            .context("Unable to read CSV")?;
        if record.len() != width {
            return Err(FormatError::new(format!(
                "Line {line}: expected {width} fields but found {}",
                record.len()
            ))
            .into());
        }
        rows.push((line, record));
    }
    Ok(rows)
}

fn parse_type(s: &str, line: usize) -> Result<EntryType> {
    EntryType::from_str(s).map_err(|e| FormatError::new(format!("Line {line}: {e}")).into())
}

fn write_rows<const N: usize>(
    header: &str,
    rows: impl Iterator<Item = [String; N]>,
) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(header.split(','))
        .context("Unable to write CSV header")?;
    for row in rows {
        writer.write_record(&row).context("Unable to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV: {}", e.error()))?;
    let mut text = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{caches, SAMPLE_BILL_CSV, SAMPLE_CATEGORY_CSV};

    fn is_format_error(err: &anyhow::Error) -> bool {
        err.chain().any(|e| e.is::<FormatError>())
    }

    #[test]
    fn test_parse_bills() {
        let bills = parse_bills(SAMPLE_BILL_CSV, &mut caches()).unwrap();
        assert_eq!(bills.len(), 5);
        let first = &bills[0];
        assert_eq!(first.id(), "");
        assert_eq!(first.r#type(), EntryType::Expenditure);
        assert_eq!(first.time(), "1561910400000");
        assert_eq!(first.category(), "8s0p77c323");
        assert_eq!(first.amount().to_string(), "5400");
        assert_eq!(bills[4].r#type(), EntryType::Revenue);
        assert_eq!(bills[4].amount().to_string(), "-10000");
    }

    #[test]
    fn test_parse_bills_uses_decimal_cache() {
        let mut caches = caches();
        parse_bills(SAMPLE_BILL_CSV, &mut caches).unwrap();
        assert_eq!(caches.decimals().len(), 5);
    }

    #[test]
    fn test_parse_categories() {
        let categories = parse_categories(SAMPLE_CATEGORY_CSV).unwrap();
        assert_eq!(
            categories,
            vec![Category::new("1bcddudhmh", EntryType::Expenditure, "车贷")]
        );
    }

    #[test]
    fn test_header_with_bom_and_crlf() {
        let text = "\u{feff}id,type,name\r\nsalary,1,Salary\r\n";
        let categories = parse_categories(text).unwrap();
        assert_eq!(categories[0].name(), "Salary");
        assert_eq!(categories[0].r#type(), EntryType::Revenue);
    }

    #[test]
    fn test_wrong_header_is_format_error() {
        let err = parse_bills("time,type,category,amount\n", &mut caches()).unwrap_err();
        assert!(is_format_error(&err));
        let err = parse_categories("").unwrap_err();
        assert!(is_format_error(&err));
        let err = parse_categories(BILL_HEADER).unwrap_err();
        assert!(is_format_error(&err));
    }

    #[test]
    fn test_bad_row_rejects_everything() {
        let text = "type,time,category,amount\n0,1,a,5\n2,1,b,5";
        let err = parse_bills(text, &mut caches()).unwrap_err();
        assert!(is_format_error(&err));
        assert!(format!("{err:#}").contains("Line 3"));

        let text = "type,time,category,amount\n0,1,a,five";
        assert!(is_format_error(&parse_bills(text, &mut caches()).unwrap_err()));

        let text = "type,time,category,amount\n0,1,a";
        assert!(is_format_error(&parse_bills(text, &mut caches()).unwrap_err()));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_bills(BILL_HEADER, &mut caches()).unwrap().is_empty());
    }

    #[test]
    fn test_export_round_trip() {
        let mut caches = caches();
        let bills = parse_bills(SAMPLE_BILL_CSV, &mut caches).unwrap();
        let exported = export_bills(&bills).unwrap();
        assert!(!exported.ends_with('\n'));
        let again = parse_bills(&exported, &mut caches).unwrap();
        assert_eq!(again, bills);
        assert_eq!(exported, SAMPLE_BILL_CSV.trim_end());
    }

    #[test]
    fn test_export_keeps_amount_scale() {
        let mut caches = caches();
        let text = "type,time,category,amount\n1,1,a,12.50";
        let bills = parse_bills(text, &mut caches).unwrap();
        assert_eq!(export_bills(&bills).unwrap(), text);
    }

    #[test]
    fn test_export_categories_quotes_commas() {
        let categories = vec![Category::new("a", EntryType::Revenue, "Salary, bonus")];
        let exported = export_categories(&categories).unwrap();
        assert_eq!(exported, "id,type,name\na,1,\"Salary, bonus\"");
        assert_eq!(parse_categories(&exported).unwrap(), categories);
    }
}
