use crate::models::sanitize::{clean_text, parse_date, parse_lenient};
use crate::models::RawInvoiceEntry;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;

/// One row of an invoice spreadsheet, as text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvInvoiceRow {
    invoice_number: Option<String>,
    client: Option<String>,
    issue_date: Option<String>,
    declared_weight_kg: Option<String>,
    invoice_value: Option<String>,
}

impl From<CsvInvoiceRow> for RawInvoiceEntry {
    fn from(row: CsvInvoiceRow) -> Self {
        Self {
            invoice_number: row.invoice_number.as_deref().and_then(clean_text),
            client: row.client.as_deref().and_then(clean_text),
            issue_date: row.issue_date.as_deref().and_then(parse_date),
            declared_weight_kg: row.declared_weight_kg.as_deref().map_or(0.0, parse_lenient),
            invoice_value: row.invoice_value.as_deref().map_or(0.0, parse_lenient),
        }
    }
}

/// Reads invoice entries from a CSV document with a header row.
///
/// Columns are matched by name (`invoice_number`, `client`, `issue_date`,
/// `declared_weight_kg`, `invoice_value`); unknown columns are ignored and
/// missing ones default. Text stays text until the sanitize gate sees it, so
/// invoice numbers keep their leading zeros.
pub fn read_entries<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawInvoiceEntry>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    reader
        .deserialize::<CsvInvoiceRow>()
        .map(|row| row.map(RawInvoiceEntry::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reads_named_columns_in_any_order() {
        let csv = "\
client;declared_weight_kg;invoice_number;issue_date;invoice_value;carrier
ACME;1250.5;000417;2024-05-02;15000;ignored
 Globex ; abc ;000418;02/05/2024;;ignored
";
        let entries = read_entries(csv.as_bytes(), b';').unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].client.as_deref(), Some("ACME"));
        assert_eq!(entries[0].invoice_number.as_deref(), Some("000417"));
        assert_eq!(entries[0].declared_weight_kg, 1250.5);
        assert_eq!(entries[0].invoice_value, 15000.0);
        assert_eq!(entries[0].issue_date, NaiveDate::from_ymd_opt(2024, 5, 2));

        assert_eq!(entries[1].client.as_deref(), Some("Globex"));
        assert_eq!(entries[1].declared_weight_kg, 0.0);
        assert_eq!(entries[1].invoice_value, 0.0);
        assert_eq!(entries[1].issue_date, None);
    }

    #[test]
    fn missing_columns_default() {
        let entries = read_entries("declared_weight_kg\n40\n60\n".as_bytes(), b',').unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].declared_weight_kg, 60.0);
        assert_eq!(entries[1].client, None);
    }

    #[test]
    fn header_only_document_yields_nothing() {
        let entries = read_entries("invoice_number,declared_weight_kg\n".as_bytes(), b',').unwrap();
        assert!(entries.is_empty());
    }
}
