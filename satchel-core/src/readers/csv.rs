//! Delimited-text reader
//!
//! Two passes. The preview pass needs no mapping: it returns the header row
//! plus a handful of sample values per column so the user can assign
//! columns to fields. The full pass requires a resolved mapping (field
//! assignment, delimiter, date format) and emits one record per data row,
//! iterating rows rather than materializing the whole file as an
//! intermediate structure.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::warn;

use crate::domain::mapping::{CsvHeader, ResolvedCsv};
use crate::domain::result::{Error, Result};
use crate::readers::{parse_amount, ParseOutput, RawRecord};

/// Sample rows read during preview; keeps inspection cheap on large files
pub const SAMPLE_ROWS: usize = 5;

/// Preview pass: headers plus up to [`SAMPLE_ROWS`] sample values per column
///
/// The delimiter is not known yet at preview time, so it is sniffed from
/// the header row.
pub fn preview(content: &str) -> Result<Vec<CsvHeader>> {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.trim().is_empty() {
        return Err(Error::parse("CSV content has no header row"));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(sniff_delimiter(first_line))
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Vec<CsvHeader> = reader
        .headers()
        .map_err(|e| Error::parse(format!("unreadable CSV header row: {e}")))?
        .iter()
        .map(|h| CsvHeader {
            header: h.trim().to_string(),
            samples: Vec::new(),
        })
        .collect();

    for result in reader.records().take(SAMPLE_ROWS) {
        let Ok(row) = result else { continue };
        for (i, header) in headers.iter_mut().enumerate() {
            if let Some(value) = row.get(i) {
                let value = value.trim();
                if !value.is_empty() {
                    header.samples.push(value.to_string());
                }
            }
        }
    }

    Ok(headers)
}

/// Full pass: one record per data row, using the resolved field assignment
pub fn parse(content: &str, csv: &ResolvedCsv) -> Result<ParseOutput> {
    let mut reader = ReaderBuilder::new()
        .delimiter(csv.settings.delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::parse(format!("unreadable CSV header row: {e}")))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    // The resolver already verified these assignments against the preview;
    // a mismatch here means the file changed between inspect and import
    let date_idx = column(&csv.date)
        .ok_or_else(|| Error::config(format!("date column '{}' not found", csv.date)))?;
    let amount_idx = column(&csv.amount)
        .ok_or_else(|| Error::config(format!("amount column '{}' not found", csv.amount)))?;
    let name_idx = csv.name.as_deref().and_then(column);
    let check_idx = csv.check_number.as_deref().and_then(column);

    let mut output = ParseOutput::default();

    for result in reader.records() {
        let Ok(row) = result else {
            output.skipped += 1;
            continue;
        };

        let date = row
            .get(date_idx)
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), &csv.settings.date_format).ok());
        let amount = row.get(amount_idx).and_then(parse_amount);

        let (Some(date), Some(amount)) = (date, amount) else {
            warn!("skipping CSV row with unparsable date or amount");
            output.skipped += 1;
            continue;
        };

        let mut record = RawRecord::new(date, amount);
        if let Some(i) = name_idx {
            record.name = row.get(i).unwrap_or("").trim().to_string();
        }
        record.check_number = check_idx
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        output.records.push(record);
    }

    if output.records.is_empty() {
        return Err(Error::parse(format!(
            "no usable transactions found in CSV content ({} skipped)",
            output.skipped
        )));
    }

    Ok(output)
}

/// Pick the most frequent candidate delimiter in the header row; comma wins
/// ties
fn sniff_delimiter(first_line: &str) -> u8 {
    [b'|', b'\t', b';', b',']
        .into_iter()
        .max_by_key(|d| first_line.bytes().filter(|b| b == d).count())
        .unwrap_or(b',')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::CsvSettings;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "Date,Amount,Description,Check Number,Balance\n\
        01/15/2024,-42.17,CORNER CAFE,,958.21\n\
        01/16/2024,-130.00,ELECTRIC CO,1042,828.21\n\
        01/20/2024,\"1,500.00\",EMPLOYER INC,,2328.21\n";

    fn resolved() -> ResolvedCsv {
        ResolvedCsv {
            date: "Date".to_string(),
            amount: "Amount".to_string(),
            name: Some("Description".to_string()),
            check_number: Some("Check Number".to_string()),
            settings: CsvSettings::default(),
        }
    }

    #[test]
    fn test_preview_headers_and_samples() {
        let headers = preview(SAMPLE).unwrap();
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[0].header, "Date");
        assert_eq!(headers[0].samples.len(), 3);
        // Empty cells never become samples
        assert_eq!(headers[3].samples, vec!["1042"]);
    }

    #[test]
    fn test_preview_caps_samples_per_column() {
        let mut content = String::from("Date,Amount\n");
        for day in 1..=9 {
            content.push_str(&format!("01/0{day}/2024,-1.00\n"));
        }
        let headers = preview(&content).unwrap();
        assert_eq!(headers[0].samples.len(), SAMPLE_ROWS);
    }

    #[test]
    fn test_preview_rejects_empty_content() {
        assert!(preview("").is_err());
        assert!(preview("\n\n").is_err());
    }

    #[test]
    fn test_full_parse() {
        let output = parse(SAMPLE, &resolved()).unwrap();
        assert_eq!(output.records.len(), 3);

        let first = &output.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.amount, Decimal::new(-4217, 2));
        assert_eq!(first.name, "CORNER CAFE");
        assert!(first.check_number.is_none());

        assert_eq!(output.records[1].check_number.as_deref(), Some("1042"));
        assert_eq!(output.records[2].amount, Decimal::new(150000, 2));
    }

    #[test]
    fn test_semicolon_delimiter_and_eu_dates() {
        let content = "Datum;Betrag;Name\n15.01.2024;-42.17;KAUFHAUS\n";
        let mut csv = ResolvedCsv {
            date: "Datum".to_string(),
            amount: "Betrag".to_string(),
            name: Some("Name".to_string()),
            check_number: None,
            settings: CsvSettings {
                delimiter: ';',
                date_format: "%d.%m.%Y".to_string(),
            },
        };
        let output = parse(content, &csv).unwrap();
        assert_eq!(
            output.records[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(output.records[0].amount, Decimal::new(-4217, 2));

        // Preview sniffs the same delimiter without settings
        let headers = preview(content).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[1].header, "Betrag");

        csv.date = "Missing".to_string();
        assert!(parse(content, &csv).is_err());
    }

    #[test]
    fn test_decimal_comma_amount_is_skipped_not_scaled() {
        let content = "Datum;Betrag\n15.01.2024;-42,17\n16.01.2024;-3.50\n";
        let csv = ResolvedCsv {
            date: "Datum".to_string(),
            amount: "Betrag".to_string(),
            name: None,
            check_number: None,
            settings: CsvSettings {
                delimiter: ';',
                date_format: "%d.%m.%Y".to_string(),
            },
        };
        let output = parse(content, &csv).unwrap();
        // `-42,17` must not come back as `-4217`; the row is unparsable
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].amount, Decimal::new(-350, 2));
        assert_eq!(output.skipped, 1);
    }

    #[test]
    fn test_malformed_rows_are_counted_not_fatal() {
        let content = "Date,Amount\nnot-a-date,-1.00\n01/16/2024,oops\n01/17/2024,-2.00\n";
        let output = parse(content, &resolved_minimal()).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.skipped, 2);
    }

    fn resolved_minimal() -> ResolvedCsv {
        ResolvedCsv {
            date: "Date".to_string(),
            amount: "Amount".to_string(),
            name: None,
            check_number: None,
            settings: CsvSettings::default(),
        }
    }
}
