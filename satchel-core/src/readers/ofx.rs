//! Tag-based reader for the OFX/QFX family
//!
//! OFX content is a loosely-SGML stream of `<TAG>value` pairs; banks rarely
//! close value tags and vendor dialects add tags freely, so the reader
//! ignores anything it does not recognize. Transactions are `<STMTTRN>`
//! blocks; a block missing its date or amount is skipped and counted.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::readers::{parse_amount, ParseOutput, RawRecord};

/// Fields of one `<STMTTRN>` block as they accumulate
#[derive(Debug, Default)]
struct Block {
    date: Option<NaiveDate>,
    amount: Option<rust_decimal::Decimal>,
    name: Option<String>,
    memo: Option<String>,
    file_id: Option<String>,
    check_number: Option<String>,
}

impl Block {
    fn into_record(self) -> Option<RawRecord> {
        let mut record = RawRecord::new(self.date?, self.amount?);
        record.name = self.name.or(self.memo.clone()).unwrap_or_default();
        record.memo = self.memo;
        record.file_id = self.file_id;
        record.check_number = self.check_number;
        Some(record)
    }
}

/// Parse OFX/QFX text into intermediate records
///
/// OFX is a single-account format, so the output never references
/// file-internal accounts or categories.
pub fn parse(content: &str) -> Result<ParseOutput> {
    let mut output = ParseOutput::default();
    let mut block: Option<Block> = None;

    for (tag, value) in tags(content) {
        match tag {
            "STMTTRN" => {
                // An unterminated previous block counts as malformed
                if block.take().is_some() {
                    output.skipped += 1;
                }
                block = Some(Block::default());
            }
            "/STMTTRN" => {
                if let Some(b) = block.take() {
                    match b.into_record() {
                        Some(record) => output.records.push(record),
                        None => {
                            warn!("skipping OFX block with missing date or amount");
                            output.skipped += 1;
                        }
                    }
                }
            }
            _ => {
                let Some(b) = block.as_mut() else { continue };
                match tag {
                    "DTPOSTED" => b.date = parse_ofx_date(value),
                    "TRNAMT" => b.amount = parse_amount(value),
                    "NAME" | "PAYEE" => b.name = non_empty(value),
                    "MEMO" => b.memo = non_empty(value),
                    "FITID" => b.file_id = non_empty(value),
                    "CHECKNUM" => b.check_number = non_empty(value),
                    // Permissive by design: vendor dialects vary
                    _ => {}
                }
            }
        }
    }

    if output.records.is_empty() {
        return Err(Error::parse(format!(
            "no usable transactions found in OFX content ({} skipped)",
            output.skipped
        )));
    }

    Ok(output)
}

/// Iterate `<TAG>value` pairs; values run until the next `<`
fn tags(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.split('<').skip(1).filter_map(|chunk| {
        let (tag, rest) = chunk.split_once('>')?;
        Some((tag.trim(), rest.trim()))
    })
}

/// OFX dates are `YYYYMMDD` with optional time and timezone suffixes
/// (`20240115120000[0:GMT]`); only the first 8 digits matter here
fn parse_ofx_date(value: &str) -> Option<NaiveDate> {
    let digits: String = value.chars().take(8).collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").ok()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "OFXHEADER:100\nDATA:OFXSGML\n\n<OFX>\n<BANKMSGSRSV1>\n<STMTTRNRS>\n<STMTRS>\n<CURDEF>USD\n<BANKTRANLIST>\n<STMTTRN>\n<TRNTYPE>DEBIT\n<DTPOSTED>20240115120000[0:GMT]\n<TRNAMT>-50.00\n<FITID>2024011501\n<NAME>GROCERY STORE\n<MEMO>Weekly groceries\n</STMTTRN>\n<STMTTRN>\n<TRNTYPE>CREDIT\n<DTPOSTED>20240120\n<TRNAMT>1500.00\n<FITID>2024012001\n<NAME>EMPLOYER INC\n</STMTTRN>\n</BANKTRANLIST>\n</STMTRS>\n</STMTTRNRS>\n</BANKMSGSRSV1>\n</OFX>\n";

    #[test]
    fn test_parses_blocks_in_order() {
        let output = parse(SAMPLE).unwrap();
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.skipped, 0);

        let first = &output.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.amount, Decimal::new(-5000, 2));
        assert_eq!(first.name, "GROCERY STORE");
        assert_eq!(first.memo.as_deref(), Some("Weekly groceries"));
        assert_eq!(first.file_id.as_deref(), Some("2024011501"));

        assert_eq!(output.records[1].amount, Decimal::new(150000, 2));
    }

    #[test]
    fn test_block_missing_amount_is_skipped() {
        let content = "<OFX><BANKTRANLIST>\
            <STMTTRN><DTPOSTED>20240115<NAME>NO AMOUNT</STMTTRN>\
            <STMTTRN><DTPOSTED>20240116<TRNAMT>-9.99<NAME>OK</STMTTRN>\
            </BANKTRANLIST></OFX>";
        let output = parse(content).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.skipped, 1);
        assert_eq!(output.records[0].name, "OK");
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let content = "<STMTTRN><VENDORTAG>whatever<DTPOSTED>20240116\
            <TRNAMT>12.00<NAME>OK<CORRECTFITID>zzz</STMTTRN>";
        let output = parse(content).unwrap();
        assert_eq!(output.records.len(), 1);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        assert!(parse("").is_err());
        assert!(parse("<OFX></OFX>").is_err());
    }

    #[test]
    fn test_memo_stands_in_for_missing_name() {
        let content = "<STMTTRN><DTPOSTED>20240116<TRNAMT>12.00<MEMO>Transfer memo</STMTTRN>";
        let output = parse(content).unwrap();
        assert_eq!(output.records[0].name, "Transfer memo");
    }
}
