//! Line-based reader for QIF
//!
//! QIF files are divided into sections. An `!Account` header opens an
//! account block that names the account owning the transaction sections
//! that follow; `!Type:...` headers open transaction sections. Within a
//! section, field-coded lines accumulate into one record until a `^`
//! terminator. A single file may carry several account sections, so the
//! reader tracks the current account line by line and attaches it to each
//! record, and collects the distinct account names and category paths seen
//! anywhere in the file for the mapping step.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::readers::{parse_amount, ParseOutput, RawRecord};

#[derive(Debug, Default)]
struct Fields {
    date: Option<NaiveDate>,
    amount: Option<Decimal>,
    payee: Option<String>,
    category: Option<String>,
    check_number: Option<String>,
    memo: Option<String>,
}

impl Fields {
    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.payee.is_none()
            && self.category.is_none()
            && self.check_number.is_none()
            && self.memo.is_none()
    }
}

/// Parse QIF text into intermediate records plus the account/category
/// vocabulary referenced across the whole file
pub fn parse(content: &str) -> Result<ParseOutput> {
    let mut output = ParseOutput::default();

    let mut in_account_block = false;
    let mut pending_account: Option<String> = None;
    let mut current_account: Option<String> = None;
    let mut fields = Fields::default();

    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('!') {
            in_account_block = header.trim().eq_ignore_ascii_case("Account");
            pending_account = None;
            continue;
        }

        let mut chars = line.chars();
        let code = chars.next().unwrap_or('^');
        let value = chars.as_str().trim();

        if in_account_block {
            match code {
                'N' => pending_account = Some(value.to_string()),
                '^' => {
                    if let Some(name) = pending_account.take() {
                        output.note_account(&name);
                        current_account = Some(name);
                    }
                }
                // Account type, description, limits - not needed for mapping
                _ => {}
            }
            continue;
        }

        match code {
            'D' => fields.date = parse_qif_date(value),
            'T' | '$' | 'U' => fields.amount = parse_amount(value),
            'P' => fields.payee = Some(value.to_string()),
            'L' => {
                output.note_category(value);
                fields.category = Some(value.to_string());
            }
            'N' => fields.check_number = Some(value.to_string()),
            'M' => fields.memo = Some(value.to_string()),
            '^' => {
                let done = std::mem::take(&mut fields);
                match (done.date, done.amount) {
                    (Some(date), Some(amount)) => {
                        let mut record = RawRecord::new(date, amount);
                        record.name = done.payee.unwrap_or_default();
                        record.memo = done.memo;
                        record.category = done.category;
                        record.check_number = done.check_number;
                        record.account_name = current_account.clone();
                        output.records.push(record);
                    }
                    _ if done.is_empty() => {} // stray terminator
                    _ => {
                        warn!("skipping QIF record with missing date or amount");
                        output.skipped += 1;
                    }
                }
            }
            // Cleared status, address lines, split codes on write - ignored
            _ => {}
        }
    }

    if output.records.is_empty() {
        return Err(Error::parse(format!(
            "no usable transactions found in QIF content ({} skipped)",
            output.skipped
        )));
    }

    Ok(output)
}

/// QIF dates show up as `M/D/YYYY`, `M/D/YY`, `M-D-YYYY` and the Quicken
/// prime form `M/D'YY` (apostrophe marks a year from 2000 on)
fn parse_qif_date(value: &str) -> Option<NaiveDate> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.replace('-', "/");

    let normalized = match cleaned.split_once('\'') {
        Some((md, yy)) => {
            let year = 2000 + yy.parse::<i32>().ok()?;
            format!("{md}/{year}")
        }
        None => cleaned,
    };

    for fmt in ["%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_ACCOUNT: &str = "!Type:Bank\n\
        D1/15/2024\nT-42.17\nPCORNER CAFE\nLFood:Dining Out\n^\n\
        D1/16'24\nT-130.00\nPELECTRIC CO\nLUtilities\nN1042\n^\n\
        D1/20/2024\nT1500.00\nPEMPLOYER INC\n^\n";

    const MULTI_ACCOUNT: &str = "!Account\nNChecking\nTBank\n^\n\
        !Type:Bank\n\
        D2/01/2024\nT-25.00\nPGROCER\nLFood:Groceries\n^\n\
        D2/02/2024\nT-500.00\nPTRANSFER\nL[Savings]\n^\n\
        !Account\nNSavings\nTBank\n^\n\
        !Type:Bank\n\
        D2/02/2024\nT500.00\nPTRANSFER\nL[Checking]\n^\n";

    #[test]
    fn test_single_account_file() {
        let output = parse(SINGLE_ACCOUNT).unwrap();
        assert_eq!(output.records.len(), 3);
        assert_eq!(output.skipped, 0);
        assert!(output.accounts.is_empty());

        let first = &output.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.amount, Decimal::new(-4217, 2));
        assert_eq!(first.name, "CORNER CAFE");
        assert_eq!(first.category.as_deref(), Some("Food:Dining Out"));
        assert!(first.account_name.is_none());

        // Prime-form year
        assert_eq!(
            output.records[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
        assert_eq!(output.records[1].check_number.as_deref(), Some("1042"));
    }

    #[test]
    fn test_multi_account_context_tracking() {
        let output = parse(MULTI_ACCOUNT).unwrap();
        assert_eq!(output.records.len(), 3);
        assert_eq!(output.accounts, vec!["Checking", "Savings"]);
        assert_eq!(
            output.categories,
            vec!["Food:Groceries", "[Savings]", "[Checking]"]
        );

        assert_eq!(output.records[0].account_name.as_deref(), Some("Checking"));
        assert_eq!(output.records[1].account_name.as_deref(), Some("Checking"));
        assert_eq!(output.records[2].account_name.as_deref(), Some("Savings"));
    }

    #[test]
    fn test_record_missing_date_is_skipped() {
        let content = "!Type:Bank\nT-10.00\nPNO DATE\n^\nD3/01/2024\nT-1.00\nPOK\n^\n";
        let output = parse(content).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.skipped, 1);
    }

    #[test]
    fn test_amount_with_thousands_separator() {
        let content = "!Type:Bank\nD3/01/2024\nT-1,234.56\nPBIG ONE\n^\n";
        let output = parse(content).unwrap();
        assert_eq!(output.records[0].amount, Decimal::new(-123456, 2));
    }

    #[test]
    fn test_zero_usable_records_is_an_error() {
        assert!(parse("!Type:Bank\n^\n").is_err());
    }
}
