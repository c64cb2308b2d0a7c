//! Statement format readers
//!
//! Each reader turns raw file text into a sequence of intermediate records
//! plus the file-internal account/category vocabulary it references.
//! Readers are pure functions over text; all file I/O happens in the
//! service layer. Input order is preserved and a record that cannot be
//! parsed is skipped and counted, never fatal on its own - a file only
//! fails outright when it yields zero usable records.

pub mod csv;
pub mod ofx;
pub mod qif;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Format-specific intermediate record
///
/// Produced transiently by a reader; never persisted.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub date: NaiveDate,
    /// Payee/name text; empty when the format carries none
    pub name: String,
    pub amount: Decimal,
    pub memo: Option<String>,
    /// Running balance, when the format carries one
    pub balance: Option<Decimal>,
    pub check_number: Option<String>,
    /// File-internal account this record belongs to (QIF account sections)
    pub account_name: Option<String>,
    /// Category path or bracketed transfer target
    pub category: Option<String>,
    /// File-assigned unique identifier (OFX FITID), for duplicate detection
    pub file_id: Option<String>,
}

impl RawRecord {
    pub(crate) fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            date,
            name: String::new(),
            amount,
            memo: None,
            balance: None,
            check_number: None,
            account_name: None,
            category: None,
            file_id: None,
        }
    }
}

/// What a full parse of one file produces
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub records: Vec<RawRecord>,
    /// Distinct file-internal account names, in order of first appearance
    pub accounts: Vec<String>,
    /// Distinct category paths, in order of first appearance
    pub categories: Vec<String>,
    /// Records dropped for missing/unparsable mandatory fields
    pub skipped: usize,
}

impl ParseOutput {
    /// Record a vocabulary entry, keeping first-appearance order
    pub(crate) fn note_account(&mut self, name: &str) {
        if !self.accounts.iter().any(|a| a == name) {
            self.accounts.push(name.to_string());
        }
    }

    pub(crate) fn note_category(&mut self, path: &str) {
        if !self.categories.iter().any(|c| c == path) {
            self.categories.push(path.to_string());
        }
    }
}

/// Parse a signed decimal amount as banks print them
///
/// Strips currency symbols, thousands separators and whitespace; honors
/// parentheses notation for negatives: `(100.00)` -> `-100.00`. Commas are
/// accepted only as 3-digit grouping separators left of the decimal point.
/// A decimal-comma amount like `-42,17` is rejected rather than read as
/// `-4217`, so the record gets skipped instead of importing scaled 100x.
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();

    let (parenthesized, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ','))
        .collect();
    let cleaned = strip_grouping_commas(&cleaned)?;

    let mut amount: Decimal = cleaned.parse().ok()?;

    if parenthesized && amount > Decimal::ZERO {
        amount = -amount;
    }

    Some(amount)
}

fn strip_grouping_commas(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }

    let (integer, fraction) = match s.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (s, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = integer.trim_start_matches('-').split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    for group in groups {
        if group.len() != 3 {
            return None;
        }
    }

    Some(s.replace(',', ""))
}
