//! Transaction and line item domain model

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::result::{join_validation_errors, Error, Result, ValidationError};

/// A single category or transfer allocation within a transaction
///
/// `account_id` references either a `Category`-class entry or, for
/// transfers, an `Account`-class entry. `None` means unclassified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub account_id: Option<Uuid>,
    pub amount: Decimal,
    pub tags: Vec<String>,
}

impl LineItem {
    pub fn new(account_id: Option<Uuid>, amount: Decimal) -> Self {
        Self {
            account_id,
            amount,
            tags: Vec::new(),
        }
    }
}

/// A single financial transaction belonging to an account
///
/// The same shape is used for imported candidates and manual entries;
/// `id` stays unset until the store assigns one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<Uuid>,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub amount: Decimal,
    /// ISO 4217 currency code of the owning account
    pub currency_code: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    /// File-assigned unique identifier (OFX FITID), kept for re-import
    /// protection
    pub file_id: Option<String>,
    pub line_items: Vec<LineItem>,
}

impl Transaction {
    /// Create a new transaction with required fields and no line items
    pub fn new(
        account_id: Uuid,
        date: NaiveDate,
        title: impl Into<String>,
        amount: Decimal,
        currency_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            account_id,
            date,
            title: title.into(),
            amount,
            currency_code: currency_code.into(),
            created_on: now,
            modified_on: now,
            file_id: None,
            line_items: Vec::new(),
        }
    }

    /// Validate the transaction invariants
    ///
    /// Enforced identically whether the transaction came from an import or
    /// manual entry; anything entering the persistence boundary must return
    /// an empty vec here.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.line_items.is_empty() {
            errors.push(ValidationError::NoLineItems);
            return errors;
        }

        let split_total: Decimal = self.line_items.iter().map(|li| li.amount).sum();
        if split_total != self.amount {
            errors.push(ValidationError::SplitSumMismatch {
                split_total,
                amount: self.amount,
            });
        }

        errors
    }

    /// Re-hydrate a plain JSON value received over the process boundary
    /// into a validated entity
    pub fn from_plain(value: serde_json::Value) -> Result<Self> {
        let tx: Transaction = serde_json::from_value(value)?;
        let errors = tx.validate();
        if errors.is_empty() {
            Ok(tx)
        } else {
            Err(Error::validation(join_validation_errors(&errors)))
        }
    }

    /// Calculate fingerprint hash for duplicate detection
    ///
    /// Uses: account_id, date, amount (with sign), and normalized title.
    /// Two transactions with the same fingerprint in the same account are
    /// treated as likely re-imports of the same record.
    pub fn fingerprint(&self) -> String {
        // Treat -0 as 0
        let amount = if self.amount == Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.amount
        };

        let fingerprint_str = format!(
            "{}|{}|{:.2}|{}",
            self.account_id,
            self.date.format("%Y-%m-%d"),
            amount,
            Self::normalize_title(&self.title)
        );

        // SHA256 hash, truncated to 16 chars
        let mut hasher = Sha256::new();
        hasher.update(fingerprint_str.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }

    /// Normalize a title for fingerprint comparison
    ///
    /// Bank exports of the same transaction differ in casing, whitespace and
    /// masked card/account numbers depending on the format, so:
    /// - lowercase
    /// - remove literal "null" strings (CSV exports)
    /// - normalize masked card/account numbers to their last 4 digits
    /// - keep only alphanumerics
    pub fn normalize_title(title: &str) -> String {
        let title = title.to_lowercase();

        let null_re = Regex::new(r"\bnull\b").unwrap();
        let mut normalized = null_re.replace_all(&title, "").to_string();

        // Card/account number masks: 7-12 chars of X's and digits, keep last 4
        let mask_re = Regex::new(r"[x0-9]{7,12}").unwrap();
        normalized = mask_re
            .replace_all(&normalized, |caps: &regex::Captures| {
                let text = caps.get(0).unwrap().as_str();
                let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.len() >= 4 {
                    digits[digits.len() - 4..].to_string()
                } else {
                    text.to_string()
                }
            })
            .to_string();

        let keep_re = Regex::new(r"[^a-z0-9]").unwrap();
        keep_re.replace_all(&normalized, "").to_string()
    }
}
