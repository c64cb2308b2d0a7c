//! Account domain model
//!
//! Satchel treats bank accounts and categories as two classes of the same
//! referenceable entity: transfers resolve to `Account`-class entries,
//! income/expense classification resolves to `Category`-class entries.
//! A transaction line item may point at either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{join_validation_errors, Error, Result, ValidationError};

/// Discriminant for the two classes of referenceable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    /// A real bank/brokerage account; transfer targets resolve here
    Account,
    /// An income/expense classification
    Category,
}

/// Bank account subtype, required for `Account`-class entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountKind {
    Checking,
    Savings,
    CreditCard,
    Investment,
    Cash,
}

/// Income vs. expense, required for `Category`-class entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

/// A referenceable ledger entity: a bank account or a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub class: AccountClass,
    /// Required when class is `Account`
    pub account_kind: Option<BankAccountKind>,
    /// ISO 4217 currency code, required when class is `Account`
    pub currency: Option<String>,
    /// Required when class is `Category`
    pub category_kind: Option<CategoryKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new bank account entry
    pub fn new_bank(
        id: Uuid,
        name: impl Into<String>,
        kind: BankAccountKind,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            class: AccountClass::Account,
            account_kind: Some(kind),
            currency: Some(Self::normalize_currency(&currency.into())),
            category_kind: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new category entry
    pub fn new_category(id: Uuid, name: impl Into<String>, kind: CategoryKind) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            class: AccountClass::Category,
            account_kind: None,
            currency: None,
            category_kind: Some(kind),
            created_at: now,
            updated_at: now,
        }
    }

    /// Normalize currency code to uppercase
    pub fn normalize_currency(currency: &str) -> String {
        currency.trim().to_uppercase()
    }

    /// Validate class-specific required fields
    ///
    /// One branch per class, each checking only the fields relevant to that
    /// class; an empty vec means the entry is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { entity: "Account" });
        }

        match self.class {
            AccountClass::Account => {
                if self.account_kind.is_none() {
                    errors.push(ValidationError::MissingClassField {
                        field: "account_kind",
                        class: "account",
                    });
                }
                if self.currency.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    errors.push(ValidationError::MissingClassField {
                        field: "currency",
                        class: "account",
                    });
                }
            }
            AccountClass::Category => {
                if self.category_kind.is_none() {
                    errors.push(ValidationError::MissingClassField {
                        field: "category_kind",
                        class: "category",
                    });
                }
            }
        }

        errors
    }

    /// Re-hydrate a plain JSON value received over the process boundary
    /// into a validated entity
    pub fn from_plain(value: serde_json::Value) -> Result<Self> {
        let account: Account = serde_json::from_value(value)?;
        let errors = account.validate();
        if errors.is_empty() {
            Ok(account)
        } else {
            Err(Error::validation(join_validation_errors(&errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_account_validation() {
        let mut account = Account::new_bank(
            Uuid::new_v4(),
            "Everyday Checking",
            BankAccountKind::Checking,
            "usd",
        );
        assert_eq!(account.currency.as_deref(), Some("USD"));
        assert!(account.validate().is_empty());

        account.currency = None;
        let errors = account.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("currency"));
    }

    #[test]
    fn test_category_validation_ignores_bank_fields() {
        let mut category = Account::new_category(Uuid::new_v4(), "Food:Dining Out", CategoryKind::Expense);
        assert!(category.validate().is_empty());

        // A category never needs a currency or bank subtype
        category.category_kind = None;
        let errors = category.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("category_kind"));
    }

    #[test]
    fn test_from_plain_rejects_invalid() {
        let value = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "",
            "class": "category",
            "account_kind": null,
            "currency": null,
            "category_kind": "expense",
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
        });
        assert!(Account::from_plain(value).is_err());
    }
}
