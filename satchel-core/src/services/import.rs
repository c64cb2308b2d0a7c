//! Import service - transaction building and reconciliation
//!
//! Re-runs the matching reader with a resolved mapping and turns each raw
//! record into a line-itemized transaction candidate, flagging likely
//! re-imports against what the ledger already knows. Nothing is persisted
//! and no duplicate is silently dropped: every input record comes back as a
//! [`ReconciledTransaction`] and the caller decides skip-or-merge.
//!
//! A single invocation observes duplicate-detection state consistently
//! (the candidate set for each account is fetched once per run). Two
//! concurrent imports into the same account race those reads and must be
//! serialized by the caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::mapping::{is_transfer_path, FileType, ImportMapper, ResolvedMapping};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountClass, CategoryKind, LineItem, Transaction};
use crate::ports::LedgerStore;
use crate::readers::{self, ParseOutput, RawRecord};
use crate::services::inspect::{at_path, mapping_from_output};

/// Import options for a single run
#[derive(Debug, Default)]
pub struct ImportOptions {
    /// Create a placeholder category for unmapped, non-transfer category
    /// paths instead of leaving the line item unclassified
    pub create_missing_categories: bool,
}

/// One transaction candidate, reconciled against the ledger
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledTransaction {
    pub transaction: Transaction,
    /// The ledger's existing counterpart when this record is a likely
    /// re-import; the caller decides whether to skip or merge
    pub duplicate_of: Option<Transaction>,
}

/// Result of a full import run
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    /// One entry per usable source record, in file order
    pub transactions: Vec<ReconciledTransaction>,
    /// Placeholder categories created for unmapped paths; empty unless
    /// [`ImportOptions::create_missing_categories`] was set
    pub new_categories: Vec<Account>,
    /// Source records dropped for missing/unparsable mandatory fields
    pub skipped: usize,
}

/// Import service for statement files
pub struct ImportService {
    store: Arc<dyn LedgerStore>,
}

impl ImportService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Read a statement file into reconciled transaction candidates
    ///
    /// Output order follows input file order. The mapper is taken by value
    /// for one run and never mutated.
    pub async fn read_transactions_file(
        &self,
        path: &Path,
        mapper: ImportMapper,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        let file_type = FileType::from_path(path)?;
        if file_type != mapper.file_type {
            return Err(Error::config(format!(
                "mapper was prepared for {:?} but {} is {:?}",
                mapper.file_type,
                path.display(),
                file_type
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(path, e))?;

        let (output, mut resolved) = match file_type {
            FileType::Ofx => {
                let output = readers::ofx::parse(&content).map_err(|e| at_path(path, e))?;
                let resolved = mapper.resolve(&mapping_from_output(file_type, &output))?;
                (output, resolved)
            }
            FileType::Qif => {
                let output = readers::qif::parse(&content).map_err(|e| at_path(path, e))?;
                let resolved = mapper.resolve(&mapping_from_output(file_type, &output))?;
                (output, resolved)
            }
            FileType::Csv => {
                // Mandatory field assignments are verified against the
                // preview before any row parsing
                let headers = readers::csv::preview(&content).map_err(|e| at_path(path, e))?;
                let resolved = mapper.resolve(&crate::domain::FileMapping {
                    file_type,
                    accounts: Vec::new(),
                    categories: Vec::new(),
                    csv_headers: Some(headers),
                })?;
                let csv = resolved
                    .csv
                    .as_ref()
                    .ok_or_else(|| Error::config("CSV import requires a column mapping"))?;
                let output = readers::csv::parse(&content, csv).map_err(|e| at_path(path, e))?;
                (output, resolved)
            }
        };

        debug!(
            path = %path.display(),
            records = output.records.len(),
            skipped = output.skipped,
            "parsed statement file"
        );

        self.verify_target_classes(&mut resolved).await?;
        self.reconcile(output, &resolved, options).await
    }

    /// Drop resolved mapping entries whose ledger target has the wrong class
    ///
    /// A plain category path must target a category and a bracketed transfer
    /// path must target an account; account mappings must target accounts.
    /// Mismatched entries fall back to the unmapped behavior (default account
    /// or unclassified line item). A wrong-class default account is a hard
    /// configuration error since every record can land on it. Targets the
    /// store does not know are left alone; they resolve to nothing either way.
    async fn verify_target_classes(&self, mapping: &mut ResolvedMapping) -> Result<()> {
        if let Some(default) = self.store.get_account(mapping.default_account_id).await? {
            if default.class != AccountClass::Account {
                return Err(Error::config(format!(
                    "default import target '{}' is a category, not an account",
                    default.name
                )));
            }
        }

        let mut dropped: Vec<String> = Vec::new();
        for (key, id) in &mapping.accounts {
            if let Some(target) = self.store.get_account(*id).await? {
                if target.class != AccountClass::Account {
                    warn!(account = %key, target = %target.name, "account mapping targets a category, using default account");
                    dropped.push(key.clone());
                }
            }
        }
        for key in &dropped {
            mapping.accounts.remove(key);
        }

        dropped.clear();
        for (path, id) in &mapping.categories {
            let expected = if is_transfer_path(path) {
                AccountClass::Account
            } else {
                AccountClass::Category
            };
            if let Some(target) = self.store.get_account(*id).await? {
                if target.class != expected {
                    warn!(path = %path, target = %target.name, "category mapping targets the wrong class, leaving unclassified");
                    dropped.push(path.clone());
                }
            }
        }
        for path in &dropped {
            mapping.categories.remove(path);
        }

        Ok(())
    }

    async fn reconcile(
        &self,
        output: ParseOutput,
        mapping: &ResolvedMapping,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        let mut currencies: HashMap<Uuid, String> = HashMap::new();
        let mut indices: HashMap<Uuid, DedupIndex> = HashMap::new();
        let mut created: HashMap<String, Uuid> = HashMap::new();
        let mut new_categories: Vec<Account> = Vec::new();
        let mut transactions = Vec::with_capacity(output.records.len());

        for record in &output.records {
            let account_id = mapping.resolve_account(record.account_name.as_deref());

            if !currencies.contains_key(&account_id) {
                let currency = self
                    .store
                    .get_account(account_id)
                    .await?
                    .and_then(|a| a.currency)
                    .unwrap_or_else(|| "USD".to_string());
                currencies.insert(account_id, currency);
            }

            if !indices.contains_key(&account_id) {
                let existing = self.store.list_transactions(account_id).await?;
                indices.insert(account_id, DedupIndex::build(existing));
            }

            let transaction = build_transaction(
                record,
                account_id,
                &currencies[&account_id],
                mapping,
                options,
                &mut created,
                &mut new_categories,
            );
            let duplicate_of = indices[&account_id].find(&transaction);

            transactions.push(ReconciledTransaction {
                transaction,
                duplicate_of,
            });
        }

        debug!(
            candidates = transactions.len(),
            duplicates = transactions
                .iter()
                .filter(|t| t.duplicate_of.is_some())
                .count(),
            new_categories = new_categories.len(),
            "reconciled import candidates"
        );

        Ok(ImportOutcome {
            transactions,
            new_categories,
            skipped: output.skipped,
        })
    }
}

/// Convert one raw record into a transaction candidate with a single line
/// item carrying the full amount
///
/// None of the supported formats carry multi-line splits on read; splitting
/// is a user action after import.
fn build_transaction(
    record: &RawRecord,
    account_id: Uuid,
    currency: &str,
    mapping: &ResolvedMapping,
    options: &ImportOptions,
    created: &mut HashMap<String, Uuid>,
    new_categories: &mut Vec<Account>,
) -> Transaction {
    let mut tx = Transaction::new(account_id, record.date, record.name.clone(), record.amount, currency);
    tx.file_id = record.file_id.clone();

    let target = record.category.as_deref().and_then(|path| {
        if let Some(id) = mapping.resolve_category(path) {
            return Some(id);
        }
        // Only categories are ever auto-created; transfer targets are real
        // accounts and stay unresolved until the user maps them
        if options.create_missing_categories && !is_transfer_path(path) {
            let id = *created.entry(path.to_string()).or_insert_with(|| {
                let kind = if record.amount < Decimal::ZERO {
                    CategoryKind::Expense
                } else {
                    CategoryKind::Income
                };
                let category = Account::new_category(Uuid::new_v4(), path, kind);
                let id = category.id;
                new_categories.push(category);
                id
            });
            return Some(id);
        }
        None
    });

    tx.line_items.push(LineItem::new(target, record.amount));
    tx
}

/// Per-account candidate set for duplicate detection, fetched once per run
struct DedupIndex {
    by_file_id: HashMap<String, Transaction>,
    by_fingerprint: HashMap<String, Transaction>,
}

impl DedupIndex {
    fn build(existing: Vec<Transaction>) -> Self {
        let mut by_file_id = HashMap::new();
        let mut by_fingerprint = HashMap::new();
        for tx in existing {
            if let Some(file_id) = &tx.file_id {
                by_file_id.insert(file_id.clone(), tx.clone());
            }
            by_fingerprint.insert(tx.fingerprint(), tx);
        }
        Self {
            by_file_id,
            by_fingerprint,
        }
    }

    /// Match by file-provided unique id when the candidate carries one,
    /// otherwise by exact date + amount + normalized title
    fn find(&self, candidate: &Transaction) -> Option<Transaction> {
        match &candidate.file_id {
            Some(file_id) => self.by_file_id.get(file_id).cloned(),
            None => self.by_fingerprint.get(&candidate.fingerprint()).cloned(),
        }
    }
}
