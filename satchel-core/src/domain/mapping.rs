//! Import mapping model
//!
//! Everything the user must resolve between "here is a statement file" and
//! "run the import": detected file type, the file-internal account and
//! category vocabulary, and for CSV the column-to-field assignment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Supported statement file formats, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Tag-based OFX/QFX family
    Ofx,
    /// Line-based QIF
    Qif,
    /// Delimited text
    Csv,
}

impl FileType {
    /// Detect the file type from the path extension (case-insensitive)
    ///
    /// Unsupported extensions fail fast, before any parsing is attempted.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("ofx") | Some("qfx") => Ok(Self::Ofx),
            Some("qif") => Ok(Self::Qif),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFileType(path.display().to_string())),
        }
    }
}

/// An account referenced inside a statement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccount {
    pub id: String,
    pub name: String,
}

/// A CSV column header with a few sample values for the mapping UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvHeader {
    pub header: String,
    pub samples: Vec<String>,
}

/// What a statement file needs mapped before a full import
///
/// Created fresh per inspected file; read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMapping {
    pub file_type: FileType,
    /// Accounts referenced inside the file; only QIF can carry more than one
    pub accounts: Vec<FileAccount>,
    /// Category paths such as `Food:Dining Out`, or bracketed transfer
    /// targets such as `[Checking Account]`
    pub categories: Vec<String>,
    /// Column headers with sample values; CSV only
    pub csv_headers: Option<Vec<CsvHeader>>,
}

/// Canonical field assignments for a CSV import
///
/// `date` and `amount` are mandatory for a full import; the resolver checks
/// for them so the failure surfaces before any row parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvFields {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub name: Option<String>,
    pub check_number: Option<String>,
}

/// Locale settings for a CSV import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSettings {
    /// Field delimiter (splits columns, not the decimal separator)
    pub delimiter: char,
    /// chrono date pattern, e.g. `%m/%d/%Y`
    pub date_format: String,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            date_format: "%m/%d/%Y".to_string(),
        }
    }
}

/// Column-to-field assignment plus locale settings for delimited text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvMapper {
    pub fields: CsvFields,
    #[serde(default)]
    pub settings: CsvSettings,
}

/// The resolved, user-approved import configuration
///
/// Owned by the caller and passed by value into the builder for a single
/// import run; the builder never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMapper {
    pub file_type: FileType,
    /// Target account when the file has no internal account concept, and
    /// fallback for unmapped file-internal accounts
    pub default_account_id: Uuid,
    /// File-internal account id -> local account id
    #[serde(default)]
    pub accounts_mapper: HashMap<String, Uuid>,
    /// Category path -> local category/transfer target id
    #[serde(default)]
    pub categories_mapper: HashMap<String, Uuid>,
    /// Required for CSV full imports
    pub csv_mapper: Option<CsvMapper>,
}

impl ImportMapper {
    pub fn new(file_type: FileType, default_account_id: Uuid) -> Self {
        Self {
            file_type,
            default_account_id,
            accounts_mapper: HashMap::new(),
            categories_mapper: HashMap::new(),
            csv_mapper: None,
        }
    }

    /// Resolve this mapper against what the file actually references
    ///
    /// Pure transformation, no I/O. Mapper keys with no counterpart in the
    /// `FileMapping` are dropped rather than rejected, so a partial mapping
    /// still imports (unmapped accounts fall back to `default_account_id`,
    /// unmapped categories stay unclassified). Missing mandatory CSV field
    /// assignments are a hard configuration error.
    pub fn resolve(&self, mapping: &FileMapping) -> Result<ResolvedMapping> {
        let accounts: HashMap<String, Uuid> = self
            .accounts_mapper
            .iter()
            .filter(|(id, _)| mapping.accounts.iter().any(|a| &a.id == *id))
            .map(|(id, local)| (id.clone(), *local))
            .collect();

        let categories: HashMap<String, Uuid> = self
            .categories_mapper
            .iter()
            .filter(|(path, _)| mapping.categories.iter().any(|c| &c == path))
            .map(|(path, local)| (path.clone(), *local))
            .collect();

        let csv = match self.file_type {
            FileType::Csv => Some(self.resolve_csv(mapping)?),
            _ => None,
        };

        Ok(ResolvedMapping {
            file_type: self.file_type,
            default_account_id: self.default_account_id,
            accounts,
            categories,
            csv,
        })
    }

    fn resolve_csv(&self, mapping: &FileMapping) -> Result<ResolvedCsv> {
        let csv_mapper = self
            .csv_mapper
            .as_ref()
            .ok_or_else(|| Error::config("CSV import requires a column mapping"))?;

        // The reader splits on a single byte; a multi-byte delimiter would
        // get truncated to its first byte and split on garbage
        if !csv_mapper.settings.delimiter.is_ascii() {
            return Err(Error::config(format!(
                "CSV delimiter '{}' is not an ASCII character",
                csv_mapper.settings.delimiter
            )));
        }

        let headers = mapping.csv_headers.as_deref().unwrap_or(&[]);
        let known = |header: &str| headers.iter().any(|h| h.header == header);

        let require = |field: &'static str, assigned: &Option<String>| -> Result<String> {
            let header = assigned
                .as_deref()
                .ok_or_else(|| Error::config(format!("CSV field '{field}' has no column assigned")))?;
            if !known(header) {
                return Err(Error::config(format!(
                    "CSV field '{field}' is assigned to unknown column '{header}'"
                )));
            }
            Ok(header.to_string())
        };

        // Optional fields assigned to a column the file does not have are
        // dropped, matching the unknown-key policy above
        let optional = |assigned: &Option<String>| -> Option<String> {
            assigned.as_deref().filter(|h| known(h)).map(str::to_string)
        };

        Ok(ResolvedCsv {
            date: require("date", &csv_mapper.fields.date)?,
            amount: require("amount", &csv_mapper.fields.amount)?,
            name: optional(&csv_mapper.fields.name),
            check_number: optional(&csv_mapper.fields.check_number),
            settings: csv_mapper.settings.clone(),
        })
    }
}

/// A fully resolved CSV configuration: mandatory fields verified present
#[derive(Debug, Clone)]
pub struct ResolvedCsv {
    pub date: String,
    pub amount: String,
    pub name: Option<String>,
    pub check_number: Option<String>,
    pub settings: CsvSettings,
}

/// A mapper validated against a concrete `FileMapping`
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub file_type: FileType,
    pub default_account_id: Uuid,
    pub accounts: HashMap<String, Uuid>,
    pub categories: HashMap<String, Uuid>,
    pub csv: Option<ResolvedCsv>,
}

impl ResolvedMapping {
    /// Local account for a file-internal account reference
    pub fn resolve_account(&self, file_account: Option<&str>) -> Uuid {
        file_account
            .and_then(|id| self.accounts.get(id).copied())
            .unwrap_or(self.default_account_id)
    }

    /// Local category/transfer target for a category path; `None` leaves the
    /// line item unclassified
    pub fn resolve_category(&self, path: &str) -> Option<Uuid> {
        self.categories.get(path).copied()
    }
}

/// Bracketed paths (`[Checking Account]`) denote a transfer target, an
/// `Account`-class entry, rather than a category
pub fn is_transfer_path(path: &str) -> bool {
    path.starts_with('[') && path.ends_with(']') && path.len() > 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qif_mapping() -> FileMapping {
        FileMapping {
            file_type: FileType::Qif,
            accounts: vec![FileAccount {
                id: "Checking".to_string(),
                name: "Checking".to_string(),
            }],
            categories: vec!["Food:Dining Out".to_string(), "[Savings]".to_string()],
            csv_headers: None,
        }
    }

    #[test]
    fn test_unknown_mapper_keys_are_dropped() {
        let mut mapper = ImportMapper::new(FileType::Qif, Uuid::new_v4());
        let checking = Uuid::new_v4();
        mapper.accounts_mapper.insert("Checking".to_string(), checking);
        mapper.accounts_mapper.insert("Nonexistent".to_string(), Uuid::new_v4());
        mapper.categories_mapper.insert("Utilities".to_string(), Uuid::new_v4());

        let resolved = mapper.resolve(&qif_mapping()).unwrap();
        assert_eq!(resolved.accounts.len(), 1);
        assert_eq!(resolved.resolve_account(Some("Checking")), checking);
        assert!(resolved.categories.is_empty());
    }

    #[test]
    fn test_unmapped_account_falls_back_to_default() {
        let default = Uuid::new_v4();
        let mapper = ImportMapper::new(FileType::Qif, default);
        let resolved = mapper.resolve(&qif_mapping()).unwrap();
        assert_eq!(resolved.resolve_account(Some("Checking")), default);
        assert_eq!(resolved.resolve_account(None), default);
    }

    #[test]
    fn test_csv_mandatory_fields_enforced() {
        let mapping = FileMapping {
            file_type: FileType::Csv,
            accounts: Vec::new(),
            categories: Vec::new(),
            csv_headers: Some(vec![
                CsvHeader { header: "Date".to_string(), samples: Vec::new() },
                CsvHeader { header: "Amount".to_string(), samples: Vec::new() },
            ]),
        };

        let mut mapper = ImportMapper::new(FileType::Csv, Uuid::new_v4());
        mapper.csv_mapper = Some(CsvMapper {
            fields: CsvFields {
                date: Some("Date".to_string()),
                amount: None,
                ..Default::default()
            },
            settings: CsvSettings::default(),
        });

        let err = mapper.resolve(&mapping).unwrap_err();
        assert!(err.to_string().contains("amount"));

        mapper.csv_mapper.as_mut().unwrap().fields.amount = Some("Amount".to_string());
        assert!(mapper.resolve(&mapping).is_ok());

        // A non-ASCII delimiter cannot be handed to the byte-oriented reader
        mapper.csv_mapper.as_mut().unwrap().settings.delimiter = '¦';
        let err = mapper.resolve(&mapping).unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn test_transfer_path_detection() {
        assert!(is_transfer_path("[Checking Account]"));
        assert!(!is_transfer_path("Food:Dining Out"));
        assert!(!is_transfer_path("[]"));
    }
}
