//! Inspect service - pre-import file mapping discovery
//!
//! Before a full import the user has to map what the file references to
//! local ledger entries. This service runs the matching reader in preview
//! mode and reports the vocabulary: detected file type, referenced account
//! names, referenced category paths, and for delimited text the column
//! headers with sample values.

use std::path::Path;

use tokio::io::AsyncBufReadExt;
use tracing::debug;

use crate::domain::mapping::{FileAccount, FileMapping, FileType};
use crate::domain::result::{Error, Result};
use crate::readers::{self, ParseOutput};

/// Builds the [`FileMapping`] for a statement file
#[derive(Debug, Default)]
pub struct InspectService;

impl InspectService {
    pub fn new() -> Self {
        Self
    }

    /// Inspect a statement file and describe what must be mapped
    ///
    /// OFX and QIF expose no lightweight header, so inspection performs a
    /// full parse and keeps only the discovered vocabulary. CSV reads just
    /// the header row and a few sample rows, so inspection stays cheap on
    /// very large files.
    pub async fn read_file_mappings(&self, path: &Path) -> Result<FileMapping> {
        let file_type = FileType::from_path(path)?;

        let mapping = match file_type {
            FileType::Ofx => {
                let content = read_all(path).await?;
                let output = readers::ofx::parse(&content).map_err(|e| at_path(path, e))?;
                mapping_from_output(file_type, &output)
            }
            FileType::Qif => {
                let content = read_all(path).await?;
                let output = readers::qif::parse(&content).map_err(|e| at_path(path, e))?;
                mapping_from_output(file_type, &output)
            }
            FileType::Csv => {
                let chunk = read_preview_lines(path).await?;
                let headers = readers::csv::preview(&chunk).map_err(|e| at_path(path, e))?;
                FileMapping {
                    file_type,
                    accounts: Vec::new(),
                    categories: Vec::new(),
                    csv_headers: Some(headers),
                }
            }
        };

        debug!(
            path = %path.display(),
            accounts = mapping.accounts.len(),
            categories = mapping.categories.len(),
            "inspected statement file"
        );
        Ok(mapping)
    }
}

async fn read_all(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(path, e))
}

/// Read the header line plus the sample rows and nothing more, so a
/// multi-gigabyte CSV never gets materialized for a preview
async fn read_preview_lines(path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::io(path, e))?;
    let mut lines = tokio::io::BufReader::new(file).lines();

    let mut chunk = String::new();
    for _ in 0..=readers::csv::SAMPLE_ROWS {
        match lines.next_line().await.map_err(|e| Error::io(path, e))? {
            Some(line) => {
                chunk.push_str(&line);
                chunk.push('\n');
            }
            None => break,
        }
    }
    Ok(chunk)
}

/// Keep only the vocabulary of a full parse, discarding record bodies
pub(crate) fn mapping_from_output(file_type: FileType, output: &ParseOutput) -> FileMapping {
    FileMapping {
        file_type,
        // File-internal account ids and display names coincide in QIF
        accounts: output
            .accounts
            .iter()
            .map(|name| FileAccount {
                id: name.clone(),
                name: name.clone(),
            })
            .collect(),
        categories: output.categories.clone(),
        csv_headers: None,
    }
}

/// Prefix reader errors with the offending file
pub(crate) fn at_path(path: &Path, err: Error) -> Error {
    match err {
        Error::Parse(msg) => Error::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}
