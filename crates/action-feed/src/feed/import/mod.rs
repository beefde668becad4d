//! Loan export ingestion for offline replays of the feed.

mod parser;

use std::io::Read;
use std::path::Path;

use super::domain::RawLoanEvent;

#[derive(Debug)]
pub enum LoanImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for LoanImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanImportError::Io(err) => write!(f, "failed to read loan export: {}", err),
            LoanImportError::Csv(err) => write!(f, "invalid loan export CSV data: {}", err),
        }
    }
}

impl std::error::Error for LoanImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoanImportError::Io(err) => Some(err),
            LoanImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LoanImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LoanImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads a CSV loan export into raw events, in file order.
///
/// Headers follow the flat event shape (`id`, `amount`, `client`, `type`, ...) plus the
/// optional nested columns `principal`, `loan_product`, `transaction_type` and `credit`.
pub struct LoanExportImporter;

impl LoanExportImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawLoanEvent>, LoanImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawLoanEvent>, LoanImportError> {
        Ok(parser::parse_events(reader)?)
    }
}
