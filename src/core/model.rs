//! Scan model
//!
//! The values that flow through the pipeline: options, result lines,
//! diagnostics and per-run statistics.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::error::ScanError;
use crate::core::file_reader::EncodingStrategy;

/// Column width the path is padded to in annotated result lines
pub const PATH_COLUMN_WIDTH: usize = 100;

/// Options controlling how a single file is matched
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Literal, case-sensitive substring to look for inside tokens
    pub substring: String,

    /// Prefix every result with the source file path
    pub print_path: bool,

    /// Suppress repeated identical tokens within one file
    pub deduplicate: bool,

    /// How to handle invalid UTF-8 content
    pub encoding: EncodingStrategy,
}

impl ScanOptions {
    pub fn new(substring: impl Into<String>) -> Self {
        Self {
            substring: substring.into(),
            print_path: false,
            deduplicate: false,
            encoding: EncodingStrategy::default(),
        }
    }

    pub fn with_print_path(mut self, print_path: bool) -> Self {
        self.print_path = print_path;
        self
    }

    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingStrategy) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Build one result line for a matching token.
///
/// Annotated lines are `<path padded to 100 columns> | String: <token>`.
/// Paths longer than the column are kept whole.
pub fn format_result_line(path: &Path, token: &str, print_path: bool) -> String {
    if print_path {
        format!(
            "{:<width$} | String: {}",
            path.display().to_string(),
            token,
            width = PATH_COLUMN_WIDTH
        )
    } else {
        token.to_string()
    }
}

/// Diagnostic codes for files that were skipped or altered while reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// File could not be opened or read
    FileUnreadable,
    /// Directory entry could not be accessed during the walk
    EntryInaccessible,
    /// File was skipped because it is not valid UTF-8
    FileSkippedEncoding,
    /// Invalid UTF-8 sequences were dropped or replaced
    LossyConversion,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::FileUnreadable => "FILE_UNREADABLE",
            DiagnosticCode::EntryInaccessible => "ENTRY_INACCESSIBLE",
            DiagnosticCode::FileSkippedEncoding => "FILE_SKIPPED_ENCODING",
            DiagnosticCode::LossyConversion => "LOSSY_CONVERSION",
        }
    }

    /// Whether the file contributed nothing to the results
    pub fn is_skip(&self) -> bool {
        !matches!(self, DiagnosticCode::LossyConversion)
    }
}

/// A non-fatal notice about one path, kept apart from the results
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub path: PathBuf,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn lossy(path: &Path) -> Self {
        Self::new(
            DiagnosticCode::LossyConversion,
            "invalid UTF-8 sequences were not decoded",
            path,
        )
    }
}

impl From<ScanError> for Diagnostic {
    fn from(err: ScanError) -> Self {
        let code = match &err {
            ScanError::WalkEntry { .. } => DiagnosticCode::EntryInaccessible,
            ScanError::Undecodable(_) => DiagnosticCode::FileSkippedEncoding,
            _ => DiagnosticCode::FileUnreadable,
        };
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self::new(code, err.to_string(), path)
    }
}

/// Counters for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Files whose content was tokenized
    pub files_scanned: usize,
    /// Files or entries that contributed nothing because of an error
    pub files_skipped: usize,
    /// Files decoded with invalid sequences dropped or replaced
    pub lossy_files: usize,
    /// Result lines emitted
    pub matches: usize,
}

/// Everything a finished scan reports besides the result lines
#[derive(Debug, Default)]
pub struct ScanReport {
    pub stats: ScanStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.code.is_skip() {
            self.stats.files_skipped += 1;
        } else {
            self.stats.lossy_files += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code.is_skip())
    }
}
