//! File reading with best-effort decoding
//!
//! Content is read whole and decoded as UTF-8. Invalid sequences are
//! handled by an [`EncodingStrategy`] and never abort the scan.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::core::error::ScanError;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingStrategy {
    /// Drop invalid byte sequences
    #[default]
    Ignore,
    /// Replace invalid byte sequences with U+FFFD
    Replace,
    /// Skip non-UTF-8 files entirely
    Skip,
}

impl std::str::FromStr for EncodingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(EncodingStrategy::Ignore),
            "replace" => Ok(EncodingStrategy::Replace),
            "skip" => Ok(EncodingStrategy::Skip),
            _ => Err(format!("Unknown encoding strategy: {}", s)),
        }
    }
}

/// Decoded content of one file
#[derive(Debug, Clone)]
pub struct FileReadResult {
    pub content: String,

    /// Whether invalid sequences were dropped or replaced
    pub lossy_conversion: bool,
}

/// Read a file and decode it with the given strategy
pub fn read_file_with_strategy(
    path: &Path,
    strategy: EncodingStrategy,
) -> Result<FileReadResult, ScanError> {
    let bytes = read_file_bytes(path).map_err(|e| ScanError::file_access(path, e))?;

    match String::from_utf8(bytes) {
        Ok(content) => Ok(FileReadResult {
            content,
            lossy_conversion: false,
        }),
        Err(err) => {
            let bytes = err.into_bytes();
            let content = match strategy {
                EncodingStrategy::Skip => {
                    return Err(ScanError::Undecodable(path.to_path_buf()));
                }
                EncodingStrategy::Replace => String::from_utf8_lossy(&bytes).into_owned(),
                EncodingStrategy::Ignore => decode_ignoring_invalid(&bytes),
            };
            Ok(FileReadResult {
                content,
                lossy_conversion: true,
            })
        }
    }
}

fn read_file_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let capacity = file.metadata().map(|m| m.len() as usize).unwrap_or(0);

    let mut reader = std::io::BufReader::new(file);
    let mut buffer = Vec::with_capacity(capacity);
    reader.read_to_end(&mut buffer)?;

    Ok(buffer)
}

/// Decode UTF-8, keeping only the valid runs
fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
