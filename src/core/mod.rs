//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Scan model (options, result lines, diagnostics, stats)
//! - Typed scan errors
//! - File reading with best-effort decoding
//! - Whitespace tokenization
//! - Result sinks for stdout and files

pub mod error;
pub mod file_reader;
pub mod model;
pub mod sink;
pub mod tokenizer;
