//! Backends module - File operations
//!
//! Provides:
//! - walk: Recursive file enumeration with walkdir
//! - search: Tokenize, match and stream results

pub mod search;
pub mod walk;
