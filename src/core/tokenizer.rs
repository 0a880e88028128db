//! Whitespace tokenizer
//!
//! Content is split into lines with universal-newline handling, then each
//! line is split on every single whitespace character. Runs of whitespace
//! are not collapsed, so adjacent delimiters and the line terminator yield
//! empty tokens:
//!
//! ```text
//! "a  b\n"  ->  ["a", "", "b", ""]
//! ```

use std::borrow::Cow;

/// Whether `c` separates tokens.
///
/// Unicode whitespace plus the ASCII information separators
/// U+001C..=U+001F, which are classified as whitespace by most regex
/// engines' `\s` but not by `char::is_whitespace`.
pub fn is_token_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{1C}'..='\u{1F}')
}

/// Translate `\r\n` and lone `\r` to `\n`
pub fn normalize_newlines(content: &str) -> Cow<'_, str> {
    if !content.contains('\r') {
        return Cow::Borrowed(content);
    }
    Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split normalized content into lines, each keeping its `\n` terminator
pub fn lines(content: &str) -> impl Iterator<Item = &str> {
    content.split_inclusive('\n')
}

/// Split one line into tokens, empty ones included
pub fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_token_delimiter)
}
