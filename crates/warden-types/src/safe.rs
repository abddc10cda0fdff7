//! Safe-string validation.
//!
//! Every string that reaches storage or a cryptographic operation passes
//! through [`string_is`] first. Rules run in a fixed order so the reported
//! error is deterministic for inputs that break several of them.

/// Maximum accepted length, in bytes.
pub const MAX_STRING_LENGTH: usize = 8192;

const SQL_KEYWORDS: [&str; 6] = ["insert", "update", "upsert", "drop", "create", "select"];
const HTML_FRAGMENTS: [&str; 3] = ["&gt;", "&lt;", "window."];
const WHITESPACE: [char; 3] = ['\n', '\t', '\r'];
const FORBIDDEN_CHARS: [char; 5] = ['\'', '"', '`', '<', '>'];

/// Why a string was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SafeStringError {
    #[error("string is unsafe due to detected sql")]
    Sql,

    #[error("string is unsafe due to detected html")]
    Html,

    #[error("string is unsafe due to detected whitespace")]
    Whitespace,

    #[error("string is unsafe due to prohibited chars")]
    Chars,

    #[error("string is either zero-len or exceeds limit")]
    Length,

    #[error("input string is not an id")]
    NotAnId,
}

/// Validate `s` for storage.
pub fn string_is(s: &str) -> Result<(), SafeStringError> {
    let lower = s.to_ascii_lowercase();

    if SQL_KEYWORDS.iter().any(|kw| keyword_then_space(&lower, kw)) {
        return Err(SafeStringError::Sql);
    }

    if HTML_FRAGMENTS.iter().any(|frag| lower.contains(frag)) {
        return Err(SafeStringError::Html);
    }

    if s.contains(WHITESPACE) {
        return Err(SafeStringError::Whitespace);
    }

    if s.contains(FORBIDDEN_CHARS) {
        return Err(SafeStringError::Chars);
    }

    if s.is_empty() || s.len() > MAX_STRING_LENGTH {
        return Err(SafeStringError::Length);
    }

    Ok(())
}

/// Validate the shape of an identifier: word characters and dashes, at least
/// three long, starting and ending with a word character.
pub fn id_is(s: &str) -> Result<(), SafeStringError> {
    let bytes = s.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return Err(SafeStringError::NotAnId);
    };
    let well_formed = bytes.len() >= 3
        && bytes.len() <= MAX_STRING_LENGTH
        && is_word(*first)
        && is_word(*last)
        && bytes.iter().all(|b| is_word(*b) || *b == b'-');

    if well_formed {
        Ok(())
    } else {
        Err(SafeStringError::NotAnId)
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True when `keyword` occurs in `haystack` immediately followed by ASCII
/// whitespace.
fn keyword_then_space(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(at, _)| {
        haystack
            .as_bytes()
            .get(at + keyword.len())
            .is_some_and(u8::is_ascii_whitespace)
    })
}
