//! Single-string ledger encoding
//!
//! ```text
//! P1: q1: illegible | !P2: total: does not add up
//! ```
//!
//! Entries are joined by ` | `. A leading `!` marks an escalated comment.
//! Backslash escapes `\` and `|` anywhere, and `:` inside field names, so
//! any ledger decodes back to itself.
//!
//! Older ledgers are read too: the space after either colon may be missing,
//! and an entry without a second colon is a field with an empty message.

use crate::comment::Comment;
use crate::error::LedgerError;

const SEPARATOR: &str = " | ";
const ESCALATED_MARK: char = '!';

/// Encode comments into the ledger string
#[must_use]
pub fn encode(comments: &[Comment]) -> String {
    let mut out = String::new();
    for (i, comment) in comments.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        if comment.escalated {
            out.push(ESCALATED_MARK);
        }
        out.push('P');
        out.push_str(&comment.page.to_string());
        out.push_str(": ");
        escape_into(&mut out, &comment.field, true);
        out.push_str(": ");
        escape_into(&mut out, &comment.message, false);
    }
    out
}

/// Decode a ledger string
///
/// # Errors
///
/// [`LedgerError::Serialization`] naming the first malformed entry.
pub fn decode(text: &str) -> Result<Vec<Comment>, LedgerError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let pieces = split_entries(text)?;
    let last = pieces.len() - 1;
    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let mut entry = piece.as_str();
            if i > 0 {
                entry = entry.strip_prefix(' ').unwrap_or(entry);
            }
            if i < last {
                entry = entry.strip_suffix(' ').unwrap_or(entry);
            }
            decode_entry(i + 1, entry)
        })
        .collect()
}

fn escape_into(out: &mut String, text: &str, is_field: bool) {
    for c in text.chars() {
        if c == '\\' || c == '|' || (is_field && c == ':') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Split on unescaped `|`, keeping escapes intact
fn split_entries(text: &str) -> Result<Vec<String>, LedgerError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let next = chars.next().ok_or_else(|| {
                    LedgerError::serialization(pieces.len() + 1, current.clone(), "dangling escape")
                })?;
                current.push('\\');
                current.push(next);
            }
            '|' => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    pieces.push(current);
    Ok(pieces)
}

fn decode_entry(index: usize, entry: &str) -> Result<Comment, LedgerError> {
    let fail = |reason| LedgerError::serialization(index, entry, reason);

    let (escalated, rest) = match entry.strip_prefix(ESCALATED_MARK) {
        Some(rest) => (true, rest),
        None => (false, entry),
    };
    let rest = rest.strip_prefix('P').ok_or_else(|| fail("expected 'P<page>'"))?;
    let (page, rest) = rest.split_once(':').ok_or_else(|| fail("missing ':' after page"))?;
    let page: u32 = page.parse().map_err(|_| fail("page is not a number"))?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);

    let mut field = String::new();
    let mut chars = rest.char_indices();
    let mut message_start = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => field.push(escaped),
                None => return Err(fail("dangling escape")),
            },
            ':' => {
                message_start = Some(i + 1);
                break;
            }
            _ => field.push(c),
        }
    }
    let message = match message_start {
        Some(start) => {
            let message = &rest[start..];
            message.strip_prefix(' ').unwrap_or(message)
        }
        None => "",
    };

    Ok(Comment {
        page,
        field,
        message: unescape(message),
        escalated,
    })
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
