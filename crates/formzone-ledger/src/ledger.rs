//! Ordered comment ledger for one document record

use crate::codec;
use crate::comment::Comment;
use crate::error::LedgerError;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Ordered, de-duplicated comments of one record
///
/// Arrival order is preserved; two comments with the same
/// `(page, field, message)` triple never coexist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    comments: Vec<Comment>,
}

impl Ledger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
        }
    }

    /// Decode a ledger string
    ///
    /// # Errors
    ///
    /// [`LedgerError::Serialization`] for malformed input.
    pub fn parse(text: &str) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for comment in codec::decode(text)? {
            ledger.append(comment);
        }
        Ok(ledger)
    }

    /// Encode as `P<page>: <field>: <message>` entries joined by ` | `
    #[must_use]
    pub fn serialize(&self) -> String {
        codec::encode(&self.comments)
    }

    /// Append unless the triple is already present
    ///
    /// Returns `true` when the comment was inserted.
    pub fn append(&mut self, comment: Comment) -> bool {
        if self.position(&comment).is_some() {
            return false;
        }
        debug!(page = comment.page, field = %comment.field, "comment appended");
        self.comments.push(comment);
        true
    }

    /// Replace `old` in place, keeping its escalation flag
    ///
    /// The flag on `new` is ignored; only [`Ledger::mark_escalated`] and
    /// [`Ledger::clear_escalation`] change it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when `old` is absent,
    /// [`LedgerError::Duplicate`] when `new` already exists elsewhere.
    pub fn edit(&mut self, old: &Comment, new: Comment) -> Result<(), LedgerError> {
        let index = self
            .position(old)
            .ok_or_else(|| LedgerError::NotFound(old.to_string()))?;
        if let Some(other) = self.position(&new) {
            if other != index {
                return Err(LedgerError::Duplicate(new.to_string()));
            }
        }
        let escalated = self.comments[index].escalated;
        self.comments[index] = Comment { escalated, ..new };
        Ok(())
    }

    /// Remove by triple
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when the comment is absent.
    pub fn remove(&mut self, comment: &Comment) -> Result<Comment, LedgerError> {
        let index = self
            .position(comment)
            .ok_or_else(|| LedgerError::NotFound(comment.to_string()))?;
        Ok(self.comments.remove(index))
    }

    /// Mark an existing comment escalated
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when the comment is absent.
    pub fn mark_escalated(&mut self, comment: &Comment) -> Result<(), LedgerError> {
        let index = self
            .position(comment)
            .ok_or_else(|| LedgerError::NotFound(comment.to_string()))?;
        self.comments[index].escalated = true;
        Ok(())
    }

    /// Clear every escalation flag, returning how many were set
    pub fn clear_escalation(&mut self) -> usize {
        let mut cleared = 0;
        for comment in &mut self.comments {
            if comment.escalated {
                comment.escalated = false;
                cleared += 1;
            }
        }
        cleared
    }

    /// Any comment marked escalated
    #[must_use]
    pub fn has_escalation(&self) -> bool {
        self.comments.iter().any(|c| c.escalated)
    }

    /// Contains the triple
    #[inline]
    #[must_use]
    pub fn contains(&self, comment: &Comment) -> bool {
        self.position(comment).is_some()
    }

    /// Comments on one page, in order
    pub fn for_page(&self, page: u32) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| c.page == page)
    }

    /// All comments, in order
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    /// Number of comments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Check if ledger is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    fn position(&self, comment: &Comment) -> Option<usize> {
        self.comments.iter().position(|c| c.same_triple(comment))
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Ledger {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromIterator<Comment> for Ledger {
    fn from_iter<I: IntoIterator<Item = Comment>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for comment in iter {
            ledger.append(comment);
        }
        ledger
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Comment;
    type IntoIter = std::slice::Iter<'a, Comment>;

    fn into_iter(self) -> Self::IntoIter {
        self.comments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_dedupes_by_triple_not_position() {
        let mut ledger = Ledger::new();
        assert!(ledger.append(Comment::new(1, "a", "x")));
        assert!(ledger.append(Comment::new(2, "a", "x")));
        assert!(!ledger.append(Comment::new(1, "a", "x")));
        assert!(!ledger.append(Comment::new(1, "a", "x").into_escalated()));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn edit_in_place_keeps_order_and_flag() {
        let mut ledger: Ledger = [
            Comment::new(1, "a", "x"),
            Comment::new(1, "b", "y"),
        ]
        .into_iter()
        .collect();
        ledger.mark_escalated(&Comment::new(1, "a", "x")).unwrap();

        ledger
            .edit(&Comment::new(1, "a", "x"), Comment::new(1, "a", "x2"))
            .unwrap();
        let first = ledger.iter().next().unwrap();
        assert_eq!(first.message, "x2");
        assert!(first.escalated);

        let err = ledger
            .edit(&Comment::new(1, "a", "x2"), Comment::new(1, "b", "y"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate(_)));
    }

    #[test]
    fn edit_cannot_raise_flag() {
        let mut ledger: Ledger = [Comment::new(1, "a", "x")].into_iter().collect();

        ledger
            .edit(&Comment::new(1, "a", "x"), Comment::new(1, "a", "x2").into_escalated())
            .unwrap();

        assert!(!ledger.has_escalation());
        assert_eq!(ledger.iter().next().unwrap().message, "x2");
    }

    #[test]
    fn remove_and_not_found() {
        let mut ledger = Ledger::new();
        ledger.append(Comment::new(1, "a", "x"));
        let removed = ledger.remove(&Comment::new(1, "a", "x")).unwrap();
        assert_eq!(removed.field, "a");
        assert!(matches!(
            ledger.remove(&Comment::new(1, "a", "x")),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn escalation_flags() {
        let mut ledger = Ledger::new();
        ledger.append(Comment::new(1, "a", "x"));
        ledger.append(Comment::new(2, "b", "y").into_escalated());
        assert!(ledger.has_escalation());
        assert_eq!(ledger.clear_escalation(), 1);
        assert!(!ledger.has_escalation());
    }

    #[test]
    fn for_page_filters() {
        let ledger: Ledger = [
            Comment::new(1, "a", "x"),
            Comment::new(2, "b", "y"),
            Comment::new(1, "c", "z"),
        ]
        .into_iter()
        .collect();
        let fields: Vec<_> = ledger.for_page(1).map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "c"]);
    }

    #[test]
    fn parse_collapses_duplicate_entries() {
        let ledger = Ledger::parse("P1: a: x | P1: a: x | P2: b: y").unwrap();
        assert_eq!(ledger.serialize(), "P1: a: x | P2: b: y");
    }
}
