//! Encoding law: parse(serialize(L)) == L

use formzone_ledger::{Comment, Ledger};
use proptest::prelude::*;

fn comment_strategy() -> impl Strategy<Value = Comment> {
    (
        1u32..50,
        "[a-zA-Z0-9_:|\\\\ ]{0,12}",
        "[a-zA-Z0-9 .,:;|!'\\\\-]{0,40}",
        any::<bool>(),
    )
        .prop_map(|(page, field, message, escalated)| Comment {
            page,
            field,
            message,
            escalated,
        })
}

proptest! {
    #[test]
    fn parse_inverts_serialize(comments in proptest::collection::vec(comment_strategy(), 0..8)) {
        let ledger: Ledger = comments.into_iter().collect();
        let text = ledger.serialize();
        let parsed = Ledger::parse(&text).unwrap();
        prop_assert_eq!(parsed, ledger);
    }

    #[test]
    fn append_is_idempotent(comments in proptest::collection::vec(comment_strategy(), 0..8)) {
        let mut ledger: Ledger = comments.clone().into_iter().collect();
        let before = ledger.clone();
        for comment in comments {
            prop_assert!(!ledger.append(comment));
        }
        prop_assert_eq!(ledger, before);
    }
}

#[test]
fn plain_entries_from_older_batches_decode() {
    let ledger = Ledger::parse("P1: q3: Value '12' not found in lookup list. | P2: total: check").unwrap();
    let fields: Vec<_> = ledger.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec!["q3", "total"]);
}
