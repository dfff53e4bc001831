//! Pure unread-count helpers over fetched conversation lists.

use vitrine_shared::models::Conversation;
use vitrine_shared::types::{ConversationId, UserId};

/// Total unread messages for `me` across `conversations`.
///
/// A conversation without an entry for `me` contributes zero.
pub fn compute_total(conversations: &[Conversation], me: &UserId) -> u32 {
    conversations.iter().map(|c| c.unread_for(me)).sum()
}

/// Per-conversation unread counts for `me`, as fed to the message ledger.
pub fn unread_by_conversation<'a>(
    conversations: &'a [Conversation],
    me: &'a UserId,
) -> impl Iterator<Item = (ConversationId, u32)> + 'a {
    conversations.iter().map(move |c| (c.id.clone(), c.unread_for(me)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn conv(id: &str, unread: &[(&str, u32)]) -> Conversation {
        Conversation {
            id: ConversationId::new(id),
            participants: vec![UserId::new("u1"), UserId::new("s1")],
            shop: None,
            last_message: None,
            unread_count: unread
                .iter()
                .map(|(u, n)| (UserId::new(*u), *n))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn sums_only_my_entries() {
        let list = vec![conv("a", &[("u1", 3)]), conv("b", &[("u1", 0)])];
        assert_eq!(compute_total(&list, &UserId::new("u1")), 3);
    }

    #[test]
    fn missing_entry_counts_as_zero() {
        let list = vec![
            conv("a", &[("u1", 2), ("s1", 9)]),
            conv("b", &[("s1", 4)]),
            conv("c", &[]),
        ];
        assert_eq!(compute_total(&list, &UserId::new("u1")), 2);
        assert_eq!(compute_total(&list, &UserId::new("s1")), 13);
        assert_eq!(compute_total(&[], &UserId::new("u1")), 0);
    }

    #[test]
    fn total_is_idempotent() {
        let list = vec![conv("a", &[("u1", 5)]), conv("b", &[("u1", 1)])];
        let me = UserId::new("u1");
        assert_eq!(compute_total(&list, &me), compute_total(&list, &me));
    }

    #[test]
    fn per_conversation_counts_match_total() {
        let list = vec![conv("a", &[("u1", 5)]), conv("b", &[])];
        let me = UserId::new("u1");
        let counts: Vec<_> = unread_by_conversation(&list, &me).collect();
        assert_eq!(
            counts,
            vec![(ConversationId::new("a"), 5), (ConversationId::new("b"), 0)]
        );
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<u32>(), compute_total(&list, &me));
    }
}
