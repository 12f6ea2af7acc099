//! Conversation history with a bounded window of cache-marked turns.
//!
//! The manager owns the ordered list of prior turns for one experiment and
//! decides, turn by turn, which entries carry a cache marker. Under the
//! sliding-window policy the marker set is FIFO-bounded: when appending a new
//! marker would exceed capacity, the oldest marked turn loses its marker
//! first, so the bound holds at every point in time. History itself is never
//! truncated; entries are only mutated in place to clear markers.

use crate::cache::models::CachePolicy;
use crate::models::{ContentBlock, Message};
use std::collections::VecDeque;

/// The outgoing message list for one turn, plus the user turn to hand back
/// to [`ConversationCache::commit`] once the reply arrives.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub messages: Vec<Message>,
    pub user_turn: Message,
}

/// Per-experiment conversation state.
#[derive(Debug)]
pub struct ConversationCache {
    policy: CachePolicy,
    history: Vec<Message>,
    /// History indices of turns currently carrying a marker, oldest first.
    window: VecDeque<usize>,
}

impl ConversationCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            history: Vec::new(),
            window: VecDeque::new(),
        }
    }

    /// Build the outgoing message list for a turn: full history plus a newly
    /// constructed user turn. Turn 0 carries the document as its first
    /// segment; the question segment is marked cache-eligible under any
    /// caching policy. Eviction of the oldest marked turn happens here,
    /// before the new marker exists.
    pub fn build_request(
        &mut self,
        turn_index: usize,
        question: &str,
        document: Option<&str>,
    ) -> TurnRequest {
        if let CachePolicy::SlidingWindow { capacity } = self.policy {
            if self.window.len() >= capacity {
                if let Some(oldest) = self.window.pop_front() {
                    self.history[oldest].clear_cache_markers();
                }
            }
        }

        let mut content = Vec::new();
        if turn_index == 0 {
            if let Some(text) = document {
                content.push(ContentBlock::text(text));
            }
        }
        let question_text = format!("{} ", question);
        content.push(match self.policy {
            CachePolicy::Disabled => ContentBlock::text(question_text),
            _ => ContentBlock::cached_text(question_text),
        });

        let user_turn = Message::user(content);
        let mut messages = self.history.clone();
        messages.push(user_turn.clone());

        TurnRequest {
            messages,
            user_turn,
        }
    }

    /// Append the completed exchange to history: the user turn as sent
    /// (marker intact under the sliding-window policy, stripped under
    /// latest-only) and an unmarked assistant turn holding the reply.
    pub fn commit(&mut self, user_turn: Message, reply_text: &str) {
        let mut stored = user_turn;
        if self.policy == CachePolicy::LatestTurn {
            stored.clear_cache_markers();
        }

        self.history.push(stored);
        if matches!(self.policy, CachePolicy::SlidingWindow { .. }) {
            self.window.push_back(self.history.len() - 1);
        }
        self.history.push(Message::assistant_text(reply_text));
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// History indices of currently marked turns, oldest first.
    pub fn window(&self) -> impl Iterator<Item = usize> + '_ {
        self.window.iter().copied()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn window_policy(capacity: usize) -> CachePolicy {
        CachePolicy::SlidingWindow { capacity }
    }

    fn run_turn(cache: &mut ConversationCache, turn: usize, document: Option<&str>) {
        let request = cache.build_request(turn, &format!("question {}", turn), document);
        cache.commit(request.user_turn, "reply");
    }

    #[test]
    fn test_document_only_in_first_turn() {
        let mut cache = ConversationCache::new(window_policy(4));

        let first = cache.build_request(0, "summarize", Some("the full play text"));
        assert_eq!(first.user_turn.content.len(), 2);
        assert_eq!(first.user_turn.content[0].as_text(), "the full play text");
        cache.commit(first.user_turn, "a summary");

        let second = cache.build_request(1, "who dies", None);
        assert_eq!(second.user_turn.content.len(), 1);
        // history + new turn
        assert_eq!(second.messages.len(), 3);
    }

    #[test]
    fn test_history_grows_two_per_turn() {
        let mut cache = ConversationCache::new(window_policy(4));
        for turn in 0..6 {
            run_turn(&mut cache, turn, (turn == 0).then_some("doc"));
            assert_eq!(cache.history().len(), 2 * (turn + 1));
        }
        let roles: Vec<Role> = cache.history().iter().map(|m| m.role).collect();
        assert!(roles
            .chunks(2)
            .all(|pair| pair == [Role::User, Role::Assistant]));
    }

    #[test]
    fn test_fifo_eviction_clears_oldest_marker() {
        let mut cache = ConversationCache::new(window_policy(4));
        for turn in 0..5 {
            run_turn(&mut cache, turn, (turn == 0).then_some("doc"));
        }

        // Fifth committed turn evicted the very first marker.
        assert!(!cache.history()[0].has_cache_marker());
        let marked_turns: Vec<usize> = cache.window().map(|idx| idx / 2).collect();
        assert_eq!(marked_turns, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ten_turn_window_sequence() {
        let mut cache = ConversationCache::new(window_policy(4));
        for turn in 0..10 {
            run_turn(&mut cache, turn, (turn == 0).then_some("doc"));
            assert!(cache.window_len() <= 4);
        }

        let marked_turns: Vec<usize> = cache.window().map(|idx| idx / 2).collect();
        assert_eq!(marked_turns, vec![6, 7, 8, 9]);
        // Exactly the windowed turns still carry markers in history.
        let marker_count = cache
            .history()
            .iter()
            .filter(|m| m.has_cache_marker())
            .count();
        assert_eq!(marker_count, 4);
    }

    #[test]
    fn test_latest_turn_policy_strips_on_commit() {
        let mut cache = ConversationCache::new(CachePolicy::LatestTurn);
        for turn in 0..3 {
            let request = cache.build_request(turn, "q", (turn == 0).then_some("doc"));
            assert!(request.user_turn.has_cache_marker());
            // Exactly one message in the outgoing list is marked.
            let marked = request
                .messages
                .iter()
                .filter(|m| m.has_cache_marker())
                .count();
            assert_eq!(marked, 1);
            cache.commit(request.user_turn, "reply");
        }
        assert!(cache.history().iter().all(|m| !m.has_cache_marker()));
        assert_eq!(cache.window_len(), 0);
    }

    #[test]
    fn test_disabled_policy_never_marks() {
        let mut cache = ConversationCache::new(CachePolicy::Disabled);
        for turn in 0..3 {
            let request = cache.build_request(turn, "q", (turn == 0).then_some("doc"));
            assert!(!request.user_turn.has_cache_marker());
            cache.commit(request.user_turn, "reply");
        }
        assert!(cache.history().iter().all(|m| !m.has_cache_marker()));
    }
}
