//! Compression statistics.
//!
//! Pure derivations over history and summaries; computing stats never
//! mutates manager state. Token counts use a fixed characters-per-token
//! ratio, not a real tokenizer.

use serde::Serialize;

use super::CHARS_PER_TOKEN;
use super::summary::SummaryBlock;
use crate::conversation::Message;

/// Estimates the token count of a text.
///
/// Byte length divided by [`CHARS_PER_TOKEN`]. A deliberate approximation
/// kept for parity with the accounting the rest of the crate reports; do not
/// use it where exact token counts matter.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Snapshot of compression effectiveness for one manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextStats {
    /// Messages in the full history.
    pub total_messages: usize,

    /// Summary blocks produced so far.
    pub compressed_blocks: usize,

    /// Messages in the uncompressed recent tail.
    pub recent_messages: usize,

    /// Estimated tokens of the full history.
    pub original_tokens: usize,

    /// Estimated tokens of the compressed context (summaries + recent tail).
    /// Equals `original_tokens` while no summary exists.
    pub compressed_tokens: usize,

    /// `compressed_tokens / original_tokens` (0 for an empty history).
    pub compression_ratio: f64,

    /// `original_tokens - compressed_tokens`; negative when summaries are
    /// longer than the messages they replaced.
    pub tokens_saved: i64,

    /// Percentage of estimated tokens saved; 0 while no summary exists.
    pub compression_percent: f64,
}

impl ContextStats {
    /// Computes statistics for the given history, summaries, and recent
    /// window.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn compute(history: &[Message], summaries: &[SummaryBlock], recent_window: usize) -> Self {
        let total_messages = history.len();
        let compressed_blocks = summaries.len();
        let recent_messages = total_messages.min(recent_window);

        let original_tokens: usize = history
            .iter()
            .map(|message| estimate_tokens(&message.content))
            .sum();

        // With no summary nothing has been compressed yet; reporting the
        // recent tail alone would show phantom savings.
        let compressed_tokens = if summaries.is_empty() {
            original_tokens
        } else {
            let summary_tokens: usize = summaries
                .iter()
                .map(|block| estimate_tokens(&block.text))
                .sum();
            let tail_start = total_messages - recent_messages;
            let tail_tokens: usize = history[tail_start..]
                .iter()
                .map(|message| estimate_tokens(&message.content))
                .sum();
            summary_tokens + tail_tokens
        };

        let (tokens_saved, compression_ratio, compression_percent) = if original_tokens == 0 {
            (0, 0.0, 0.0)
        } else {
            let saved = original_tokens as i64 - compressed_tokens as i64;
            let ratio = compressed_tokens as f64 / original_tokens as f64;
            (saved, ratio, (1.0 - ratio) * 100.0)
        };

        Self {
            total_messages,
            compressed_blocks,
            recent_messages,
            original_tokens,
            compressed_tokens,
            compression_ratio,
            tokens_saved,
            compression_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    fn message(content: &str) -> Message {
        Message::new(Role::User, content)
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("ab"), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("a".repeat(30).as_str()), 10);
    }

    #[test]
    fn test_estimate_tokens_uses_byte_length() {
        // Multi-byte characters count per byte, like the heuristic always has.
        assert_eq!(estimate_tokens("äöü"), 2);
    }

    #[test]
    fn test_stats_empty_history() {
        let stats = ContextStats::compute(&[], &[], 6);
        assert_eq!(stats, ContextStats::default());
    }

    #[test]
    fn test_stats_without_summaries_report_no_savings() {
        let history: Vec<Message> = (0..15).map(|_| message("x".repeat(30).as_str())).collect();
        let stats = ContextStats::compute(&history, &[], 6);

        assert_eq!(stats.total_messages, 15);
        assert_eq!(stats.compressed_blocks, 0);
        assert_eq!(stats.recent_messages, 6);
        assert_eq!(stats.original_tokens, 150);
        assert_eq!(stats.compressed_tokens, 150);
        assert_eq!(stats.tokens_saved, 0);
        assert!((stats.compression_percent - 0.0).abs() < f64::EPSILON);
        assert!((stats.compression_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_with_summary() {
        // 16 messages of 10 estimated tokens each; one block of the first 10
        // replaced by a 30-byte summary (10 estimated tokens).
        let history: Vec<Message> = (0..16).map(|_| message("x".repeat(30).as_str())).collect();
        let summaries = vec![SummaryBlock::new(0..10, "s".repeat(30))];
        let stats = ContextStats::compute(&history, &summaries, 6);

        assert_eq!(stats.original_tokens, 160);
        // 10 summary tokens + 6 tail messages * 10 tokens.
        assert_eq!(stats.compressed_tokens, 70);
        assert_eq!(stats.tokens_saved, 90);
        assert!((stats.compression_ratio - 0.4375).abs() < 1e-9);
        assert!((stats.compression_percent - 56.25).abs() < 1e-9);
    }

    #[test]
    fn test_stats_negative_savings() {
        // A summary longer than its source inflates the context.
        let history: Vec<Message> = (0..8).map(|_| message("abc")).collect();
        let summaries = vec![SummaryBlock::new(0..4, "y".repeat(300))];
        let stats = ContextStats::compute(&history, &summaries, 4);

        assert_eq!(stats.original_tokens, 8);
        assert_eq!(stats.compressed_tokens, 104);
        assert_eq!(stats.tokens_saved, -96);
        assert!(stats.compression_percent < 0.0);
    }

    #[test]
    fn test_stats_recent_messages_capped_by_history() {
        let history: Vec<Message> = (0..3).map(|_| message("abc")).collect();
        let stats = ContextStats::compute(&history, &[], 6);
        assert_eq!(stats.recent_messages, 3);
    }

    #[test]
    fn test_stats_serializable() {
        let stats = ContextStats::compute(&[message("abcdef")], &[], 6);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_messages"], 1);
        assert_eq!(json["original_tokens"], 2);
    }
}
