//! Summary blocks and the text rendering around them.
//!
//! A [`SummaryBlock`] is the compressed representation of one
//! compression-window-sized range of history. This module also renders the
//! three pieces of text the compression path needs: the transcript fed to
//! the summarizer, the instruction prompt wrapped around it, and the digest
//! of all blocks injected into the context view.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::conversation::Message;

/// Instruction wrapped around the transcript of a block being summarized.
const SUMMARY_INSTRUCTION: &str =
    "Create a short summary of the following dialogue, preserving the key facts, decisions, and conclusions:";

/// Cue that closes the summarization prompt.
const SUMMARY_CUE: &str = "Summary (2-3 sentences):";

/// Header of the digest message carrying all summaries.
const DIGEST_HEADER: &str = "Summary of the earlier conversation:";

/// Compressed representation of a contiguous range of history messages.
///
/// Blocks are produced in order; their source ranges never overlap and
/// always lie before the recent-window boundary at the time of creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBlock {
    /// Message-index range `[start, end)` in the full history this block
    /// replaces.
    pub source_range: Range<usize>,

    /// Summary text, verbatim from the gateway.
    pub text: String,
}

impl SummaryBlock {
    /// Creates a summary block.
    #[must_use]
    pub const fn new(source_range: Range<usize>, text: String) -> Self {
        Self { source_range, text }
    }

    /// Returns how many messages the block replaces.
    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.source_range.end - self.source_range.start
    }

    /// Checks whether the block covers the given history index.
    #[must_use]
    pub fn covers(&self, index: usize) -> bool {
        self.source_range.contains(&index)
    }
}

/// Renders messages as `"<role>: <content>"` lines, one per message.
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    let mut transcript = String::new();
    for message in messages {
        transcript.push_str(message.role.as_str());
        transcript.push_str(": ");
        transcript.push_str(&message.content);
        transcript.push('\n');
    }
    transcript
}

/// Wraps a transcript in the fixed summarization instruction.
#[must_use]
pub fn summary_prompt(transcript: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{transcript}\n{SUMMARY_CUE}")
}

/// Concatenates all blocks into the digest text for the context view.
///
/// Each block is prefixed with its 1-based index. Returns `None` when there
/// are no blocks, in which case no digest message should be emitted at all.
#[must_use]
pub fn render_digest(blocks: &[SummaryBlock]) -> Option<String> {
    if blocks.is_empty() {
        return None;
    }
    let mut digest = String::from(DIGEST_HEADER);
    digest.push('\n');
    for (i, block) in blocks.iter().enumerate() {
        digest.push_str(&format!("[Block {}]: {}\n", i + 1, block.text));
    }
    Some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_summary_block_message_count() {
        let block = SummaryBlock::new(10..20, "summary".to_string());
        assert_eq!(block.message_count(), 10);
    }

    #[test]
    fn test_summary_block_covers() {
        let block = SummaryBlock::new(10..20, "summary".to_string());
        assert!(block.covers(10));
        assert!(block.covers(19));
        assert!(!block.covers(20));
        assert!(!block.covers(9));
    }

    #[test]
    fn test_render_transcript() {
        let messages = vec![
            Message::new(Role::User, "What is Rust?"),
            Message::new(Role::Assistant, "A systems language."),
        ];
        assert_eq!(
            render_transcript(&messages),
            "user: What is Rust?\nassistant: A systems language.\n"
        );
    }

    #[test]
    fn test_render_transcript_empty() {
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn test_summary_prompt_shape() {
        let prompt = summary_prompt("user: hi\n");
        assert!(prompt.starts_with("Create a short summary"));
        assert!(prompt.contains("\n\nuser: hi\n\n"));
        assert!(prompt.ends_with("Summary (2-3 sentences):"));
    }

    #[test]
    fn test_render_digest_empty() {
        assert!(render_digest(&[]).is_none());
    }

    #[test]
    fn test_render_digest_indexes_blocks() {
        let blocks = vec![
            SummaryBlock::new(0..10, "first part".to_string()),
            SummaryBlock::new(10..20, "second part".to_string()),
        ];
        let digest = render_digest(&blocks).unwrap();
        assert_eq!(
            digest,
            "Summary of the earlier conversation:\n[Block 1]: first part\n[Block 2]: second part\n"
        );
    }

    #[test]
    fn test_summary_block_serde() {
        let block = SummaryBlock::new(0..10, "compressed".to_string());
        let json = serde_json::to_string(&block).unwrap();
        let back: SummaryBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
