use chrono::{DateTime, Utc};

/// A single channel message as seen by the summarizer. Read-only; built from
/// the gateway's message type and discarded when the request completes.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub author: String,
    pub author_is_bot: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The raw arguments of one `/tldr` invocation.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// How far back the window starts, e.g. `"2h"`.
    pub start: String,
    /// How far back the window ends, e.g. `"5m"`. `"0m"` means "now".
    pub end: String,
    /// Custom focus for the summary; falls back to the configured default.
    pub focus: Option<String>,
}

/// One renderable display block of the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyBlock {
    /// Set on the first block only.
    pub title: Option<String>,
    pub description: String,
    /// Set on the last included block only.
    pub footer: Option<String>,
}

/// The ordered display blocks produced for one command invocation, delivered
/// as a single followup message.
#[derive(Debug, Clone)]
pub struct ReplyPlan {
    pub blocks: Vec<ReplyBlock>,
}
