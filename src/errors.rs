use thiserror::Error;

/// Everything that can end a `/tldr` invocation early.
///
/// Every variant is user-facing: the `Display` text is what the user sees in
/// the followup reply (prefixed with an ❌ by the gateway layer). Nothing here
/// is retried; each failure terminates the single command invocation.
#[derive(Debug, Error)]
pub enum TldrError {
    /// One of the time arguments failed to parse. The message already names
    /// the offending input verbatim.
    #[error("{0}")]
    BadTimeFormat(String),

    #[error("Start time cannot be more than {0} days ago.")]
    RangeTooWide(i64),

    #[error(
        "End time must be more recent than start time. \
         For example: `start:1h end:5m` (1 hour ago to 5 minutes ago)"
    )]
    InvertedRange,

    #[error(
        "No messages found to summarize. \
         Make sure there are recent messages from users (not bots) in this channel."
    )]
    NoMessages,

    #[error(
        "Failed to generate summary. The AI returned an empty response. \
         Please try again."
    )]
    EmptySummary,

    /// The gateway refused to hand over channel history. Rendered with
    /// context-specific guidance (DM vs. guild) by the gateway layer.
    #[error("missing permission to read message history")]
    PermissionDenied,

    /// Anything else that went wrong between fetch and delivery.
    #[error("{0}")]
    Unexpected(String),
}
