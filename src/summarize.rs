//! One `/tldr` invocation end to end: validate the range, fetch, filter,
//! summarize, and lay the result out as display blocks.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

use crate::chunker::split_into_chunks;
use crate::config::{AppConfig, EMBED_DESC_LIMIT, MAX_EMBEDS_PER_MESSAGE};
use crate::errors::TldrError;
use crate::models::{ChatMessage, ReplyBlock, ReplyPlan, SummaryRequest};
use crate::prompt::{render_prompt, render_transcript};
use crate::timerange::{TimeWindow, parse_time_ago};

pub const SUMMARY_TITLE: &str = "📋 TL;DR Summary";

/// Footer focus text is cut at this many characters (code points).
const FOOTER_FOCUS_LIMIT: usize = 50;

/// Where the candidate messages come from. The production implementation
/// pages through Discord channel history; tests use an in-memory batch.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Messages created strictly inside `window`, at most `max` of them.
    /// Ordering is not guaranteed; the handler sorts defensively.
    async fn messages_in_window(
        &self,
        window: &TimeWindow,
        max: usize,
    ) -> Result<Vec<ChatMessage>, TldrError>;
}

/// The summarization service: prompt in, summary text out. May return empty
/// text instead of failing; the handler treats that as an error.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, TldrError>;
}

/// Run one summary request. Every early return is a user-facing
/// [`TldrError`]; on success the caller gets a [`ReplyPlan`] ready for
/// rendering.
pub async fn handle(
    cfg: &AppConfig,
    source: &dyn MessageSource,
    summarizer: &dyn Summarizer,
    req: &SummaryRequest,
) -> Result<ReplyPlan, TldrError> {
    let start_back =
        parse_time_ago(&req.start).map_err(|e| TldrError::BadTimeFormat(e.to_string()))?;
    let end_back = parse_time_ago(&req.end).map_err(|e| TldrError::BadTimeFormat(e.to_string()))?;

    // A configured bound too large for the duration type cannot be exceeded
    // by any parseable start duration, so it simply disables the check.
    if let Some(max_range) = Duration::try_days(cfg.max_time_range_days) {
        if start_back > max_range {
            return Err(TldrError::RangeTooWide(cfg.max_time_range_days));
        }
    }
    if end_back >= start_back {
        return Err(TldrError::InvertedRange);
    }

    let window = TimeWindow::ending_at(Utc::now(), start_back, end_back);

    let fetched = source.messages_in_window(&window, cfg.max_messages).await?;

    // Keep only human messages with visible content.
    let mut batch: Vec<ChatMessage> = fetched
        .into_iter()
        .filter(|msg| !msg.author_is_bot && !msg.content.trim().is_empty())
        .collect();

    if batch.is_empty() {
        return Err(TldrError::NoMessages);
    }

    // Gateway ordering is not guaranteed; sort oldest first.
    batch.sort_by_key(|msg| msg.created_at);

    let transcript = render_transcript(&batch);
    let focus = req.focus.as_deref().unwrap_or(&cfg.default_focus);
    let prompt = render_prompt(&cfg.summary_prompt, focus, &transcript);

    info!(
        "Generating summary for {} messages ({} → {})",
        batch.len(),
        req.start,
        req.end
    );

    let summary = summarizer.summarize(&prompt).await?;
    if summary.is_empty() {
        return Err(TldrError::EmptySummary);
    }

    Ok(build_reply_plan(
        &split_into_chunks(&summary, EMBED_DESC_LIMIT),
        batch.len(),
        req,
    ))
}

/// Lay the chunks out as display blocks: title on the first, footer on the
/// last included one. Chunks beyond the embed cap are dropped without notice.
fn build_reply_plan(chunks: &[String], message_count: usize, req: &SummaryRequest) -> ReplyPlan {
    let mut footer = format!(
        "Summarized {} messages • {} → {}",
        message_count, req.start, req.end
    );
    if let Some(focus) = &req.focus {
        let shortened: String = focus.chars().take(FOOTER_FOCUS_LIMIT).collect();
        let ellipsis = if focus.chars().count() > FOOTER_FOCUS_LIMIT {
            "..."
        } else {
            ""
        };
        footer.push_str(&format!(" • Focus: {shortened}{ellipsis}"));
    }

    let shown = chunks.len().min(MAX_EMBEDS_PER_MESSAGE);
    let blocks = chunks
        .iter()
        .take(MAX_EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| ReplyBlock {
            title: (i == 0).then(|| SUMMARY_TITLE.to_string()),
            description: chunk.clone(),
            footer: (i + 1 == shown).then(|| footer.clone()),
        })
        .collect();

    ReplyPlan { blocks }
}
