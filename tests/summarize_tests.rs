use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tldr_bot::config::{AppConfig, MAX_EMBEDS_PER_MESSAGE};
use tldr_bot::errors::TldrError;
use tldr_bot::models::{ChatMessage, SummaryRequest};
use tldr_bot::summarize::{MessageSource, SUMMARY_TITLE, Summarizer, handle};
use tldr_bot::timerange::TimeWindow;

/// End-to-end scenarios for the command handler, run against in-memory
/// fakes for the gateway and the summarization service.

struct FakeSource {
    messages: Vec<ChatMessage>,
    fetches: AtomicUsize,
}

impl FakeSource {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    async fn messages_in_window(
        &self,
        _window: &TimeWindow,
        max: usize,
    ) -> Result<Vec<ChatMessage>, TldrError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.iter().take(max).cloned().collect())
    }
}

struct FakeSummarizer {
    reply: String,
    seen_prompt: Mutex<Option<String>>,
}

impl FakeSummarizer {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen_prompt: Mutex::new(None),
        }
    }

    fn seen_prompt(&self) -> String {
        self.seen_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, TldrError> {
        *self.seen_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn human(author: &str, content: &str, minutes_ago: i64) -> ChatMessage {
    ChatMessage {
        author: author.to_string(),
        author_is_bot: false,
        content: content.to_string(),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn automated(author: &str, content: &str, minutes_ago: i64) -> ChatMessage {
    ChatMessage {
        author_is_bot: true,
        ..human(author, content, minutes_ago)
    }
}

fn request(start: &str, end: &str, focus: Option<&str>) -> SummaryRequest {
    SummaryRequest {
        start: start.to_string(),
        end: end.to_string(),
        focus: focus.map(str::to_string),
    }
}

#[tokio::test]
async fn test_three_messages_produce_a_single_block_plan() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![
        human("alice", "let's ship it", 110),
        human("bob", "agreed", 100),
        human("carol", "done", 90),
    ]);
    let summarizer = FakeSummarizer::new("• The team agreed to ship.");

    let plan = handle(&cfg, &source, &summarizer, &request("2h", "1h", None))
        .await
        .expect("three qualifying messages should summarize");

    assert_eq!(plan.blocks.len(), 1);
    assert_eq!(plan.blocks[0].title.as_deref(), Some(SUMMARY_TITLE));
    assert_eq!(plan.blocks[0].description, "• The team agreed to ship.");

    let footer = plan.blocks[0].footer.as_deref().expect("footer on last block");
    assert!(footer.contains("Summarized 3 messages"), "got: {footer}");
    assert!(footer.contains("2h → 1h"), "got: {footer}");
}

#[tokio::test]
async fn test_inverted_range_fails_before_any_fetch() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hi", 30)]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("1h", "2h", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::InvertedRange));
    assert_eq!(source.fetch_count(), 0, "no gateway fetch should happen");
}

#[tokio::test]
async fn test_equal_start_and_end_counts_as_inverted() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("1h", "60m", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::InvertedRange));
}

#[tokio::test]
async fn test_range_wider_than_configured_max_is_rejected() {
    let cfg = AppConfig::for_tests(); // max range: 3 days
    let source = FakeSource::new(vec![human("alice", "hi", 30)]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("10d", "0m", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::RangeTooWide(3)));
    assert_eq!(source.fetch_count(), 0, "no gateway fetch should happen");
}

#[tokio::test]
async fn test_unrepresentable_max_range_does_not_panic() {
    // An absurd operator-supplied bound must not turn every command into a
    // panic; it cannot be exceeded, so requests inside it still work.
    let mut cfg = AppConfig::for_tests();
    cfg.max_time_range_days = i64::MAX;
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);
    let summarizer = FakeSummarizer::new("• summary");

    handle(&cfg, &source, &summarizer, &request("3d", "0m", None))
        .await
        .expect("a huge configured bound should not reject or panic");
}

#[tokio::test]
async fn test_malformed_time_argument_reports_it_verbatim() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("soon", "0m", None))
        .await
        .unwrap_err();

    match err {
        TldrError::BadTimeFormat(msg) => {
            assert!(msg.contains("`soon`"), "got: {msg}");
        }
        other => panic!("expected BadTimeFormat, got {other:?}"),
    }
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_no_qualifying_messages_after_fetch() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::NoMessages));
    assert_eq!(source.fetch_count(), 1, "the fetch should have been attempted");
}

#[tokio::test]
async fn test_bot_and_whitespace_messages_are_filtered_out() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![
        automated("botty", "beep boop", 50),
        human("alice", "   \n\t ", 40),
        human("bob", "actual content", 30),
    ]);
    let summarizer = FakeSummarizer::new("• Bob said something.");

    let plan = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .expect("one qualifying message remains");

    let prompt = summarizer.seen_prompt();
    assert!(prompt.contains("\"bob\""), "got: {prompt}");
    assert!(!prompt.contains("botty"), "bot messages must not reach the model");

    let footer = plan.blocks[0].footer.as_deref().unwrap();
    assert!(footer.contains("Summarized 1 messages"), "got: {footer}");
}

#[tokio::test]
async fn test_only_filtered_out_messages_count_as_none() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![
        automated("botty", "beep", 50),
        human("alice", "   ", 40),
    ]);
    let summarizer = FakeSummarizer::new("unused");

    let err = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::NoMessages));
}

#[tokio::test]
async fn test_messages_are_sorted_chronologically_for_the_prompt() {
    let cfg = AppConfig::for_tests();
    // Deliberately out of order.
    let source = FakeSource::new(vec![
        human("second", "2", 20),
        human("third", "3", 10),
        human("first", "1", 40),
    ]);
    let summarizer = FakeSummarizer::new("• ordered");

    handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .expect("should summarize");

    let prompt = summarizer.seen_prompt();
    let first = prompt.find("\"first\"").expect("first author in prompt");
    let second = prompt.find("\"second\"").expect("second author in prompt");
    let third = prompt.find("\"third\"").expect("third author in prompt");
    assert!(first < second && second < third, "oldest must come first");
}

#[tokio::test]
async fn test_empty_summary_from_the_service_is_an_error() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);
    let summarizer = FakeSummarizer::new("");

    let err = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .unwrap_err();

    assert!(matches!(err, TldrError::EmptySummary));
    assert_eq!(source.fetch_count(), 1, "fetch succeeds before the failure");
}

#[tokio::test]
async fn test_custom_focus_flows_into_prompt_and_footer() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);
    let summarizer = FakeSummarizer::new("• summary");

    let plan = handle(
        &cfg,
        &source,
        &summarizer,
        &request("1h", "0m", Some("decisions only")),
    )
    .await
    .expect("should summarize");

    assert!(summarizer.seen_prompt().contains("decisions only"));
    let footer = plan.blocks[0].footer.as_deref().unwrap();
    assert!(footer.contains("Focus: decisions only"), "got: {footer}");
    assert!(!footer.contains("..."), "short focus must not be truncated");
}

#[tokio::test]
async fn test_long_focus_is_truncated_in_the_footer() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);
    let summarizer = FakeSummarizer::new("• summary");

    let focus = "x".repeat(60);
    let plan = handle(&cfg, &source, &summarizer, &request("1h", "0m", Some(&focus)))
        .await
        .expect("should summarize");

    let footer = plan.blocks[0].footer.as_deref().unwrap();
    let expected = format!("Focus: {}...", "x".repeat(50));
    assert!(footer.contains(&expected), "got: {footer}");
}

#[tokio::test]
async fn test_default_focus_is_used_when_none_is_given() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);
    let summarizer = FakeSummarizer::new("• summary");

    let plan = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .expect("should summarize");

    assert!(summarizer.seen_prompt().contains("Key topics discussed"));
    let footer = plan.blocks[0].footer.as_deref().unwrap();
    assert!(!footer.contains("Focus:"), "default focus stays out of the footer");
}

#[tokio::test]
async fn test_oversized_summary_is_capped_at_the_embed_limit() {
    let cfg = AppConfig::for_tests();
    let source = FakeSource::new(vec![human("alice", "hello", 30)]);

    // Far more than ten embeds worth of line-structured text.
    let line = format!("{}\n", "s".repeat(80));
    let summarizer = FakeSummarizer::new(&line.repeat(700));

    let plan = handle(&cfg, &source, &summarizer, &request("1h", "0m", None))
        .await
        .expect("should summarize");

    assert_eq!(plan.blocks.len(), MAX_EMBEDS_PER_MESSAGE);
    assert!(plan.blocks[0].title.is_some(), "title on the first block");
    assert!(
        plan.blocks[1..].iter().all(|b| b.title.is_none()),
        "no title past the first block"
    );
    let last = plan.blocks.last().unwrap();
    assert!(last.footer.is_some(), "footer on the last included block");
    assert!(
        plan.blocks[..MAX_EMBEDS_PER_MESSAGE - 1]
            .iter()
            .all(|b| b.footer.is_none()),
        "footer only on the last block"
    );
}
