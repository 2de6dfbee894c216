use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::prompt::validate_template;

/// Discord caps an embed description at 4096 characters.
pub const EMBED_DESC_LIMIT: usize = 4096;
/// Discord caps a single message at 10 embeds.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MAX_MESSAGES: usize = 10_000;
const DEFAULT_MAX_TIME_RANGE_DAYS: i64 = 3;

/// Default focus areas for the summary, substituted into `{focus}` when the
/// user does not supply one.
const DEFAULT_FOCUS: &str = "\
Analyze the following Discord messages and provide a clear, concise summary in bullet points.
Focus on:
- Key topics discussed
- Important decisions or conclusions
- Notable questions asked
- Any action items mentioned

Format your response as bullet points. Be concise but capture the essential information.
If the conversation is very short or trivial, still provide a brief summary.";

/// Prompt template. Must contain exactly one `{focus}` slot and exactly one
/// `{messages}` slot.
const SUMMARY_PROMPT: &str = "\
You are a helpful assistant that summarizes Discord chat conversations.
{focus}
Messages are formatted as \"Username\": \"Message content\" and are in chronological order (oldest first).

---
MESSAGES:
{messages}
---

Provide your bullet-point summary:";

/// Process-wide configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_bot_token: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Maximum messages to fetch within the time range.
    pub max_messages: usize,
    /// Maximum allowed span from "now" back to the window start, in days.
    pub max_time_range_days: i64,
    pub default_focus: String,
    pub summary_prompt: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            discord_bot_token: required_env("DISCORD_BOT_TOKEN")?,
            gemini_api_key: required_env("GEMINI_API_KEY")?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            max_messages: optional_env("MAX_MESSAGES", DEFAULT_MAX_MESSAGES)?,
            max_time_range_days: optional_env("MAX_TIME_RANGE_DAYS", DEFAULT_MAX_TIME_RANGE_DAYS)?,
            default_focus: env::var("DEFAULT_FOCUS").unwrap_or_else(|_| DEFAULT_FOCUS.to_string()),
            summary_prompt: env::var("SUMMARY_PROMPT")
                .unwrap_or_else(|_| SUMMARY_PROMPT.to_string()),
        };

        validate_template(&config.summary_prompt).map_err(|e| format!("SUMMARY_PROMPT: {e}"))?;

        Ok(config)
    }

    /// A config filled with defaults and dummy credentials, for tests.
    pub fn for_tests() -> Self {
        Self {
            discord_bot_token: "dummy_token".to_string(),
            gemini_api_key: "dummy_key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            max_messages: DEFAULT_MAX_MESSAGES,
            max_time_range_days: DEFAULT_MAX_TIME_RANGE_DAYS,
            default_focus: DEFAULT_FOCUS.to_string(),
            summary_prompt: SUMMARY_PROMPT.to_string(),
        }
    }
}

/// An unset or empty required variable halts startup with a diagnostic
/// naming the key.
fn required_env(key: &str) -> Result<String, String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("missing required environment variable: {key}")),
    }
}

fn optional_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|e| format!("{key}: {e}")),
        Err(_) => Ok(default),
    }
}
