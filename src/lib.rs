//! TLDR - A Discord bot that summarizes channel messages using Gemini.
//!
//! A user runs `/tldr start:2h end:5m` in a channel; the bot fetches the
//! messages written between those two instants, asks Gemini for a
//! bullet-point summary, and replies with the summary split across up to
//! ten embeds.
//!
//! # Architecture
//!
//! The system uses:
//! - serenity for the Discord gateway and slash-command handling
//! - reqwest for the Gemini `generateContent` API
//! - Tokio for the async runtime
//!
//! The command flow itself lives in [`summarize::handle`], behind the
//! [`summarize::MessageSource`] and [`summarize::Summarizer`] traits so it
//! can be exercised without a live gateway.

pub mod ai;
pub mod bot;
pub mod chunker;
pub mod config;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod summarize;
pub mod timerange;

/// Configure structured logging for the bot process.
///
/// Should be called once at startup, before the gateway connects.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
