//! Discord gateway: slash-command registration, channel-history retrieval,
//! and reply delivery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    Colour, Command, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateEmbed, CreateEmbedFooter, CreateInteractionResponseFollowup,
    EventHandler, GatewayIntents, GetMessages, Interaction, Message, MessageId, Ready,
    ResolvedValue, Timestamp,
};
use serenity::http::HttpError;
use serenity::model::application::{InstallationContext, InteractionContext};
use tracing::{error, info};

use crate::ai::GeminiClient;
use crate::config::AppConfig;
use crate::errors::TldrError;
use crate::models::{ChatMessage, ReplyPlan, SummaryRequest};
use crate::summarize::{self, MessageSource};
use crate::timerange::TimeWindow;

const COMMAND_NAME: &str = "tldr";

/// Discord returns at most 100 messages per history request.
const HISTORY_PAGE_SIZE: u8 = 100;

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

pub struct Handler {
    config: AppConfig,
    gemini: GeminiClient,
}

impl Handler {
    pub fn new(config: AppConfig) -> Self {
        let gemini = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
        Self { config, gemini }
    }
}

/// Connect to the gateway and run until the process is stopped.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_bot_token.clone();
    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(Handler::new(config))
        .await?;

    client.start().await?;
    Ok(())
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Logged in as {} (ID: {})",
            ready.user.name,
            ready.user.id
        );
        info!("Connected to {} guild(s)", ready.guilds.len());

        match Command::create_global_command(&ctx.http, build_tldr_command()).await {
            Ok(_) => info!("Slash commands synced"),
            Err(err) => error!("Failed to register /{COMMAND_NAME}: {err}"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        if command.data.name != COMMAND_NAME {
            return;
        }

        // Acknowledge immediately with a "thinking" indicator; the rest of
        // the flow runs long-latency network calls.
        if let Err(err) = command.defer(&ctx.http).await {
            error!("Failed to defer interaction: {err}");
            return;
        }

        let req = parse_request(&command);
        let source = ChannelHistorySource {
            http: ctx.http.clone(),
            channel_id: command.channel_id,
        };

        let result = summarize::handle(&self.config, &source, &self.gemini, &req).await;

        let followup = match result {
            Ok(plan) => {
                let block_count = plan.blocks.len();
                let followup =
                    CreateInteractionResponseFollowup::new().embeds(render_embeds(&plan));
                info!(
                    "Summary ready for channel {} ({} embed(s))",
                    command.channel_id, block_count
                );
                followup
            }
            Err(err) => {
                if matches!(err, TldrError::Unexpected(_)) {
                    error!("Error generating summary: {err}");
                }
                CreateInteractionResponseFollowup::new()
                    .content(render_error(&err, command.guild_id.is_some()))
            }
        };

        if let Err(err) = command.create_followup(&ctx.http, followup).await {
            error!("Failed to send followup: {err}");
        }
    }
}

fn build_tldr_command() -> CreateCommand {
    CreateCommand::new(COMMAND_NAME)
        .description("Get a summary of messages in this channel within a time range")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "start",
                "How far back to start (e.g., '1h', '30m', '2d'). Default: 1h",
            )
            .required(false),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "end",
                "How far back to end (e.g., '5m', '0m'). Default: 0m (now)",
            )
            .required(false),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "focus",
                "Custom focus for the summary (e.g., 'technical decisions, code changes')",
            )
            .required(false),
        )
        .integration_types(vec![InstallationContext::Guild, InstallationContext::User])
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::BotDm,
            InteractionContext::PrivateChannel,
        ])
}

fn parse_request(command: &CommandInteraction) -> SummaryRequest {
    let mut req = SummaryRequest {
        start: "1h".to_string(),
        end: "0m".to_string(),
        focus: None,
    };

    for option in command.data.options() {
        if let ResolvedValue::String(value) = option.value {
            match option.name {
                "start" => req.start = value.to_string(),
                "end" => req.end = value.to_string(),
                "focus" => req.focus = Some(value.to_string()),
                _ => {}
            }
        }
    }

    req
}

fn render_embeds(plan: &ReplyPlan) -> Vec<CreateEmbed> {
    plan.blocks
        .iter()
        .map(|block| {
            let mut embed = CreateEmbed::new()
                .description(block.description.clone())
                .colour(Colour::BLUE);
            if let Some(title) = &block.title {
                embed = embed.title(title.clone());
            }
            if let Some(footer) = &block.footer {
                embed = embed.footer(CreateEmbedFooter::new(footer.clone()));
            }
            embed
        })
        .collect()
}

/// Map a handler error to the text of the followup reply.
fn render_error(err: &TldrError, in_guild: bool) -> String {
    match err {
        TldrError::PermissionDenied => {
            if in_guild {
                "❌ I don't have permission to read messages in this channel.\n\
                 Make sure I have the **Read Message History** permission."
                    .to_string()
            } else {
                "❌ I don't have permission to read messages here.\n\n\
                 **For DMs/Group DMs:** Make sure you've authorized the bot with the \
                 `dm_channels.messages.read` scope. You may need to re-authorize the bot."
                    .to_string()
            }
        }
        TldrError::Unexpected(msg) => {
            format!("❌ An error occurred while generating the summary: {msg}")
        }
        other => format!("❌ {other}"),
    }
}

/// Fetches channel history through the Discord REST API, paging forward from
/// the window's start boundary so the oldest in-window messages are kept
/// when the window holds more than the fetch cap.
pub struct ChannelHistorySource {
    pub http: Arc<serenity::http::Http>,
    pub channel_id: serenity::all::ChannelId,
}

#[async_trait]
impl MessageSource for ChannelHistorySource {
    async fn messages_in_window(
        &self,
        window: &TimeWindow,
        max: usize,
    ) -> Result<Vec<ChatMessage>, TldrError> {
        let mut collected = Vec::new();
        let mut cursor = MessageId::new(snowflake_at(window.start));

        loop {
            let page = self
                .channel_id
                .messages(
                    &self.http,
                    GetMessages::new().after(cursor).limit(HISTORY_PAGE_SIZE),
                )
                .await
                .map_err(map_gateway_error)?;

            // Pages arrive newest first; the first entry is the next cursor.
            let Some(newest) = page.first() else {
                break;
            };
            cursor = newest.id;

            let page_len = page.len();
            let oldest_first: Vec<ChatMessage> = page.iter().rev().map(to_chat_message).collect();
            let done = extend_in_window(&mut collected, oldest_first, window, max);

            if done || page_len < HISTORY_PAGE_SIZE as usize {
                break;
            }
        }

        Ok(collected)
    }
}

/// Append the in-window part of one oldest-first page to `collected`, up to
/// `max` messages in total. Returns true once pagination can stop: either a
/// message at or past the window's end was seen, or the cap is full and the
/// oldest in-window messages are already taken.
fn extend_in_window(
    collected: &mut Vec<ChatMessage>,
    page_oldest_first: Vec<ChatMessage>,
    window: &TimeWindow,
    max: usize,
) -> bool {
    for msg in page_oldest_first {
        if msg.created_at <= window.start {
            continue;
        }
        if msg.created_at >= window.end {
            return true;
        }
        if collected.len() >= max {
            return true;
        }
        collected.push(msg);
    }
    false
}

/// The smallest snowflake a message created at `instant` could carry.
fn snowflake_at(instant: DateTime<Utc>) -> u64 {
    let ms_since_discord_epoch = (instant.timestamp_millis() - DISCORD_EPOCH_MS).max(1);
    (ms_since_discord_epoch as u64) << 22
}

/// Window boundaries carry sub-second precision, so message times must keep
/// their milliseconds; flooring to whole seconds would drop messages created
/// within the same second as the start boundary.
fn datetime_from(ts: &Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(DateTime::UNIX_EPOCH)
}

fn to_chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        author: msg
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| msg.author.name.clone()),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        created_at: datetime_from(&msg.timestamp),
    }
}

fn map_gateway_error(err: serenity::Error) -> TldrError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 403 =>
        {
            TldrError::PermissionDenied
        }
        _ => TldrError::Unexpected(err.to_string()),
    }
}
