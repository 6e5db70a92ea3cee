//! Telegram Bot API transport
//!
//! Long polling over `getUpdates`, one `sendMessage` per reply chunk. Updates
//! are handed to a [`Dispatcher`], so a slow reply for one user never holds
//! up polling or other users.

use crate::bot::PortfolioBot;
use crate::dispatch::Dispatcher;
use crate::error::{BotError, Result};
use crate::interface::{ChatId, ChatTransport, IncomingMessage, split_message};
use async_trait::async_trait;
use folio_core::UserId;
use folio_utils::EnvSource;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Public Bot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Longest text `sendMessage` accepts
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram bot configuration
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub token: String,

    /// Bot API root
    pub api_url: String,

    /// Server-side long-poll timeout
    pub poll_timeout: Duration,

    /// Drop updates that queued up while the bot was offline
    pub skip_pending: bool,

    /// Pause after a failed poll
    pub retry_delay: Duration,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("skip_pending", &self.skip_pending)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl TelegramConfig {
    /// Configuration with default endpoint and timeouts
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            poll_timeout: Duration::from_secs(30),
            skip_pending: true,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Read `TELEGRAM_BOT_TOKEN` (or the legacy `API_TOKEN`) and optional
    /// `FOLIO_TELEGRAM_API_URL` / `FOLIO_POLL_TIMEOUT_SECS`
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let token = match env.var("TELEGRAM_BOT_TOKEN") {
            Some(token) => token,
            None => env.required("API_TOKEN").map_err(|_| {
                BotError::Config("TELEGRAM_BOT_TOKEN not set".to_string())
            })?,
        };

        let mut config = Self::new(token);
        if let Some(url) = env.var("FOLIO_TELEGRAM_API_URL") {
            config = config.with_api_url(url);
        }
        if let Some(secs) = env.parsed::<u64>("FOLIO_POLL_TIMEOUT_SECS")? {
            config = config.with_poll_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Use another Bot API server
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Server-side long-polling timeout
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Whether updates sent while the bot was offline are dropped
    pub fn with_skip_pending(mut self, skip: bool) -> Self {
        self.skip_pending = skip;
        self
    }

    /// Pause after a failed poll
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// `{api_url}/bot{token}/`, the base every method name is joined onto
    fn bot_url(&self) -> Result<Url> {
        let url = Url::parse(&format!(
            "{}/bot{}/",
            self.api_url.trim_end_matches('/'),
            self.token
        ))
        .map_err(|_| BotError::Config(format!("invalid Telegram API URL: {}", self.api_url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BotError::Config(format!(
                "Telegram API URL must be http(s): {}",
                self.api_url
            )));
        }
        Ok(url)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() || self.token.contains(char::is_whitespace) || self.token.contains('/') {
            return Err(BotError::Config("Telegram bot token is malformed".to_string()));
        }
        self.bot_url()?;
        Ok(())
    }
}

/// Envelope of every Bot API answer
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TgUser>,
    pub chat: TgChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

impl Update {
    /// Text message from a human sender, if this update carries one
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let from = message.from.filter(|user| !user.is_bot)?;
        let text = message.text?;
        Some(IncomingMessage::new(UserId(from.id), ChatId(message.chat.id), text))
    }
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Thin Bot API client
#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    bot_url: Url,
}

impl fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut api_url = self.bot_url.clone();
        api_url.set_path("/");
        f.debug_struct("TelegramApi")
            .field("api_url", &api_url.as_str())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramApi {
    /// Create a client for the configured Bot API endpoint
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        config.validate()?;

        // Leave room for the long poll on top of the server-side timeout
        let client = Client::builder()
            .timeout(config.poll_timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            bot_url: config.bot_url()?,
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.bot_url.join(method)?;
        let response = self.client.post(url).json(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let answer: ApiResponse<R> = serde_json::from_str(&body).map_err(|e| {
            debug!(method, %status, error = %e, "undecodable Bot API answer");
            BotError::Telegram {
                code: Some(i64::from(status.as_u16())),
                description: format!("undecodable answer to {method}"),
                retry_after: None,
            }
        })?;

        match answer {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                parameters,
                ..
            } => Err(BotError::Telegram {
                code: error_code,
                description: description.unwrap_or_else(|| format!("{method} failed")),
                retry_after: parameters.and_then(|p| p.retry_after),
            }),
        }
    }

    /// Identity of the bot behind the token
    pub async fn get_me(&self) -> Result<TgUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &params).await
    }

    /// Send `text`, split into chunks the API accepts
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<()> {
        let params = SendMessage {
            chat_id: chat.0,
            text,
        };
        let _: serde_json::Value = self.call("sendMessage", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_message(chat, &chunk).await?;
        }
        Ok(())
    }
}

/// Telegram bot
pub struct TelegramBot {
    config: TelegramConfig,
    api: Arc<TelegramApi>,
    dispatcher: Dispatcher,
}

impl TelegramBot {
    /// Create a new Telegram bot; mailboxes idle for `idle_after` are closed
    pub fn new(config: TelegramConfig, bot: Arc<PortfolioBot>, idle_after: Duration) -> Result<Self> {
        let api = Arc::new(TelegramApi::new(&config)?);
        let transport: Arc<dyn ChatTransport> = api.clone();
        let dispatcher = Dispatcher::new(bot, transport, idle_after);

        Ok(Self {
            config,
            api,
            dispatcher,
        })
    }

    /// Underlying Bot API client
    pub fn api(&self) -> &TelegramApi {
        &self.api
    }

    /// Poll until `shutdown` resolves, then finish the queued messages
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let me = self.api.get_me().await?;
        info!(username = ?me.username, id = me.id, "connected to Telegram");

        let mut offset = if self.config.skip_pending {
            self.skip_pending().await?
        } else {
            None
        };

        tokio::pin!(shutdown);
        loop {
            let polled = tokio::select! {
                () = &mut shutdown => break,
                polled = self.api.get_updates(offset, self.config.poll_timeout) => polled,
            };

            let pause = match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.route(update);
                    }
                    None
                }
                Err(BotError::Telegram {
                    retry_after: Some(secs),
                    ..
                }) => {
                    warn!(secs, "throttled by Telegram");
                    Some(Duration::from_secs(secs))
                }
                Err(e) => {
                    warn!(error = %e, "polling failed");
                    Some(self.config.retry_delay)
                }
            };

            if let Some(pause) = pause {
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        info!("stopping, draining mailboxes");
        self.dispatcher.shutdown().await;
        Ok(())
    }

    fn route(&self, update: Update) {
        let update_id = update.update_id;
        let Some(message) = update.into_incoming() else {
            debug!(update_id, "ignoring non-text update");
            return;
        };
        if let Err(e) = self.dispatcher.dispatch(message) {
            error!(update_id, error = %e, "failed to dispatch update");
        }
    }

    /// Acknowledge everything queued before start-up
    async fn skip_pending(&self) -> Result<Option<i64>> {
        let pending = self.api.get_updates(Some(-1), Duration::ZERO).await?;
        let offset = pending.last().map(|update| update.update_id + 1);
        if offset.is_some() {
            info!("skipped updates received while offline");
        }
        Ok(offset)
    }
}
