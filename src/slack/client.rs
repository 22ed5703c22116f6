//! Outbound Slack messaging over the Web API with a small buffered send queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiToken, SlackApiTokenType, SlackApiTokenValue,
    SlackChannelId, SlackClient, SlackClientHyperHttpsConnector, SlackMessageContent, SlackTs,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::{AppError, Result};

const QUEUE_CAPACITY: usize = 256;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 5;

/// Message to be delivered to Slack via chat.postMessage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackMessage {
    pub channel: SlackChannelId,
    pub text: String,
    pub thread_ts: Option<SlackTs>,
}

impl SlackMessage {
    /// Create a plain-text message for a channel.
    pub fn plain(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: SlackChannelId(channel.into()),
            text: text.into(),
            thread_ts: None,
        }
    }

    /// Post the message as a reply in the given thread.
    #[must_use]
    pub fn in_thread(mut self, thread_ts: Option<&str>) -> Self {
        self.thread_ts = thread_ts.map(|ts| SlackTs(ts.to_owned()));
        self
    }

    fn into_request(self) -> SlackApiChatPostMessageRequest {
        let content = SlackMessageContent {
            text: Some(self.text),
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
            markdown_text: None,
        };

        SlackApiChatPostMessageRequest {
            channel: self.channel,
            content,
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: self.thread_ts,
            username: None,
            reply_broadcast: None,
            unfurl_links: None,
            unfurl_media: None,
        }
    }
}

/// Destination for chat replies.
///
/// Implemented by [`SlackService`] in production and by recording doubles
/// in tests.
pub trait ChatNotifier: Send + Sync {
    /// Hand a message off for delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the message cannot be accepted.
    fn post(&self, message: SlackMessage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Slack Web API wrapper that owns a rate-limited outgoing queue.
pub struct SlackService {
    queue_tx: mpsc::Sender<SlackMessage>,
}

impl SlackService {
    /// Start the Slack client and background sender task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn start(bot_token: &str) -> Result<(Self, JoinHandle<()>)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let token = SlackApiToken {
            token_value: SlackApiTokenValue(bot_token.to_owned()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(client, token, queue_rx);

        info!("slack service started with buffered queue");

        Ok((Self { queue_tx }, queue_task))
    }

    /// Enqueue a message for async delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the sender task has stopped.
    pub async fn enqueue(&self, message: SlackMessage) -> Result<()> {
        self.queue_tx
            .send(message)
            .await
            .map_err(|err| AppError::Slack(format!("failed to enqueue slack message: {err}")))
    }

    fn spawn_worker(
        client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        token: SlackApiToken,
        mut queue_rx: mpsc::Receiver<SlackMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            while let Some(message) = queue_rx.recv().await {
                let channel = message.channel.0.clone();
                let request = message.into_request();
                let mut backoff = INITIAL_RETRY_DELAY;
                let mut attempt = 1;
                loop {
                    match session.chat_post_message(&request).await {
                        Ok(_) => {
                            info!(channel, "sent slack message");
                            break;
                        }
                        Err(error) if attempt >= MAX_SEND_ATTEMPTS => {
                            error!(?error, channel, attempt, "slack post failed; dropping message");
                            break;
                        }
                        Err(error) => {
                            let delay = match &error {
                                slack_morphism::errors::SlackClientError::RateLimitError(rate) => {
                                    rate.retry_after.unwrap_or(backoff)
                                }
                                _ => backoff,
                            };
                            warn!(?error, delay = ?delay, attempt, "slack post failed; retrying");
                            sleep(delay).await;
                            backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                            attempt += 1;
                        }
                    }
                }
            }
            info!("slack sender task exiting");
        })
    }
}

impl ChatNotifier for SlackService {
    fn post(&self, message: SlackMessage) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.enqueue(message))
    }
}
