use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{Notifier, SecretSource};
use crate::workflow::processors::alert::AlertPayload;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Deserialize)]
struct TokenSecret {
    slack_api_token: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the bot token from the secret's JSON body.
pub fn parse_token_secret(raw: &str) -> Result<String> {
    let secret: TokenSecret =
        serde_json::from_str(raw).context("secret is not a {\"slack_api_token\": ...} object")?;
    if secret.slack_api_token.trim().is_empty() {
        bail!("slack_api_token is empty");
    }
    Ok(secret.slack_api_token)
}

/// Posts alerts to one channel; the token is read from the secret on every alert.
pub struct SlackNotifier {
    http: reqwest::Client,
    secrets: Arc<dyn SecretSource>,
    secret_id: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(
        http: reqwest::Client,
        secrets: Arc<dyn SecretSource>,
        secret_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            http,
            secrets,
            secret_id: secret_id.into(),
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<()> {
        let raw = self
            .secrets
            .secret_string(&self.secret_id)
            .await
            .context("failed to fetch Slack token")?;
        let token = parse_token_secret(&raw)?;

        let response: PostMessageResponse = self
            .http
            .post(POST_MESSAGE_URL)
            .bearer_auth(token)
            .json(&json!({
                "channel": self.channel,
                "text": payload.render(),
            }))
            .send()
            .await
            .context("failed to reach Slack")?
            .error_for_status()
            .context("Slack returned an error status")?
            .json()
            .await
            .context("failed to parse Slack response")?;

        if !response.ok {
            bail!(
                "Slack rejected the message: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(())
    }
}
