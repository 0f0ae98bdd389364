//! Request dispatch to the remote answer service

use async_trait::async_trait;
use url::Url;

use crate::prompt::{Answer, Prompt};
use crate::{Error, Result};

/// Path of the answer endpoint, relative to the service origin
pub const ANSWER_PATH: &str = "/api/gemini";

/// Sends one prompt and awaits one answer
///
/// Implementations never fail: any error is folded into [`Answer::Fallback`].
/// Callers are responsible for keeping at most one request outstanding.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Ask the answer service a question
    async fn ask(&self, prompt: &Prompt) -> Answer;
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<D> {
    async fn ask(&self, prompt: &Prompt) -> Answer {
        (**self).ask(prompt).await
    }
}

#[derive(serde::Serialize)]
struct AskRequest<'a> {
    prompt: &'a str,
}

/// Pass the reply's `text` field through without validating it
///
/// Any JSON body is accepted; a body without a usable `text` field (including
/// one that is not an object) reads as an empty answer.
fn reply_text(reply: serde_json::Value) -> String {
    match reply.get("text") {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Dispatcher backed by the HTTP answer endpoint
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpDispatcher {
    /// Create a dispatcher posting to `endpoint`
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Create a dispatcher for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not a valid absolute URL
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        Ok(Self::new(endpoint_url(base_url)?))
    }

    /// Endpoint this dispatcher posts to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, prompt: &Prompt) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, "sending prompt");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AskRequest {
                prompt: prompt.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Dispatch(format!("API error {status}: {body}")));
        }

        let reply: serde_json::Value = response.json().await?;
        Ok(reply_text(reply))
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn ask(&self, prompt: &Prompt) -> Answer {
        match self.request(prompt).await {
            Ok(text) => {
                tracing::info!(chars = text.len(), "answer received");
                Answer::Reply(text)
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching answer from backend");
                Answer::Fallback
            }
        }
    }
}

/// Resolve the answer endpoint against a service base URL
///
/// The endpoint path is absolute, so any path on `base_url` is replaced.
///
/// # Errors
///
/// Returns error if `base_url` is not a valid absolute URL
pub fn endpoint_url(base_url: &str) -> Result<Url> {
    let base: Url = base_url.parse()?;
    Ok(base.join(ANSWER_PATH)?)
}
