//! Typed HTTP client for the backend.
//!
//! One method per backend operation; each builds the path, query, and body
//! and delegates to a shared `reqwest::Client` pointed at a fixed origin.
//! There is no retry policy and no backoff, so a failed request surfaces once
//! to the caller. Mount-scoped reads take a cancellation token and resolve
//! to [`ApiError::Cancelled`] instead of being swallowed, so callers can
//! drop stale completions without treating them as failures.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::api::{
    AckResponse, AskRequest, AskResponse, ChatRecord, LoginRequest, LoginResponse, SignupRequest,
};
use crate::core::bot::{Bot, BotDraft};
use crate::utils::url::{construct_api_url, normalize_base_url};

#[derive(Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body decode).
    Http(reqwest::Error),
    /// The backend answered with a non-success status.
    Status { status: StatusCode, detail: String },
    /// The request was abandoned via its cancellation token.
    Cancelled,
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(source) => write!(f, "request failed: {source}"),
            ApiError::Status { status, detail } => {
                write!(f, "server returned {status}: {detail}")
            }
            ApiError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

/// Normalized result of a history fetch. Consumers treat a transport or
/// backend failure exactly like a valid empty response, with the reason kept
/// for logging; only cancellation is re-signaled to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryFetch {
    Loaded(Vec<ChatRecord>),
    Failed(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        construct_api_url(&self.base_url, endpoint)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<AckResponse, ApiError> {
        let response = self
            .http
            .post(self.url("auth/signup"))
            .json(request)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(self.url("auth/login"))
            .json(request)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn create_bot(
        &self,
        user_id: &str,
        draft: BotDraft,
    ) -> Result<AckResponse, ApiError> {
        let form = bot_form(user_id, draft);
        let response = self
            .http
            .post(self.url("bots/createbot"))
            .multipart(form)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn update_bot(
        &self,
        bot_id: &str,
        user_id: &str,
        draft: BotDraft,
    ) -> Result<AckResponse, ApiError> {
        let form = bot_form(user_id, draft);
        let response = self
            .http
            .put(self.url(&format!("bots/{bot_id}")))
            .multipart(form)
            .send()
            .await?;
        decode_json(response).await
    }

    /// Fetch one bot's profile. Abandoned cleanly when `cancel` fires.
    pub async fn bot(&self, bot_id: &str, cancel: &CancellationToken) -> Result<Bot, ApiError> {
        let request = self.http.get(self.url(&format!("bots/{bot_id}")));
        with_cancellation(cancel, async move {
            let response = request.send().await?;
            decode_json(response).await
        })
        .await
    }

    pub async fn my_bots(&self, user_id: &str) -> Result<Vec<Bot>, ApiError> {
        let response = self
            .http
            .get(self.url("bots/my"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn public_bots(&self) -> Result<Vec<Bot>, ApiError> {
        let response = self.http.get(self.url("bots/public")).send().await?;
        decode_json(response).await
    }

    pub async fn ask(
        &self,
        user_id: &str,
        bot_id: &str,
        message: &str,
    ) -> Result<AskResponse, ApiError> {
        let request = AskRequest {
            user_id: user_id.to_string(),
            bot_id: bot_id.to_string(),
            message: message.to_string(),
        };
        let response = self
            .http
            .post(self.url("chat/ask"))
            .json(&request)
            .send()
            .await?;
        decode_json(response).await
    }

    /// Fetch chat history, normalized per [`HistoryFetch`]. The only error
    /// this returns is [`ApiError::Cancelled`].
    pub async fn history(
        &self,
        user_id: &str,
        bot_id: &str,
        cancel: &CancellationToken,
    ) -> Result<HistoryFetch, ApiError> {
        let request = self
            .http
            .get(self.url("chat/history"))
            .query(&[("user_id", user_id), ("bot_id", bot_id)]);
        let outcome = with_cancellation(cancel, async move {
            let response = request.send().await?;
            decode_json::<Vec<ChatRecord>>(response).await
        })
        .await;

        match outcome {
            Ok(records) => Ok(HistoryFetch::Loaded(records)),
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(err) => Ok(HistoryFetch::Failed(err.to_string())),
        }
    }

    /// Clear persisted history for one user/bot pair. Restart and delete in
    /// the UI are the same operation against `DELETE /chat/restart`.
    pub async fn restart_history(&self, user_id: &str, bot_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url("chat/restart"))
            .query(&[("user_id", user_id), ("bot_id", bot_id)])
            .send()
            .await?;
        decode_json::<AckResponse>(response).await?;
        Ok(())
    }
}

fn bot_form(user_id: &str, draft: BotDraft) -> Form {
    let mut form = Form::new()
        .text("user_id", user_id.to_string())
        .text("name", draft.name)
        .text("bio", draft.bio)
        .text("first_message", draft.first_message)
        .text("situation", draft.situation)
        .text("back_story", draft.back_story)
        .text("personality", draft.personality)
        .text("chatting_way", draft.chatting_way)
        .text("type_of_bot", draft.type_of_bot)
        .text("privacy", draft.privacy.as_str());

    if let Some(avatar) = draft.avatar {
        form = form.part("avatar", Part::bytes(avatar.bytes).file_name(avatar.file_name));
    }

    form
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(ApiError::Status { status, detail });
    }
    Ok(response.json::<T>().await?)
}

async fn with_cancellation<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        // An already-cancelled token must win even when the request would
        // fail immediately, so stale loads never masquerade as failures.
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}
