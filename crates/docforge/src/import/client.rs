//! Chat-completion transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::prelude::*;
use crate::settings::ApiSettings;

use super::prompt::{SYSTEM_PROMPT, user_prompt};

/// Time allowed for one request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// The model identifier.
    pub model: String,
    /// The system and user messages.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f64,
}

impl ChatRequest {
    /// The request importing `text`.
    pub fn import(api: &ApiSettings, text: &str) -> Self {
        Self {
            model: api.model.clone(),
            messages: vec![
                Message::new("system", SYSTEM_PROMPT),
                Message::new("user", user_prompt(text)),
            ],
            temperature: 0.2,
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// `system` or `user`.
    pub role: String,
    /// The message text.
    pub content: String,
}

impl Message {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_owned(),
            content: content.into(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The raw answer of the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: String,
}

impl Reply {
    /// A reply with status 200.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// The message content of the first choice, if any.
    pub fn content(&self) -> Option<String> {
        let resp: ChatResponse = serde_json::from_str(&self.body).ok()?;
        let content = resp.choices.into_iter().next()?.message.content?;
        (!content.trim().is_empty()).then_some(content)
    }

    /// The error detail of a rejected request.
    ///
    /// OpenAI-compatible endpoints put it under `error.message`; anything
    /// else is returned as-is.
    pub fn detail(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_owned))
            .unwrap_or_else(|| self.body.trim().to_owned())
    }
}

/// A transport-level failure: no reply was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    Timeout(String),
    /// Connecting or reading failed.
    Network(String),
}

/// Sends chat completion requests.
pub trait ChatTransport {
    /// Posts `request` to `endpoint` with bearer token `key`.
    fn send(
        &self,
        endpoint: &str,
        key: &str,
        request: &ChatRequest,
    ) -> std::result::Result<Reply, TransportError>;
}

/// A [`ChatTransport`] over blocking HTTPS.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport with the default request timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::new("import.http", ErrKind::Network(e.to_string().into())))?;
        Ok(Self { client })
    }
}

impl ChatTransport for HttpTransport {
    fn send(
        &self,
        endpoint: &str,
        key: &str,
        request: &ChatRequest,
    ) -> std::result::Result<Reply, TransportError> {
        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                TransportError::Timeout(err.to_string())
            } else {
                TransportError::Network(err.to_string())
            }
        };

        let resp = self
            .client
            .post(endpoint)
            .bearer_auth(key)
            .json(request)
            .send()
            .map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(classify)?;
        log::debug!("import: {endpoint} answered {status} ({} bytes)", body.len());
        Ok(Reply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let api = ApiSettings {
            key: "sk-test".into(),
            ..ApiSettings::default()
        };
        let body = serde_json::to_value(ChatRequest::import(&api, "hello")).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(
            body["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("hello")
        );
    }

    #[test]
    fn content_of_reply() {
        let reply = Reply::ok(r#"{"choices":[{"message":{"content":"[]"}}]}"#);
        assert_eq!(reply.content().as_deref(), Some("[]"));

        assert_eq!(Reply::ok(r#"{"choices":[]}"#).content(), None);
        assert_eq!(
            Reply::ok(r#"{"choices":[{"message":{"content":"  "}}]}"#).content(),
            None
        );
        assert_eq!(Reply::ok("<html>").content(), None);
    }

    #[test]
    fn detail_of_rejection() {
        let reply = Reply {
            status: 401,
            body: r#"{"error":{"message":"Incorrect API key"}}"#.into(),
        };
        assert_eq!(reply.detail(), "Incorrect API key");

        let reply = Reply {
            status: 404,
            body: "not found\n".into(),
        };
        assert_eq!(reply.detail(), "not found");
    }
}
