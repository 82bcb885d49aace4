//! The AI import adapter.
//!
//! Pasted text is sent to an OpenAI-compatible chat-completion endpoint
//! together with a fixed instruction. The reply is expected to carry a
//! fenced JSON array of `{level, title, content}` objects, which become
//! [`SectionDraft`]s. Failed attempts are retried per [`RetryPolicy`].

pub mod client;
pub mod parse;
pub mod prompt;
pub mod retry;

pub use client::{ChatRequest, ChatTransport, HttpTransport, Reply, TransportError};
pub use parse::SkippedItem;
pub use retry::{AttemptError, RetryPolicy, Sleep, ThreadSleep};

use crate::error::prelude::*;
use crate::progress::Notifier;
use crate::section::SectionDraft;
use crate::settings::ApiSettings;

/// The result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The sections to load into the store.
    pub sections: Vec<SectionDraft>,
    /// Elements of the reply that were not usable.
    pub skipped: Vec<SkippedItem>,
    /// How many requests were sent.
    pub attempts: u32,
}

/// Imports `text` with the default retry policy, sleeping on the current
/// thread between attempts.
pub fn import_sections(
    transport: &dyn ChatTransport,
    api: &ApiSettings,
    text: &str,
    notifier: &dyn Notifier,
) -> Result<ImportOutcome> {
    Importer {
        transport,
        policy: RetryPolicy::default(),
        sleep: &ThreadSleep,
        notifier,
    }
    .run(api, text)
}

/// An import with explicit retry policy and sleeper.
pub struct Importer<'a> {
    /// Sends requests.
    pub transport: &'a dyn ChatTransport,
    /// Decides on retries.
    pub policy: RetryPolicy,
    /// Waits between attempts.
    pub sleep: &'a dyn Sleep,
    /// Receives log lines.
    pub notifier: &'a dyn Notifier,
}

impl Importer<'_> {
    /// Runs the import.
    pub fn run(&self, api: &ApiSettings, text: &str) -> Result<ImportOutcome> {
        if api.key.trim().is_empty() {
            return Err(Error::validation(
                "import",
                "no API key configured, set one in the settings",
            ));
        }
        if text.trim().is_empty() {
            return Err(Error::validation("import", "there is no text to import"));
        }

        let request = ChatRequest::import(api, text);
        let mut index = 0;
        loop {
            self.notifier.log(&format!(
                "sending request to {} (attempt {}/{})",
                api.endpoint,
                index + 1,
                self.policy.max_attempts
            ));

            let err = match self.attempt(api, &request) {
                Ok(items) => {
                    let (sections, skipped) = parse::to_drafts(items);
                    self.notifier.log(&format!(
                        "received {} sections, skipped {}",
                        sections.len(),
                        skipped.len()
                    ));
                    return Ok(ImportOutcome {
                        sections,
                        skipped,
                        attempts: index + 1,
                    });
                }
                Err(err) => err,
            };

            match self.policy.next_delay(index, &err) {
                Some(delay) => {
                    self.notifier.log(&format!(
                        "attempt {} failed: {err}; retrying in {:.1}s",
                        index + 1,
                        delay.as_secs_f32()
                    ));
                    self.sleep.sleep(delay);
                    index += 1;
                }
                None => return Err(Self::give_up(index + 1, err)),
            }
        }
    }

    fn attempt(
        &self,
        api: &ApiSettings,
        request: &ChatRequest,
    ) -> std::result::Result<Vec<serde_json::Value>, AttemptError> {
        let reply = self
            .transport
            .send(&api.endpoint, &api.key, request)
            .map_err(|err| match err {
                TransportError::Timeout(msg) => AttemptError::Timeout(msg),
                TransportError::Network(msg) => AttemptError::Network(msg),
            })?;

        match reply.status {
            200..=299 => {}
            status @ 400..=499 => {
                return Err(AttemptError::Client {
                    status,
                    detail: reply.detail(),
                });
            }
            status @ 500.. => {
                return Err(AttemptError::Server {
                    status,
                    detail: reply.detail(),
                });
            }
            status => {
                return Err(AttemptError::Network(format!(
                    "unexpected status {status}"
                )));
            }
        }

        let content = reply.content().ok_or(AttemptError::EmptyContent)?;
        parse::parse_content(&content)
    }

    fn give_up(attempts: u32, err: AttemptError) -> Error {
        let kind = match err {
            AttemptError::Client { status, detail } => ErrKind::Client {
                status,
                detail: detail.into(),
            },
            err => ErrKind::Network(_eco_format!("{err} (after {attempts} attempts)")),
        };
        Error::new("import", kind)
    }
}
