//! Background workers.
//!
//! A worker owns copies of its inputs, does the blocking work on its own
//! thread and sends everything the user should see as [`Event`]s. The
//! receiving thread is the only one that touches the section store.

use std::path::PathBuf;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::Result;
use crate::assemble::assemble;
use crate::import::{ChatTransport, ImportOutcome, import_sections};
use crate::progress::{Milestone, Notifier};
use crate::request::DocumentRequest;
use crate::settings::ApiSettings;

/// A user-visible effect of a background operation.
#[derive(Debug)]
pub enum Event {
    /// A log line.
    Log(String),
    /// A progress update.
    Progress(Milestone),
    /// The operation failed; progress is reset.
    Failed(String),
    /// Document assembly finished.
    Assembled(Result<PathBuf>),
    /// An import finished.
    Imported(Result<ImportOutcome>),
}

/// Forwards notifications into a channel.
///
/// Send errors mean the receiver is gone; the events are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: Sender<Event>,
}

impl ChannelNotifier {
    /// Creates a notifier sending to `sender`.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn log(&self, msg: &str) {
        log::info!("{msg}");
        let _ = self.sender.send(Event::Log(msg.to_owned()));
    }

    fn progress(&self, milestone: Milestone) {
        let _ = self.sender.send(Event::Progress(milestone));
    }

    fn failed(&self, msg: &str) {
        log::error!("{msg}");
        let _ = self.sender.send(Event::Failed(msg.to_owned()));
    }
}

/// Assembles `request` on a background thread.
pub fn spawn_assembly(request: DocumentRequest, sender: Sender<Event>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let notifier = ChannelNotifier::new(sender.clone());
        let result = assemble(&request, &notifier);
        let _ = sender.send(Event::Assembled(result));
    })
}

/// Imports `text` on a background thread.
pub fn spawn_import<T>(
    transport: T,
    api: ApiSettings,
    text: String,
    sender: Sender<Event>,
) -> JoinHandle<()>
where
    T: ChatTransport + Send + 'static,
{
    std::thread::spawn(move || {
        let notifier = ChannelNotifier::new(sender.clone());
        let result = import_sections(&transport, &api, &text, &notifier);
        if let Err(err) = &result {
            notifier.failed(&format!("import failed: {err}"));
        }
        let _ = sender.send(Event::Imported(result));
    })
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::import::{ChatRequest, Reply, TransportError};
    use crate::section::{ImportMode, SectionStore};
    use crate::style::StyleConfig;

    struct Fixed(u16, &'static str);

    impl ChatTransport for Fixed {
        fn send(
            &self,
            _endpoint: &str,
            _key: &str,
            _request: &ChatRequest,
        ) -> std::result::Result<Reply, TransportError> {
            Ok(Reply {
                status: self.0,
                body: self.1.to_owned(),
            })
        }
    }

    #[test]
    fn assembly_events_end_with_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = SectionStore::with_sample();
        let req = DocumentRequest::new(dir.path().join("out"), "T", &store, &StyleConfig::default());

        let (tx, rx) = unbounded();
        spawn_assembly(req, tx).join().unwrap();

        let events: Vec<_> = rx.iter().collect();
        let percents: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Progress(m) => Some(m.percent()),
                _ => None,
            })
            .collect();
        assert_eq!(percents.first(), Some(&20));
        assert_eq!(percents.last(), Some(&100));
        match events.last() {
            Some(Event::Assembled(Ok(path))) => assert!(path.exists()),
            other => panic!("unexpected last event {other:?}"),
        }
    }

    #[test]
    fn import_result_is_applied_on_the_receiving_thread() {
        let body = r#"{"choices":[{"message":{"content":"```json\n[{\"level\":1,\"title\":\"T\",\"content\":\"C\"}]\n```"}}]}"#;
        let api = ApiSettings {
            key: "sk-test".into(),
            ..ApiSettings::default()
        };

        let (tx, rx) = unbounded();
        spawn_import(Fixed(200, body), api, "text".into(), tx)
            .join()
            .unwrap();

        let mut store = SectionStore::new();
        for event in rx.iter() {
            if let Event::Imported(result) = event {
                let outcome = result.unwrap();
                store.extend(outcome.sections, ImportMode::Replace);
            }
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].title, "T");
    }

    #[test]
    fn rejected_import_reports_failure() {
        let api = ApiSettings {
            key: "sk-test".into(),
            ..ApiSettings::default()
        };

        let (tx, rx) = unbounded();
        spawn_import(Fixed(401, "{}"), api, "text".into(), tx)
            .join()
            .unwrap();

        let events: Vec<_> = rx.iter().collect();
        assert!(events.iter().any(|e| matches!(e, Event::Failed(..))));
        assert!(matches!(events.last(), Some(Event::Imported(Err(..)))));
    }
}
