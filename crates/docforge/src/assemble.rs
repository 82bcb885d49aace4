//! The document assembler.
//!
//! Assembly runs in phases over an [`ir::Document`]: page setup, styles,
//! header logo, title, table of contents, body and save. Every phase
//! reports a [`Milestone`]; the file is written once, after the document is
//! packed in memory, so a failed build never leaves a partial file behind.

use std::path::PathBuf;

use crate::error::prelude::*;
use crate::ir;
use crate::progress::{Milestone, Notifier};
use crate::request::DocumentRequest;
use crate::writer::DocxWriter;

/// Logged after saving: page numbers of the table of contents are computed
/// by the word processor.
pub const UPDATE_FIELDS_REMINDER: &str = "the table of contents is filled in by the word processor: \
     open the document and update fields (F9) to compute page numbers";

/// Builds the document of `req` and writes it to `req.output`.
///
/// Failures are reported through [`Notifier::failed`] and returned.
pub fn assemble(req: &DocumentRequest, notifier: &dyn Notifier) -> Result<PathBuf> {
    match Assembler::new(req, notifier).run() {
        Ok(path) => Ok(path),
        Err(err) => {
            notifier.failed(&format!("document generation failed: {err}"));
            Err(err)
        }
    }
}

struct Assembler<'a> {
    req: &'a DocumentRequest,
    notifier: &'a dyn Notifier,
    doc: ir::Document,
    writer: DocxWriter,
}

impl<'a> Assembler<'a> {
    fn new(req: &'a DocumentRequest, notifier: &'a dyn Notifier) -> Self {
        Self {
            req,
            notifier,
            doc: ir::Document::from_request(req),
            writer: DocxWriter::new(),
        }
    }

    fn reached(&self, milestone: Milestone) {
        self.notifier.progress(milestone);
    }

    fn run(mut self) -> Result<PathBuf> {
        self.req.validate()?;
        self.notifier.log(&format!(
            "generating {} with {} sections",
            self.req.output.display(),
            self.req.sections.len()
        ));

        self.page_setup();
        self.styles();
        self.logo();
        self.title();
        self.toc();
        self.body();
        self.save()
    }

    fn page_setup(&mut self) {
        self.writer.page_setup(&self.doc.page);
        self.reached(Milestone::PageSetup);
    }

    fn styles(&mut self) {
        for style in &self.doc.styles {
            self.writer.style(style);
            self.reached(Milestone::StyleCreated(style.role));
        }
    }

    fn logo(&mut self) {
        let Some(logo) = &self.doc.logo else {
            log::debug!("assemble: no logo configured");
            return;
        };

        if self.writer.header_logo(logo) {
            self.notifier
                .log(&format!("added logo {}", logo.path.display()));
        } else {
            self.notifier.log(&format!(
                "logo {} could not be used, continuing without it",
                logo.path.display()
            ));
        }
    }

    fn title(&mut self) {
        match &self.doc.title {
            Some(title) => self.writer.block(title),
            None => log::debug!("assemble: blank title omitted"),
        }
        self.reached(Milestone::TitleWritten);
    }

    fn toc(&mut self) {
        for block in &self.doc.toc {
            self.writer.block(block);
        }
        self.reached(Milestone::TocInserted);
    }

    fn body(&mut self) {
        for block in &self.doc.body {
            self.writer.block(block);
        }
        self.reached(Milestone::BodyWritten);
    }

    fn save(self) -> Result<PathBuf> {
        let output = self.req.output.clone();
        let bytes = self.writer.finish()?;
        std::fs::write(&output, bytes).context("assemble.save")?;

        self.notifier
            .log(&format!("document saved to {}", output.display()));
        self.notifier.log(UPDATE_FIELDS_REMINDER);
        self.notifier.progress(Milestone::Saved);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrKind;
    use crate::progress::tests::Recorder;
    use crate::section::SectionStore;
    use crate::style::{Role, StyleConfig};

    fn store() -> SectionStore {
        let mut store = SectionStore::new();
        store.add(1, "A", "x\n\ny").unwrap();
        store
    }

    #[test]
    fn writes_a_docx_and_reports_every_milestone() {
        let dir = tempfile::tempdir().unwrap();
        let req = DocumentRequest::new(
            dir.path().join("report"),
            "T",
            &store(),
            &StyleConfig::default(),
        );

        let recorder = Recorder::default();
        let path = assemble(&req, &recorder).unwrap();
        assert_eq!(path, dir.path().join("report.docx"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let mut expected = vec![Milestone::PageSetup];
        expected.extend(Role::ALL.map(Milestone::StyleCreated));
        expected.extend([
            Milestone::TitleWritten,
            Milestone::TocInserted,
            Milestone::BodyWritten,
            Milestone::Saved,
        ]);
        assert_eq!(*recorder.milestones.borrow(), expected);
        assert!(recorder.failures.borrow().is_empty());
        assert_eq!(
            recorder.logs.borrow().last().map(String::as_str),
            Some(UPDATE_FIELDS_REMINDER)
        );
    }

    #[test]
    fn empty_store_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.docx");
        let req = DocumentRequest::new(&out, "T", &SectionStore::new(), &StyleConfig::default());

        let recorder = Recorder::default();
        let err = assemble(&req, &recorder).unwrap_err();
        assert!(err.is_validation());
        assert!(!out.exists());
        assert!(recorder.milestones.borrow().is_empty());
        assert_eq!(recorder.failures.borrow().len(), 1);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("out.docx");
        let req = DocumentRequest::new(&out, "T", &store(), &StyleConfig::default());

        let recorder = Recorder::default();
        let err = assemble(&req, &recorder).unwrap_err();
        assert!(matches!(err.kind(), ErrKind::Io(..)));
        assert!(!out.exists());
        assert!(!recorder.milestones.borrow().contains(&Milestone::Saved));
    }

    #[test]
    fn missing_logo_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut style = StyleConfig::default();
        style.logo.enabled = true;
        style.logo.path = dir.path().join("nope.png");

        let req = DocumentRequest::new(dir.path().join("out"), "T", &store(), &style);
        let recorder = Recorder::default();
        assemble(&req, &recorder).unwrap();
        assert!(
            recorder
                .logs
                .borrow()
                .iter()
                .any(|l| l.contains("continuing without it"))
        );
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");
        std::fs::write(&out, b"old").unwrap();

        let req = DocumentRequest::new(&out, "T", &store(), &StyleConfig::default());
        assemble(&req, &crate::progress::DummyNotifier).unwrap();
        assert!(std::fs::read(&out).unwrap().starts_with(b"PK"));
    }
}
