//! # docforge
//!
//! Assembles formatted DOCX documents from an ordered list of sections: a
//! title, multi-level headings with body text, a table of contents field and
//! an optional header logo. Sections can also be imported from pasted text
//! through an OpenAI-compatible chat-completion endpoint.
//!
//! The usual flow is [`SectionStore`] and [`StyleConfig`] →
//! [`DocumentRequest`] → [`assemble()`](assemble::assemble).

pub mod assemble;
pub mod error;
pub mod import;
pub mod ir;
pub mod outline;
pub mod progress;
pub mod request;
pub mod section;
pub mod settings;
pub mod style;
pub mod worker;
pub mod writer;

pub use error::{ErrKind, Error};
pub use outline::Outline;
pub use request::DocumentRequest;
pub use section::{Direction, ImportMode, Section, SectionDraft, SectionId, SectionStore};
pub use settings::{ApiSettings, Settings};
pub use style::{HAlign, Rgb, Role, StyleConfig, StyleSpec};

/// The result type for docforge.
pub type Result<T, Err = Error> = std::result::Result<T, Err>;
