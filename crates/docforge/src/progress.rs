//! Progress reporting of long-running operations.

use core::fmt;

use crate::style::Role;

/// A completed step of document assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// Page size and margins are applied.
    PageSetup,
    /// The style of a role is defined.
    StyleCreated(Role),
    /// The title paragraph is written, or skipped because it is blank.
    TitleWritten,
    /// The table of contents is inserted.
    TocInserted,
    /// Every section is written.
    BodyWritten,
    /// The file is on disk.
    Saved,
}

impl Milestone {
    /// The overall completion in percent.
    pub fn percent(self) -> u8 {
        match self {
            Milestone::PageSetup => 20,
            Milestone::StyleCreated(Role::Title) => 30,
            Milestone::StyleCreated(Role::H1) => 40,
            Milestone::StyleCreated(Role::H2) => 50,
            Milestone::StyleCreated(Role::H3) => 60,
            Milestone::StyleCreated(Role::Normal) => 70,
            Milestone::TitleWritten => 75,
            Milestone::TocInserted => 80,
            Milestone::BodyWritten => 90,
            Milestone::Saved => 100,
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::PageSetup => f.write_str("page setup"),
            Milestone::StyleCreated(role) => write!(f, "style {role}"),
            Milestone::TitleWritten => f.write_str("title"),
            Milestone::TocInserted => f.write_str("table of contents"),
            Milestone::BodyWritten => f.write_str("body"),
            Milestone::Saved => f.write_str("saved"),
        }
    }
}

/// A notifier receives the user-visible effects of an operation.
pub trait Notifier {
    /// Called with a human-readable log line.
    fn log(&self, _msg: &str) {}
    /// Called when a milestone is reached.
    fn progress(&self, _milestone: Milestone) {}
    /// Called once when the operation fails. Progress is considered reset.
    fn failed(&self, _msg: &str) {}
}

/// A dummy notifier that does nothing.
#[derive(Debug, Default, Clone, Copy, Hash)]
pub struct DummyNotifier;

impl Notifier for DummyNotifier {}
