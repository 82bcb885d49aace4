//! The section store: an ordered list of heading-plus-body units.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::prelude::*;

/// The deepest heading level a section may have.
pub const MAX_LEVEL: u8 = 3;

/// An opaque, never reused identifier of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section_{}", self.0)
    }
}

impl std::str::FromStr for SectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix("section_")
            .and_then(|n| n.parse().ok())
            .map(SectionId)
            .ok_or_else(|| Error::validation("section.id", format!("not a section id: {s:?}")))
    }
}

/// One heading-plus-body unit of user content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The identifier assigned by the store.
    pub id: SectionId,
    /// The heading level, in `1..=3`.
    pub level: u8,
    /// The heading text.
    pub title: String,
    /// The body text. Blank lines separate paragraphs.
    pub content: String,
}

/// A section that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    /// The heading level, in `1..=3`.
    pub level: u8,
    /// The heading text.
    pub title: String,
    /// The body text.
    #[serde(default)]
    pub content: String,
}

impl SectionDraft {
    /// Creates a new draft.
    pub fn new(level: u8, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            content: content.into(),
        }
    }
}

impl From<Section> for SectionDraft {
    fn from(section: Section) -> Self {
        Self {
            level: section.level,
            title: section.title,
            content: section.content,
        }
    }
}

/// The direction of a [`SectionStore::move_section`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the document (-1).
    Up,
    /// Towards the end of the document (+1).
    Down,
}

impl Direction {
    /// The signed offset of the direction.
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// How a bulk load treats the sections already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing sections and append after them.
    #[default]
    Append,
    /// Drop existing sections first. Destructive: callers confirm with the
    /// user before using it.
    Replace,
}

/// A draft that [`SectionStore::extend`] refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// The position of the draft in the input.
    pub index: usize,
    /// Why it was refused.
    pub reason: String,
}

/// Checks the invariants a stored section must satisfy.
pub fn validate_heading(title: &str, level: u8) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("section", "title must not be empty"));
    }
    if !(1..=MAX_LEVEL).contains(&level) {
        return Err(Error::validation(
            "section",
            format!("level must be between 1 and {MAX_LEVEL}, got {level}"),
        ));
    }
    Ok(())
}

/// The ordered list of sections backing every view of the document.
///
/// Order is document order. Nothing ever re-sorts it: only
/// [`SectionStore::move_section`] changes the relative position of two
/// entries.
#[derive(Debug, Clone, Default)]
pub struct SectionStore {
    sections: Vec<Section>,
    next_id: u64,
}

impl SectionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the example chapter shown on first start.
    pub fn with_sample() -> Self {
        let mut store = Self::new();
        let id = store.fresh_id();
        store.sections.push(Section {
            id,
            level: 1,
            title: "第一章 背景介绍".to_owned(),
            content: "这里是背景介绍内容。".to_owned(),
        });
        store
    }

    fn fresh_id(&mut self) -> SectionId {
        let id = SectionId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }

    /// Appends a new section and returns its id.
    pub fn add(
        &mut self,
        level: u8,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<SectionId> {
        let title = title.into();
        validate_heading(&title, level)?;

        let id = self.fresh_id();
        log::debug!("section store: add {id} (level {level}) {title:?}");
        self.sections.push(Section {
            id: id.clone(),
            level,
            title,
            content: content.into(),
        });
        Ok(id)
    }

    /// Finds a section by id.
    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SectionId) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::validation("section", format!("no section with id {id}")))
    }

    /// Replaces the title, level and content of a section in place.
    pub fn update(
        &mut self,
        id: &SectionId,
        title: impl Into<String>,
        level: u8,
        content: impl Into<String>,
    ) -> Result<()> {
        let title = title.into();
        validate_heading(&title, level)?;

        let section = self.get_mut(id)?;
        section.title = title;
        section.level = level;
        section.content = content.into();
        Ok(())
    }

    /// Replaces only the heading of a section.
    pub fn retitle(&mut self, id: &SectionId, title: impl Into<String>, level: u8) -> Result<()> {
        let title = title.into();
        validate_heading(&title, level)?;

        let section = self.get_mut(id)?;
        section.title = title;
        section.level = level;
        Ok(())
    }

    /// Replaces only the body of a section.
    pub fn set_content(&mut self, id: &SectionId, content: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.content = content.into();
        Ok(())
    }

    /// Removes a section. Returns whether it existed.
    ///
    /// A caller that was editing the removed section must drop its edit
    /// focus itself.
    pub fn delete(&mut self, id: &SectionId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.sections.remove(idx);
        true
    }

    /// Swaps a section with its neighbor in `direction`.
    ///
    /// Returns `false` and leaves the store untouched if the id is unknown or
    /// the neighbor would be out of bounds.
    pub fn move_section(&mut self, id: &SectionId, direction: Direction) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let Some(target) = idx.checked_add_signed(direction.offset()) else {
            return false;
        };
        if target >= self.sections.len() {
            return false;
        }

        self.sections.swap(idx, target);
        true
    }

    /// Returns a copy of the sections in document order.
    pub fn list(&self) -> Vec<Section> {
        self.sections.clone()
    }

    /// Iterates the sections in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// The number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the store holds no section.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Removes every section. Ids are still never reused.
    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// Bulk-loads drafts in order.
    ///
    /// Drafts violating the section invariants are skipped and returned.
    pub fn extend(
        &mut self,
        drafts: impl IntoIterator<Item = SectionDraft>,
        mode: ImportMode,
    ) -> Vec<Rejected> {
        if mode == ImportMode::Replace {
            log::info!("section store: replacing {} sections", self.sections.len());
            self.clear();
        }

        let mut rejected = Vec::new();
        for (index, draft) in drafts.into_iter().enumerate() {
            if let Err(err) = self.add(draft.level, draft.title, draft.content) {
                log::warn!("section store: skipped draft #{index}: {err}");
                rejected.push(Rejected {
                    index,
                    reason: err.kind().to_string(),
                });
            }
        }
        rejected
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn titles(store: &SectionStore) -> Vec<String> {
        store.iter().map(|s| s.title.clone()).collect()
    }

    fn abc() -> (SectionStore, Vec<SectionId>) {
        let mut store = SectionStore::new();
        let ids = ["A", "B", "C"]
            .into_iter()
            .map(|t| store.add(1, t, "").unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn add_appends_in_order() {
        let mut store = SectionStore::new();
        store.add(2, "second-level first", "").unwrap();
        store.add(1, "top level later", "").unwrap();
        assert_eq!(titles(&store), ["second-level first", "top level later"]);
    }

    #[test]
    fn add_rejects_empty_title_and_bad_level() {
        let mut store = SectionStore::new();
        assert!(store.add(1, "   ", "").unwrap_err().is_validation());
        assert!(store.add(0, "x", "").unwrap_err().is_validation());
        assert!(store.add(4, "x", "").unwrap_err().is_validation());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = SectionStore::new();
        let a = store.add(1, "A", "").unwrap();
        assert!(store.delete(&a));
        let b = store.add(1, "B", "").unwrap();
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "section_1");
    }

    #[test]
    fn id_round_trips_through_text() {
        let (store, ids) = abc();
        let parsed: SectionId = ids[2].to_string().parse().unwrap();
        assert_eq!(store.get(&parsed).unwrap().title, "C");
        assert!("chapter_2".parse::<SectionId>().is_err());
    }

    #[test]
    fn move_swaps_with_neighbor() {
        let (mut store, ids) = abc();
        assert!(store.move_section(&ids[0], Direction::Down));
        assert_eq!(titles(&store), ["B", "A", "C"]);
        assert!(store.move_section(&ids[2], Direction::Up));
        assert_eq!(titles(&store), ["B", "C", "A"]);
    }

    #[test]
    fn move_out_of_bounds_is_noop() {
        let (mut store, ids) = abc();
        assert!(!store.move_section(&ids[0], Direction::Up));
        assert!(!store.move_section(&ids[2], Direction::Down));
        assert_eq!(titles(&store), ["A", "B", "C"]);
    }

    #[test]
    fn move_unknown_id_is_noop() {
        let (mut store, ids) = abc();
        store.delete(&ids[1]);
        assert!(!store.move_section(&ids[1], Direction::Up));
        assert_eq!(titles(&store), ["A", "C"]);
    }

    #[test]
    fn update_and_partial_edits() {
        let (mut store, ids) = abc();
        store.update(&ids[1], "B2", 2, "body").unwrap();
        store.set_content(&ids[0], "intro").unwrap();
        store.retitle(&ids[2], "C3", 3).unwrap();

        let list = store.list();
        assert_eq!((list[1].title.as_str(), list[1].level), ("B2", 2));
        assert_eq!(list[1].content, "body");
        assert_eq!(list[0].content, "intro");
        assert_eq!((list[2].title.as_str(), list[2].level), ("C3", 3));

        assert!(store.update(&ids[1], "", 1, "").is_err());
        assert_eq!(store.get(&ids[1]).unwrap().title, "B2");
    }

    #[test]
    fn update_unknown_id_fails() {
        let (mut store, ids) = abc();
        store.delete(&ids[0]);
        let err = store.set_content(&ids[0], "lost").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn list_is_a_copy() {
        let (store, _) = abc();
        let mut copy = store.list();
        copy.clear();
        assert_eq!(store.len(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Delete(usize),
        Move(usize, bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            2 => (1u8..=3).prop_map(Op::Add),
            1 => any::<usize>().prop_map(Op::Delete),
            1 => (any::<usize>(), any::<bool>()).prop_map(|(i, up)| Op::Move(i, up)),
        ]
    }

    #[test]
    fn random_operations_keep_ids_unique() {
        proptest!(|(ops in prop::collection::vec(op(), 0..200))| {
            let mut store = SectionStore::new();
            let mut live: Vec<SectionId> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Add(level) => {
                        live.push(store.add(level, format!("s{step}"), "").unwrap());
                    }
                    Op::Delete(i) if !live.is_empty() => {
                        let id = live.swap_remove(i % live.len());
                        prop_assert!(store.delete(&id));
                        prop_assert!(store.get(&id).is_none());
                    }
                    Op::Move(i, up) if !live.is_empty() => {
                        let dir = if up { Direction::Up } else { Direction::Down };
                        store.move_section(&live[i % live.len()], dir);
                    }
                    _ => {}
                }

                let ids: HashSet<_> = store.iter().map(|s| s.id.clone()).collect();
                prop_assert_eq!(ids.len(), store.len());
                prop_assert_eq!(store.len(), live.len());
                prop_assert!(live.iter().all(|id| ids.contains(id)));
            }
        });
    }

    #[test]
    fn extend_appends_or_replaces() {
        let (mut store, _) = abc();
        let rejected = store.extend(
            vec![
                SectionDraft::new(2, "D", "d"),
                SectionDraft::new(7, "bad", ""),
                SectionDraft::new(1, "E", ""),
            ],
            ImportMode::Append,
        );
        assert_eq!(titles(&store), ["A", "B", "C", "D", "E"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].index, 1);

        store.extend(vec![SectionDraft::new(1, "F", "")], ImportMode::Replace);
        assert_eq!(titles(&store), ["F"]);
    }

    #[test]
    fn sample_store_has_one_chapter() {
        let store = SectionStore::with_sample();
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].level, 1);
    }
}
