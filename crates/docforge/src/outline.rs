//! The outline file: a saved editing session.
//!
//! ```toml
//! title = "公文标题示例"
//! toc-caption = "目 录"
//! output = "report.docx"
//!
//! [[section]]
//! level = 1
//! title = "第一章 背景介绍"
//! content = "这里是背景介绍内容。"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::prelude::*;
use crate::request::DEFAULT_TITLE;
use crate::section::{ImportMode, Rejected, SectionDraft, SectionStore};

/// The contents of an outline file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Outline {
    /// The document title. Omitted from the document when blank.
    #[serde(default = "default_title")]
    pub title: String,
    /// Overrides the table-of-contents caption of the settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_caption: Option<String>,
    /// The default output path, relative to the outline file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// The sections in document order.
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionDraft>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}

impl Default for Outline {
    fn default() -> Self {
        Self {
            title: default_title(),
            toc_caption: None,
            output: None,
            sections: Vec::new(),
        }
    }
}

impl Outline {
    /// Reads an outline file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("outline.load")?;
        toml::from_str(&text).context("outline.parse")
    }

    /// Writes the outline file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self).context("outline.serialize")?;
        std::fs::write(path, text).context("outline.save")
    }

    /// Loads the sections into a fresh store.
    ///
    /// Invalid sections are dropped and returned.
    pub fn to_store(&self) -> (SectionStore, Vec<Rejected>) {
        let mut store = SectionStore::new();
        let rejected = store.extend(self.sections.iter().cloned(), ImportMode::Append);
        (store, rejected)
    }

    /// Like [`Outline::to_store`], consuming the outline.
    pub fn into_store(self) -> (SectionStore, Vec<Rejected>) {
        let mut store = SectionStore::new();
        let rejected = store.extend(self.sections, ImportMode::Append);
        (store, rejected)
    }

    /// Loads the sections an import is merged into.
    ///
    /// The merged store is written back to the file, which would drop any
    /// invalid section. Those are logged, and appending fails while any
    /// exist. Replacing discards them along with the valid ones.
    pub fn store_for_import(&self, mode: ImportMode) -> Result<SectionStore> {
        let (store, rejected) = self.to_store();
        for r in &rejected {
            log::warn!("outline: section #{} is invalid: {}", r.index + 1, r.reason);
        }
        if !rejected.is_empty() && mode == ImportMode::Append {
            return Err(Error::validation(
                "outline.import",
                _eco_format!(
                    "{} invalid sections would be lost; fix them or import in replace mode",
                    rejected.len()
                ),
            ));
        }
        Ok(store)
    }

    /// Replaces the sections with those of `store`.
    pub fn set_sections(&mut self, store: &SectionStore) {
        self.sections = store.iter().cloned().map(SectionDraft::from).collect();
    }

    /// Builds an outline from an editing session.
    pub fn from_store(title: impl Into<String>, store: &SectionStore) -> Self {
        let mut outline = Self {
            title: title.into(),
            ..Self::default()
        };
        outline.set_sections(store);
        outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_in_order() {
        let outline: Outline = toml::from_str(
            r#"
title = "Report"
toc-caption = "Contents"

[[section]]
level = 1
title = "One"
content = "a\n\nb"

[[section]]
level = 2
title = "One.One"
"#,
        )
        .unwrap();

        assert_eq!(outline.toc_caption.as_deref(), Some("Contents"));
        assert_eq!(
            outline.sections,
            [
                SectionDraft::new(1, "One", "a\n\nb"),
                SectionDraft::new(2, "One.One", ""),
            ]
        );
    }

    #[test]
    fn missing_title_uses_the_default() {
        let outline: Outline = toml::from_str("[[section]]\nlevel = 1\ntitle = \"A\"\n").unwrap();
        assert_eq!(outline.title, DEFAULT_TITLE);

        let outline: Outline = toml::from_str("title = \"\"\n").unwrap();
        assert!(outline.title.is_empty());
        assert!(outline.sections.is_empty());
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let outline = Outline {
            sections: vec![
                SectionDraft::new(1, "ok", ""),
                SectionDraft::new(7, "too deep", ""),
                SectionDraft::new(2, " ", ""),
            ],
            ..Outline::default()
        };

        let (store, rejected) = outline.into_store();
        assert_eq!(store.len(), 1);
        let indices: Vec<_> = rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, [1, 2]);
    }

    #[test]
    fn import_keeps_invalid_sections_unless_replacing() {
        let mut outline = Outline {
            sections: vec![
                SectionDraft::new(1, "Keep", ""),
                SectionDraft::new(4, "Appendix", "deep"),
            ],
            ..Outline::default()
        };

        let err = outline.store_for_import(ImportMode::Append).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(outline.sections.len(), 2);

        let mut store = outline.store_for_import(ImportMode::Replace).unwrap();
        store.extend([SectionDraft::new(1, "Imported", "")], ImportMode::Replace);
        outline.set_sections(&store);
        let titles: Vec<_> = outline.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Imported"]);
    }

    #[test]
    fn import_appends_to_a_valid_outline() {
        let mut outline = Outline {
            sections: vec![SectionDraft::new(1, "Keep", "")],
            ..Outline::default()
        };

        let mut store = outline.store_for_import(ImportMode::Append).unwrap();
        store.extend([SectionDraft::new(2, "Imported", "")], ImportMode::Append);
        outline.set_sections(&store);
        let titles: Vec<_> = outline.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Keep", "Imported"]);
    }

    #[test]
    fn store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.toml");

        let store = SectionStore::with_sample();
        Outline::from_store("T", &store).save(&path).unwrap();

        let loaded = Outline::load(&path).unwrap();
        assert_eq!(loaded.title, "T");
        let (restored, rejected) = loaded.to_store();
        assert!(rejected.is_empty());
        let titles: Vec<_> = restored.iter().map(|s| s.title.as_str()).collect();
        let expected: Vec<_> = store.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn malformed_outline_is_a_data_shape_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.toml");
        std::fs::write(&path, "[[section]]\nlevel = \"x\"\n").unwrap();
        let err = Outline::load(&path).unwrap_err();
        assert!(matches!(err.kind(), ErrKind::DataShape(..)));
    }
}
