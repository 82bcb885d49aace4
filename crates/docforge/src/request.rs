//! The input of one document build.

use std::path::{Path, PathBuf};

use crate::error::prelude::*;
use crate::section::{Section, SectionStore, validate_heading};
use crate::style::{HAlign, Role, RoleTable, StyleConfig};

/// The title a new editing session starts with.
pub const DEFAULT_TITLE: &str = "公文标题示例";

/// A header logo that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    /// The image file.
    pub path: PathBuf,
    /// The horizontal position in the header.
    pub position: HAlign,
    /// The rendered width in centimeters.
    pub width_cm: f32,
}

/// Everything the assembler needs to produce one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    /// Where the document is written. Overwritten if it exists.
    pub output: PathBuf,
    /// The title paragraph. Omitted when blank.
    pub title: String,
    /// The caption above the table of contents.
    pub toc_caption: String,
    /// The sections in document order.
    pub sections: Vec<Section>,
    /// The per-role styles.
    pub styles: RoleTable,
    /// First-line indent of body paragraphs, in characters.
    pub indent_chars: u32,
    /// The optional header logo.
    pub logo: Option<Logo>,
}

impl DocumentRequest {
    /// Collects a request from the editing session.
    ///
    /// A disabled logo becomes `None`; an enabled one is checked by
    /// [`DocumentRequest::validate`].
    pub fn new(
        output: impl Into<PathBuf>,
        title: impl Into<String>,
        store: &SectionStore,
        style: &StyleConfig,
    ) -> Self {
        let logo = style.logo.enabled.then(|| Logo {
            path: style.logo.path.clone(),
            position: style.logo.position,
            width_cm: style.logo.width_cm,
        });

        Self {
            output: normalize_output(output.into()),
            title: title.into(),
            toc_caption: style.toc_caption.clone(),
            sections: store.list(),
            styles: style.specs.clone(),
            indent_chars: style.indent_chars,
            logo,
        }
    }

    /// Rejects requests that cannot produce a sensible document.
    pub fn validate(&self) -> Result<()> {
        let has_name = self
            .output
            .file_stem()
            .is_some_and(|stem| !stem.to_string_lossy().trim().is_empty());
        if !has_name {
            return Err(Error::validation(
                "request.output",
                "the output file name must not be empty",
            ));
        }

        if self.sections.is_empty() {
            return Err(Error::validation(
                "request.sections",
                "add at least one section before generating",
            ));
        }
        for section in &self.sections {
            validate_heading(&section.title, section.level)?;
        }

        for role in Role::ALL {
            self.styles[role].validate(role)?;
        }

        if let Some(logo) = &self.logo {
            if logo.path.as_os_str().is_empty() {
                return Err(Error::validation(
                    "request.logo",
                    "the logo is enabled but no image is selected",
                ));
            }
            if !(logo.width_cm.is_finite() && logo.width_cm > 0.) {
                return Err(Error::validation(
                    "request.logo",
                    format!("the logo width must be positive, got {}", logo.width_cm),
                ));
            }
        }

        Ok(())
    }
}

/// Appends the `.docx` extension to bare file names.
pub fn normalize_output(path: PathBuf) -> PathBuf {
    let has_docx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
    if has_docx || path.as_os_str().is_empty() {
        return path;
    }

    let mut name = path.as_os_str().to_owned();
    name.push(".docx");
    PathBuf::from(name)
}

/// Whether `path` names an existing file.
pub(crate) fn is_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file())
}
