//! DOCX document writer implementation

use std::io::Cursor;

use docx_rs::*;

use crate::Result;
use crate::error::Error;
use crate::ir::{self, Block, PageSetup, ParagraphStyle};
use crate::request::Logo;
use crate::style::Role;

use super::image_processor::DocxImageProcessor;
use super::styles::{DocxStyles, format_run, toc_instruction};

/// DOCX writer that renders a document plan one phase at a time.
///
/// Each method consumes part of an [`ir::Document`]; [`DocxWriter::finish`]
/// packs the archive into memory.
pub struct DocxWriter {
    docx: Docx,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxWriter {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self { docx: Docx::new() }
    }

    fn map(&mut self, f: impl FnOnce(Docx) -> Docx) {
        let docx = std::mem::take(&mut self.docx);
        self.docx = f(docx);
    }

    /// Applies page size and margins.
    pub fn page_setup(&mut self, page: &PageSetup) {
        self.map(|docx| DocxStyles::page_setup(docx, page));
    }

    /// Defines a named paragraph style.
    pub fn style(&mut self, style: &ParagraphStyle) {
        self.map(|docx| DocxStyles::add(docx, style));
    }

    /// Places a logo in the page header. Returns whether the logo was
    /// placed.
    pub fn header_logo(&mut self, logo: &Logo) -> bool {
        match DocxImageProcessor::logo_header(logo) {
            Some(header) => {
                self.map(|docx| docx.header(header));
                true
            }
            None => false,
        }
    }

    /// Appends one block.
    pub fn block(&mut self, block: &Block) {
        let para = Self::process_block(block);
        self.map(|docx| docx.add_paragraph(para));
    }

    fn process_block(block: &Block) -> Paragraph {
        match block {
            Block::Title(text) => Paragraph::new()
                .style(Role::Title.style_id())
                .add_run(Run::new().add_text(text)),
            Block::TocCaption { text, run } => Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(format_run(Run::new().add_text(text), run)),
            Block::Toc(field) => Paragraph::new().add_run(Self::toc_run(field)),
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            Block::Heading { text, .. } | Block::Body(text) => {
                let style = block.style_id().unwrap_or(Role::Normal.style_id());
                Paragraph::new()
                    .style(style)
                    .add_run(Run::new().add_text(text))
            }
        }
    }

    /// The field runs of a table of contents. The field is marked dirty so
    /// that word processors offer to fill it in on open.
    fn toc_run(field: &ir::TocField) -> Run {
        Run::new()
            .add_field_char(FieldCharType::Begin, true)
            .add_instr_text(InstrText::TOC(toc_instruction(field)))
            .add_field_char(FieldCharType::Separate, false)
            .add_field_char(FieldCharType::End, false)
    }

    /// Number of body children written so far.
    pub fn len(&self) -> usize {
        self.docx.document.children.len()
    }

    /// Whether nothing was written to the body yet.
    pub fn is_empty(&self) -> bool {
        self.docx.document.children.is_empty()
    }

    /// Builds and packs the document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.docx
            .build()
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| Error::assembly("docx.pack", e.to_string()))?;
        Ok(buffer)
    }

    /// Renders a whole document in one go.
    pub fn write_document(doc: &ir::Document) -> Result<Vec<u8>> {
        Self::render(doc).finish()
    }

    fn render(doc: &ir::Document) -> Self {
        let mut writer = Self::new();
        writer.page_setup(&doc.page);
        for style in &doc.styles {
            writer.style(style);
        }
        if let Some(logo) = &doc.logo {
            writer.header_logo(logo);
        }
        for block in doc.blocks() {
            writer.block(block);
        }
        writer
    }
}
