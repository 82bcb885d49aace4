//! Page geometry and paragraph styles of DOCX documents

use docx_rs::*;

use crate::ir::{self, PageSetup, ParagraphStyle, RunFormat};
use crate::style::{HAlign, Role};

/// The built-in style docx-rs writes into every document.
const BASE_STYLE_ID: &str = "Normal";

/// Style management for DOCX documents
pub(super) struct DocxStyles;

impl DocxStyles {
    /// Applies page size and margins.
    pub fn page_setup(docx: Docx, page: &PageSetup) -> Docx {
        docx.page_size(page.width, page.height).page_margin(
            PageMargin::new()
                .top(page.top)
                .bottom(page.bottom)
                .left(page.left)
                .right(page.right),
        )
    }

    /// Adds `style` as a named paragraph style.
    ///
    /// docx-rs always writes its own empty `Normal` style, so no role uses
    /// that id. Every role is based on it instead.
    pub fn add(docx: Docx, style: &ParagraphStyle) -> Docx {
        docx.add_style(Self::build(style))
    }

    fn build(style: &ParagraphStyle) -> Style {
        let run = &style.run;
        let mut out = Style::new(style.style_id(), StyleType::Paragraph)
            .name(style.role.display_name())
            .based_on(BASE_STYLE_ID)
            .size(run.half_points)
            .color(run.color.to_docx_hex())
            .fonts(run_fonts(&run.font));

        if run.bold {
            out = out.bold();
        }
        if let Some(align) = style.align {
            out = out.align(alignment(align));
        }
        if let Some(level) = style.outline_level {
            out = out.outline_lvl(level);
        }
        if style.role != Role::Normal {
            out = out.next(Role::Normal.style_id());
        }

        let mut spacing = LineSpacing::new()
            .before(style.space_before)
            .after(style.space_after);
        if let Some(line) = style.line_spacing {
            spacing = spacing.line(line.auto_line()).line_rule(LineSpacingType::Auto);
        }
        out.paragraph_property = out.paragraph_property.line_spacing(spacing);

        if let Some(indent) = style.first_line_indent {
            out = out.indent(None, Some(SpecialIndentType::FirstLine(indent)), None, None);
        }

        out
    }
}

/// Uses `font` for the Latin, high-ANSI, East Asian and complex scripts.
pub(super) fn run_fonts(font: &str) -> RunFonts {
    RunFonts::new()
        .ascii(font)
        .hi_ansi(font)
        .east_asia(font)
        .cs(font)
}

/// Formats a run directly, without a paragraph style.
pub(super) fn format_run(run: Run, format: &RunFormat) -> Run {
    let run = run
        .size(format.half_points)
        .color(format.color.to_docx_hex())
        .fonts(run_fonts(&format.font));
    if format.bold { run.bold() } else { run }
}

pub(super) fn alignment(align: HAlign) -> AlignmentType {
    match align {
        HAlign::Left => AlignmentType::Left,
        HAlign::Center => AlignmentType::Center,
        HAlign::Right => AlignmentType::Right,
    }
}

/// The table-of-contents field instruction in docx-rs terms.
pub(super) fn toc_instruction(field: &ir::TocField) -> InstrToC {
    InstrToC::new()
        .heading_styles_range(usize::from(field.from), usize::from(field.to))
        .hyperlink()
        .hide_tab_and_page_numbers_in_webview()
        .use_applied_paragraph_line_level()
}
