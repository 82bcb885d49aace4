//! Intermediate representation of an assembled document.
//!
//! [`Document::from_request`] turns a [`DocumentRequest`] into a flat plan:
//! page geometry, the computed paragraph styles and the ordered blocks. The
//! plan is plain data, so the document layout can be checked without
//! packing a file; [`crate::writer::docx`] renders it.

use core::fmt::{self, Write};

use crate::request::{DocumentRequest, Logo};
use crate::style::{HAlign, Rgb, Role, StyleSpec};

/// Twips per point.
pub const TWIPS_PER_PT: f32 = 20.;
/// Twips per inch.
pub const TWIPS_PER_INCH: i32 = 1440;

/// Page size and margins, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    /// Page width.
    pub width: u32,
    /// Page height.
    pub height: u32,
    /// Top margin.
    pub top: i32,
    /// Bottom margin.
    pub bottom: i32,
    /// Left margin.
    pub left: i32,
    /// Right margin.
    pub right: i32,
}

impl PageSetup {
    /// A4 portrait with one inch margins and a 0.8 inch bottom margin.
    pub const A4: PageSetup = PageSetup {
        width: 11906,
        height: 16838,
        top: TWIPS_PER_INCH,
        bottom: TWIPS_PER_INCH * 4 / 5,
        left: TWIPS_PER_INCH,
        right: TWIPS_PER_INCH,
    };
}

/// Line spacing of a paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacing {
    /// Single spacing.
    Single,
    /// One and a half lines.
    OnePointFive,
}

impl LineSpacing {
    /// The `w:line` value under the `auto` rule (240ths of a line).
    pub fn auto_line(self) -> i32 {
        match self {
            LineSpacing::Single => 240,
            LineSpacing::OnePointFive => 360,
        }
    }
}

/// Font attributes applied directly to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFormat {
    /// Font family, used for every script slot.
    pub font: String,
    /// Size in half-points.
    pub half_points: usize,
    /// Bold.
    pub bold: bool,
    /// Color.
    pub color: Rgb,
}

impl From<&StyleSpec> for RunFormat {
    fn from(spec: &StyleSpec) -> Self {
        Self {
            font: spec.font.clone(),
            half_points: spec.half_points(),
            bold: spec.bold,
            color: spec.color,
        }
    }
}

/// A named paragraph style, fully computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    /// The role the style serves.
    pub role: Role,
    /// Font attributes.
    pub run: RunFormat,
    /// Outline level (0-based) for headings.
    pub outline_level: Option<usize>,
    /// Paragraph alignment.
    pub align: Option<HAlign>,
    /// Space before, in twips.
    pub space_before: u32,
    /// Space after, in twips.
    pub space_after: u32,
    /// Line spacing.
    pub line_spacing: Option<LineSpacing>,
    /// First-line indent, in twips.
    pub first_line_indent: Option<i32>,
}

impl ParagraphStyle {
    /// Computes the style of `role`.
    pub fn new(role: Role, spec: &StyleSpec, indent_chars: u32) -> Self {
        let mut style = Self {
            role,
            run: spec.into(),
            outline_level: None,
            align: None,
            space_before: 0,
            space_after: 0,
            line_spacing: None,
            first_line_indent: None,
        };

        match role {
            Role::Title => {
                style.align = Some(HAlign::Center);
                style.space_before = 240;
                style.space_after = 240;
            }
            Role::H1 | Role::H2 | Role::H3 => {
                style.outline_level = role.heading_level().map(|l| usize::from(l) - 1);
                style.space_before = 240;
                style.space_after = 80;
                style.line_spacing = Some(LineSpacing::Single);
            }
            Role::Normal => {
                let indent_pt = indent_chars as f32 * spec.size_pt;
                style.first_line_indent = Some((indent_pt * TWIPS_PER_PT).round() as i32);
                style.line_spacing = Some(LineSpacing::OnePointFive);
            }
        }

        style
    }

    /// The style id written into the document.
    pub fn style_id(&self) -> &'static str {
        self.role.style_id()
    }

    /// The first-line indent in points.
    pub fn first_line_indent_pt(&self) -> Option<f32> {
        self.first_line_indent.map(|t| t as f32 / TWIPS_PER_PT)
    }
}

/// The unresolved table-of-contents field.
///
/// Page numbers are left to the word processor: it fills them in when the
/// user refreshes fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocField {
    /// The shallowest outline level listed.
    pub from: u8,
    /// The deepest outline level listed.
    pub to: u8,
}

impl TocField {
    /// The field instruction.
    pub fn instruction(&self) -> String {
        format!(r#"TOC \o "{}-{}" \h \z \u"#, self.from, self.to)
    }
}

/// One block of the document body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// The centered document title.
    Title(String),
    /// The caption above the table of contents.
    TocCaption {
        /// The caption text.
        text: String,
        /// Heading-like run formatting, without an outline level.
        run: RunFormat,
    },
    /// The table-of-contents field.
    Toc(TocField),
    /// A forced page break.
    PageBreak,
    /// A section heading. Levels outside `1..=3` fall back to body text.
    Heading {
        /// The section level.
        level: u8,
        /// The heading text.
        text: String,
    },
    /// A body paragraph.
    Body(String),
}

impl Block {
    /// The paragraph style the block uses, if any.
    pub fn style_id(&self) -> Option<&'static str> {
        match self {
            Block::Title(..) => Some(Role::Title.style_id()),
            Block::Heading { level, .. } => {
                Some(Role::for_level(*level).unwrap_or(Role::Normal).style_id())
            }
            Block::Body(..) => Some(Role::Normal.style_id()),
            Block::TocCaption { .. } | Block::Toc(..) | Block::PageBreak => None,
        }
    }
}

/// The plan of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Page geometry.
    pub page: PageSetup,
    /// The paragraph styles, in creation order.
    pub styles: Vec<ParagraphStyle>,
    /// The header logo, if any.
    pub logo: Option<Logo>,
    /// The title block, if the title is not blank.
    pub title: Option<Block>,
    /// The caption, field and page break of the table of contents.
    pub toc: Vec<Block>,
    /// Heading and body blocks of every section, in store order.
    pub body: Vec<Block>,
}

impl Document {
    /// Plans the document of a request.
    pub fn from_request(req: &DocumentRequest) -> Self {
        let styles = req
            .styles
            .iter()
            .map(|(role, spec)| ParagraphStyle::new(role, spec, req.indent_chars))
            .collect();

        let title = req.title.trim();
        let title = (!title.is_empty()).then(|| Block::Title(title.to_owned()));

        let toc = vec![
            Block::TocCaption {
                text: req.toc_caption.clone(),
                run: (&req.styles[Role::H1]).into(),
            },
            Block::Toc(TocField { from: 1, to: 3 }),
            Block::PageBreak,
        ];

        let mut body = Vec::new();
        for section in &req.sections {
            body.push(Block::Heading {
                level: section.level,
                text: section.title.clone(),
            });
            body.extend(body_paragraphs(&section.content).map(|p| Block::Body(p.to_owned())));
        }

        Self {
            page: PageSetup::A4,
            styles,
            logo: req.logo.clone(),
            title,
            toc,
            body,
        }
    }

    /// Looks up the computed style of a role.
    pub fn style(&self, role: Role) -> Option<&ParagraphStyle> {
        self.styles.iter().find(|s| s.role == role)
    }

    /// Iterates every block in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.title.iter().chain(&self.toc).chain(&self.body)
    }

    /// Renders the block structure as text, one paragraph per line.
    pub fn to_outline_string(&self) -> String {
        let mut out = String::new();
        for block in self.blocks() {
            // Writing into a `String` cannot fail.
            let _ = writeln!(out, "{block}");
        }
        out
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Title(text) => write!(f, "[Title] {text}"),
            Block::TocCaption { text, .. } => write!(f, "[TocCaption] {text}"),
            Block::Toc(field) => write!(f, "[Field] {}", field.instruction()),
            Block::PageBreak => write!(f, "[PageBreak]"),
            Block::Heading { text, .. } | Block::Body(text) => {
                let style = self.style_id().unwrap_or(Role::Normal.style_id());
                write!(f, "[{style}] {text}")
            }
        }
    }
}

/// Splits section content into body paragraphs: one per non-blank line,
/// trimmed.
pub fn body_paragraphs(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(str::trim).filter(|line| !line.is_empty())
}
