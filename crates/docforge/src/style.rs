//! Style configuration: one [`StyleSpec`] per document role plus layout
//! knobs.

use core::fmt;
use std::ops::{Index, IndexMut};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::prelude::*;

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Pure black, the fallback for malformed colors.
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn parse(s: &str) -> Option<Rgb> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parses a color, falling back to black on malformed input.
    pub fn parse_or_black(s: &str) -> Rgb {
        Self::parse(s).unwrap_or_else(|| {
            log::warn!("invalid color {s:?}, using black");
            Rgb::BLACK
        })
    }

    /// The color as `RRGGBB`, the form docx expects.
    pub fn to_docx_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Rgb::parse_or_black(&s))
    }
}

/// A document role that owns a paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// The document title.
    Title,
    /// First level headings.
    H1,
    /// Second level headings.
    H2,
    /// Third level headings.
    H3,
    /// Body text.
    Normal,
}

impl Role {
    /// Every role, in the order styles are created.
    pub const ALL: [Role; 5] = [Role::Title, Role::H1, Role::H2, Role::H3, Role::Normal];

    /// The name used in settings files and by panel code.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Title => "title",
            Role::H1 => "h1",
            Role::H2 => "h2",
            Role::H3 => "h3",
            Role::Normal => "normal",
        }
    }

    /// The style id written into the document.
    pub fn style_id(self) -> &'static str {
        match self {
            Role::Title => "Title",
            Role::H1 => "Heading1",
            Role::H2 => "Heading2",
            Role::H3 => "Heading3",
            Role::Normal => "BodyText",
        }
    }

    /// The display name of the style in the word processor.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Title => "Title",
            Role::H1 => "heading 1",
            Role::H2 => "heading 2",
            Role::H3 => "heading 3",
            Role::Normal => "Body Text",
        }
    }

    /// The heading rank, if the role is a heading.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Role::H1 => Some(1),
            Role::H2 => Some(2),
            Role::H3 => Some(3),
            _ => None,
        }
    }

    /// The heading role for a section level.
    pub fn for_level(level: u8) -> Option<Role> {
        match level {
            1 => Some(Role::H1),
            2 => Some(Role::H2),
            3 => Some(Role::H3),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation("style.role", format!("unknown role {s:?}")))
    }
}

/// Font, size, weight and color of one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    /// The font family. Also used for the east-Asian slot.
    pub font: String,
    /// The size in points.
    #[serde(rename = "size")]
    pub size_pt: f32,
    /// Whether the text is bold.
    pub bold: bool,
    /// The text color.
    pub color: Rgb,
}

impl StyleSpec {
    /// Creates a black style.
    pub fn new(font: impl Into<String>, size_pt: f32, bold: bool) -> Self {
        Self {
            font: font.into(),
            size_pt,
            bold,
            color: Rgb::BLACK,
        }
    }

    /// Sets the color from user input, falling back to black.
    pub fn with_color_hex(mut self, hex: &str) -> Self {
        self.color = Rgb::parse_or_black(hex);
        self
    }

    /// The built-in default of a role.
    pub fn default_for(role: Role) -> Self {
        match role {
            Role::Title => Self::new("黑体", 22., true),
            Role::H1 => Self::new("黑体", 18., true),
            Role::H2 => Self::new("楷体", 16., true),
            Role::H3 => Self::new("宋体", 14., true),
            Role::Normal => Self::new("仿宋", 12., false),
        }
    }

    /// The size in docx half-points.
    pub fn half_points(&self) -> usize {
        (self.size_pt * 2.).round().max(1.) as usize
    }

    pub(crate) fn validate(&self, role: Role) -> Result<()> {
        if self.font.trim().is_empty() {
            return Err(Error::validation(
                "style",
                format!("{role} font must not be empty"),
            ));
        }
        if !(self.size_pt.is_finite() && self.size_pt > 0.) {
            return Err(Error::validation(
                "style",
                format!("{role} size must be positive, got {}", self.size_pt),
            ));
        }
        Ok(())
    }
}

/// A [`StyleSpec`] for each [`Role`], indexed by role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleTable([StyleSpec; 5]);

impl Default for RoleTable {
    fn default() -> Self {
        Self(Role::ALL.map(StyleSpec::default_for))
    }
}

impl Index<Role> for RoleTable {
    type Output = StyleSpec;

    fn index(&self, role: Role) -> &StyleSpec {
        &self.0[role.index()]
    }
}

impl IndexMut<Role> for RoleTable {
    fn index_mut(&mut self, role: Role) -> &mut StyleSpec {
        &mut self.0[role.index()]
    }
}

impl RoleTable {
    /// Iterates `(role, spec)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &StyleSpec)> {
        Role::ALL.into_iter().zip(self.0.iter())
    }
}

/// Where the header logo sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

impl FromStr for HAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(HAlign::Left),
            "center" | "centre" => Ok(HAlign::Center),
            "right" => Ok(HAlign::Right),
            _ => Err(Error::validation(
                "style.logo",
                format!("unknown position {s:?}, expected left, center or right"),
            )),
        }
    }
}

/// Header logo settings as edited by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogoSettings {
    /// Whether a logo is placed at all.
    pub enabled: bool,
    /// The image file.
    pub path: PathBuf,
    /// The horizontal position in the header.
    pub position: HAlign,
    /// The rendered width in centimeters.
    pub width_cm: f32,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
            position: HAlign::Left,
            width_cm: 3.,
        }
    }
}

/// The style configuration of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    /// The per-role styles.
    pub specs: RoleTable,
    /// First-line indent of body paragraphs, in characters.
    pub indent_chars: u32,
    /// The caption above the table of contents.
    pub toc_caption: String,
    /// The optional header logo.
    pub logo: LogoSettings,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            specs: RoleTable::default(),
            indent_chars: 2,
            toc_caption: "目 录".to_owned(),
            logo: LogoSettings::default(),
        }
    }
}

impl StyleConfig {
    /// Returns the style of a role.
    pub fn get(&self, role: Role) -> &StyleSpec {
        &self.specs[role]
    }

    /// Returns the style of a role for editing.
    pub fn get_mut(&mut self, role: Role) -> &mut StyleSpec {
        &mut self.specs[role]
    }

    /// Replaces the style of a role.
    pub fn set(&mut self, role: Role, spec: StyleSpec) {
        self.specs[role] = spec;
    }

    /// Looks a style up by role name (`"title"`, `"h1"`, ...).
    pub fn by_name(&self, name: &str) -> Option<&StyleSpec> {
        let role = name.parse::<Role>().ok()?;
        Some(self.get(role))
    }

    /// Looks a style up by role name for editing.
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut StyleSpec> {
        let role = name.parse::<Role>().ok()?;
        Some(self.get_mut(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_colors() {
        assert_eq!(Rgb::parse("#1a2B3c"), Some(Rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(Rgb::parse("FF0000"), Some(Rgb(255, 0, 0)));
        assert_eq!(Rgb(255, 0, 16).to_string(), "#FF0010");
        assert_eq!(Rgb(255, 0, 16).to_docx_hex(), "FF0010");
    }

    #[test]
    fn malformed_color_falls_back_to_black() {
        for bad in ["#12345", "#1234567", "red", "#GG0000", "", "#ÿÿÿ"] {
            assert_eq!(Rgb::parse_or_black(bad), Rgb::BLACK, "{bad:?}");
        }
        let spec = StyleSpec::new("Arial", 12., false).with_color_hex("#12");
        assert_eq!(spec.color, Rgb::BLACK);
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("h4".parse::<Role>().is_err());
        assert_eq!(Role::for_level(2), Some(Role::H2));
        assert_eq!(Role::for_level(4), None);
    }

    #[test]
    fn lookup_by_name_hits_the_table() {
        let mut config = StyleConfig::default();
        config.by_name_mut("h2").unwrap().color = Rgb(1, 2, 3);
        assert_eq!(config.get(Role::H2).color, Rgb(1, 2, 3));
        assert_eq!(config.by_name("normal").unwrap().font, "仿宋");
        assert!(config.by_name("h2_color_hex").is_none());
    }

    #[test]
    fn half_points_round() {
        assert_eq!(StyleSpec::new("x", 10.5, false).half_points(), 21);
        assert_eq!(StyleSpec::default_for(Role::Title).half_points(), 44);
    }

    #[test]
    fn validate_rejects_nonpositive_size() {
        let spec = StyleSpec::new("x", 0., false);
        assert!(spec.validate(Role::Normal).unwrap_err().is_validation());
        let spec = StyleSpec::new(" ", 12., false);
        assert!(spec.validate(Role::Normal).is_err());
    }
}
