//! The persisted settings file.
//!
//! The file is TOML with four tables: `[api]`, `[style.<role>]`, `[layout]`
//! and `[logo]`. Missing files and missing keys fall back to the built-in
//! defaults. Saving rewrites only the tables it owns and keeps every other
//! key in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::prelude::*;
use crate::style::{LogoSettings, Role, RoleTable, StyleConfig, StyleSpec};

/// The default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// The default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Credentials and model selection of the import adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApiSettings {
    /// The bearer token.
    pub key: String,
    /// The model identifier.
    pub model: String,
    /// The chat-completion endpoint.
    pub endpoint: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            key: String::new(),
            model: DEFAULT_MODEL.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }
}

/// `[layout]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct LayoutTable {
    indent_chars: u32,
    toc_caption: String,
}

impl Default for LayoutTable {
    fn default() -> Self {
        let config = StyleConfig::default();
        Self {
            indent_chars: config.indent_chars,
            toc_caption: config.toc_caption,
        }
    }
}

/// `[style]`, one optional sub-table per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StyleTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<PartialSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h1: Option<PartialSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h2: Option<PartialSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    h3: Option<PartialSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normal: Option<PartialSpec>,
}

impl StyleTable {
    fn slot(&self, role: Role) -> &Option<PartialSpec> {
        match role {
            Role::Title => &self.title,
            Role::H1 => &self.h1,
            Role::H2 => &self.h2,
            Role::H3 => &self.h3,
            Role::Normal => &self.normal,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<PartialSpec> {
        match role {
            Role::Title => &mut self.title,
            Role::H1 => &mut self.h1,
            Role::H2 => &mut self.h2,
            Role::H3 => &mut self.h3,
            Role::Normal => &mut self.normal,
        }
    }
}

/// A style entry whose keys may each be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PartialSpec {
    font: Option<String>,
    size: Option<f32>,
    bold: Option<bool>,
    color: Option<String>,
}

impl PartialSpec {
    fn resolve(&self, role: Role) -> StyleSpec {
        let mut spec = StyleSpec::default_for(role);
        if let Some(font) = &self.font {
            spec.font = font.clone();
        }
        if let Some(size) = self.size.filter(|s| s.is_finite() && *s > 0.) {
            spec.size_pt = size;
        }
        if let Some(bold) = self.bold {
            spec.bold = bold;
        }
        if let Some(color) = &self.color {
            spec = spec.with_color_hex(color);
        }
        spec
    }
}

impl From<&StyleSpec> for PartialSpec {
    fn from(spec: &StyleSpec) -> Self {
        Self {
            font: Some(spec.font.clone()),
            size: Some(spec.size_pt),
            bold: Some(spec.bold),
            color: Some(spec.color.to_string()),
        }
    }
}

/// The whole settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    api: ApiSettings,
    style: StyleTable,
    layout: LayoutTable,
    logo: LogoSettings,
}

/// Everything docforge reads from the settings file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Import adapter settings.
    pub api: ApiSettings,
    /// Default styles.
    pub style: StyleConfig,
}

impl Settings {
    /// The default location of the settings file.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("docforge").join("settings.toml"))
    }

    /// Reads settings, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("settings: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).context("settings.load")?;
        Self::from_toml(&text)
    }

    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(text).context("settings.parse")?;

        let mut specs = RoleTable::default();
        for role in Role::ALL {
            if let Some(partial) = file.style.slot(role) {
                specs[role] = partial.resolve(role);
            }
        }

        Ok(Self {
            api: file.api,
            style: StyleConfig {
                specs,
                indent_chars: file.layout.indent_chars,
                toc_caption: file.layout.toc_caption,
                logo: file.logo,
            },
        })
    }

    /// Writes the `[api]` table, keeping the rest of the file.
    pub fn save_api(&self, path: &Path) -> Result<()> {
        merge_into_file(path, |doc| {
            merge_value(doc, "api".into(), to_value(&self.api)?);
            Ok(())
        })
    }

    /// Writes the `[style]`, `[layout]` and `[logo]` tables, keeping the rest
    /// of the file. Unknown keys inside those tables are kept as well.
    pub fn save_style(&self, path: &Path) -> Result<()> {
        let mut styles = StyleTable::default();
        for (role, spec) in self.style.specs.iter() {
            *styles.slot_mut(role) = Some(spec.into());
        }
        let layout = LayoutTable {
            indent_chars: self.style.indent_chars,
            toc_caption: self.style.toc_caption.clone(),
        };

        merge_into_file(path, |doc| {
            merge_value(doc, "style".into(), to_value(&styles)?);
            merge_value(doc, "layout".into(), to_value(&layout)?);
            merge_value(doc, "logo".into(), to_value(&self.style.logo)?);
            Ok(())
        })
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<toml::Value> {
    toml::Value::try_from(value).context("settings.serialize")
}

/// Inserts `value` under `key`, merging tables recursively.
fn merge_value(doc: &mut toml::Table, key: String, value: toml::Value) {
    let toml::Value::Table(new) = value else {
        doc.insert(key, value);
        return;
    };
    if let Some(toml::Value::Table(existing)) = doc.get_mut(&key) {
        for (key, value) in new {
            merge_value(existing, key, value);
        }
        return;
    }
    doc.insert(key, toml::Value::Table(new));
}

/// Applies `f` to the parsed file and writes it back.
///
/// A file that is not valid TOML is left untouched.
fn merge_into_file(path: &Path, f: impl FnOnce(&mut toml::Table) -> Result<()>) -> Result<()> {
    let mut doc = if path.exists() {
        let text = std::fs::read_to_string(path).context("settings.save")?;
        text.parse::<toml::Table>().context("settings.parse")?
    } else {
        toml::Table::new()
    };

    f(&mut doc)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("settings.save")?;
    }
    let text = toml::to_string(&doc).context("settings.serialize")?;
    std::fs::write(path, text).context("settings.save")?;
    log::info!("settings: saved {}", path.display());
    Ok(())
}
