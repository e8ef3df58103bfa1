use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::card::LinkSlots;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "bizcard";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
    pub source: Option<String>,
    pub links: LinkSlots,
    pub contact: ContactConfig,
    pub qr: QrConfig,
}

/// Settings for links and file names derived from contact fields.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Prefix for the messaging deep link built from the phone digits
    pub phone_link_base: String,
    /// Export file stem used when the card has no FN
    pub fallback_file_stem: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone_link_base: "https://wa.me/".to_string(),
            fallback_file_stem: "contacto".to_string(),
        }
    }
}

// =============================================================================
// QR Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Payload encoded in the QR code, usually the card page URL
    pub data: Option<String>,
    pub output: PathBuf,
    /// Pixels per module
    pub box_size: u32,
    /// Quiet zone, in modules
    pub border: u32,
    pub logo: Option<PathBuf>,
    /// Logo side relative to the QR side (0.15 - 0.30 works well)
    pub logo_scale: f32,
    pub white_pad: u32,
    pub rounded_white_box: bool,
    pub white_box_radius: u32,
    pub recolor: bool,
    pub color_top: RgbColor,
    pub color_bottom: RgbColor,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            data: None,
            output: PathBuf::from("QR.png"),
            box_size: 12,
            border: 4,
            logo: None,
            logo_scale: 0.22,
            white_pad: 18,
            rounded_white_box: true,
            white_box_radius: 18,
            recolor: false,
            color_top: RgbColor::new(20, 50, 95),
            color_bottom: RgbColor::new(70, 150, 160),
        }
    }
}

impl QrConfig {
    pub fn validate(&self) -> Result<()> {
        if self.box_size == 0 {
            bail!("qr.box_size must be at least 1");
        }
        if !(self.logo_scale > 0.0 && self.logo_scale < 1.0) {
            bail!(
                "qr.logo_scale must be between 0 and 1 (exclusive), got {}",
                self.logo_scale
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "ColorFile")]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Colours are written as `[r, g, b]` or `{ r, g, b }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorFile {
    Triple([u8; 3]),
    Channels { r: u8, g: u8, b: u8 },
}

impl From<ColorFile> for RgbColor {
    fn from(file: ColorFile) -> Self {
        match file {
            ColorFile::Triple([r, g, b]) | ColorFile::Channels { r, g, b } => Self::new(r, g, b),
        }
    }
}

/// Expand ~ to home directory in paths
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Config file structure
// =============================================================================

/// Slot patterns may be a single substring or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Patterns {
    Single(String),
    Multiple(Vec<String>),
}

impl Patterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::Single(s) => vec![s],
            Patterns::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    source: Option<String>,
    links: Option<BTreeMap<String, Patterns>>,
    contact: ContactFile,
    qr: QrFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ContactFile {
    phone_link_base: String,
    fallback_file_stem: String,
}

impl Default for ContactFile {
    fn default() -> Self {
        let defaults = ContactConfig::default();
        Self {
            phone_link_base: defaults.phone_link_base,
            fallback_file_stem: defaults.fallback_file_stem,
        }
    }
}

impl From<ContactFile> for ContactConfig {
    fn from(file: ContactFile) -> Self {
        let defaults = ContactConfig::default();
        let stem = file.fallback_file_stem.trim();
        Self {
            phone_link_base: file.phone_link_base,
            fallback_file_stem: if stem.is_empty() {
                defaults.fallback_file_stem
            } else {
                stem.to_string()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct QrFile {
    data: Option<String>,
    output: PathBuf,
    box_size: u32,
    border: u32,
    logo: Option<PathBuf>,
    logo_scale: f32,
    white_pad: u32,
    rounded_white_box: bool,
    white_box_radius: u32,
    recolor: bool,
    color_top: RgbColor,
    color_bottom: RgbColor,
}

impl Default for QrFile {
    fn default() -> Self {
        let defaults = QrConfig::default();
        Self {
            data: defaults.data,
            output: defaults.output,
            box_size: defaults.box_size,
            border: defaults.border,
            logo: defaults.logo,
            logo_scale: defaults.logo_scale,
            white_pad: defaults.white_pad,
            rounded_white_box: defaults.rounded_white_box,
            white_box_radius: defaults.white_box_radius,
            recolor: defaults.recolor,
            color_top: defaults.color_top,
            color_bottom: defaults.color_bottom,
        }
    }
}

impl From<QrFile> for QrConfig {
    fn from(file: QrFile) -> Self {
        Self {
            data: file
                .data
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            output: expand_tilde(&file.output),
            box_size: file.box_size,
            border: file.border,
            logo: file.logo.map(|path| expand_tilde(&path)),
            logo_scale: file.logo_scale,
            white_pad: file.white_pad,
            rounded_white_box: file.rounded_white_box,
            white_box_radius: file.white_box_radius,
            recolor: file.recolor,
            color_top: file.color_top,
            color_bottom: file.color_bottom,
        }
    }
}

fn links_from_file(links: Option<BTreeMap<String, Patterns>>) -> LinkSlots {
    let Some(links) = links else {
        return LinkSlots::default();
    };

    let mut slots = LinkSlots::empty();
    for (slot, patterns) in links {
        let patterns: Vec<String> = patterns
            .into_vec()
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            warn!("links.{slot} has no patterns; slot ignored");
            continue;
        }
        slots.insert(slot, patterns);
    }
    slots
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `explicit` or the default location. A missing
/// default file yields built-in defaults; a missing explicit file is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let mut config = parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse configuration as TOML")?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    let source = cfg_file
        .source
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let qr: QrConfig = cfg_file.qr.into();
    qr.validate()?;

    Ok(Config {
        config_path: None,
        source,
        links: links_from_file(cfg_file.links),
        contact: cfg_file.contact.into(),
        qr,
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in_section(value, "", &["source", "links", "contact", "qr"]);

    if let Some(contact) = table.get("contact") {
        warn_unknown_in_section(
            contact,
            "contact.",
            &["phone_link_base", "fallback_file_stem"],
        );
    }
    if let Some(qr) = table.get("qr") {
        warn_unknown_in_section(
            qr,
            "qr.",
            &[
                "data",
                "output",
                "box_size",
                "border",
                "logo",
                "logo_scale",
                "white_pad",
                "rounded_white_box",
                "white_box_radius",
                "recolor",
                "color_top",
                "color_bottom",
            ],
        );
    }
}

fn warn_unknown_in_section(value: &toml::Value, prefix: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            warn!("unknown configuration key `{prefix}{key}`");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = parse("").unwrap();

        assert!(config.source.is_none());
        assert_eq!(config.contact.phone_link_base, "https://wa.me/");
        assert_eq!(config.contact.fallback_file_stem, "contacto");
        assert_eq!(config.qr.box_size, 12);
        assert_eq!(config.qr.border, 4);
        assert_eq!(config.qr.color_top, RgbColor::new(20, 50, 95));
        assert_eq!(
            config.links.names().collect::<Vec<_>>(),
            vec!["github", "instagram", "linkedin"]
        );
    }

    #[test]
    fn test_parse_links_single_and_multiple() {
        let config = parse(
            r#"
[links]
professional = "linkedin"
code = ["github", "gitlab", "  "]
empty = []
"#,
        )
        .unwrap();

        assert_eq!(
            config.links.names().collect::<Vec<_>>(),
            vec!["code", "professional"]
        );
        let links = config.links.classify(&["https://GitLab.com/me".to_string()]);
        assert_eq!(links[0].slot, "code");
        assert_eq!(links[0].url.as_deref(), Some("https://GitLab.com/me"));
        assert!(links[1].url.is_none());
    }

    #[test]
    fn test_parse_colors_array_and_map() {
        let config = parse(
            r#"
[qr]
recolor = true
color_top = [1, 2, 3]
color_bottom = { r = 4, g = 5, b = 6 }
"#,
        )
        .unwrap();

        assert!(config.qr.recolor);
        assert_eq!(config.qr.color_top, RgbColor::new(1, 2, 3));
        assert_eq!(config.qr.color_bottom, RgbColor::new(4, 5, 6));
    }

    #[test]
    fn test_parse_rejects_malformed_colors() {
        assert!(parse("[qr]\ncolor_top = [1, 2]\n").is_err());
        assert!(parse("[qr]\ncolor_top = [1, 2, 300]\n").is_err());
        assert!(parse("[qr]\ncolor_top = { r = 1, g = 2 }\n").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_logo_scale() {
        assert!(parse("[qr]\nlogo_scale = 1.5\n").is_err());
        assert!(parse("[qr]\nlogo_scale = 0.0\n").is_err());
        assert!(parse("[qr]\nbox_size = 0\n").is_err());
    }

    #[test]
    fn test_parse_blank_values_fall_back() {
        let config = parse(
            r#"
source = "   "
[contact]
fallback_file_stem = " "
"#,
        )
        .unwrap();

        assert!(config.source.is_none());
        assert_eq!(config.contact.fallback_file_stem, "contacto");
    }

    #[test]
    fn test_parse_unknown_keys_are_not_errors() {
        let config = parse("mystery = 1\n[qr]\nshape = \"round\"\n").unwrap();
        assert_eq!(config.qr.output, PathBuf::from("QR.png"));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.toml");
        assert!(load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "source = \"card.vcf\"\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.source.as_deref(), Some("card.vcf"));
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }
}
