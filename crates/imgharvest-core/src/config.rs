//! `harvest.toml` configuration.
//!
//! Every path, threshold and table the pipelines use lives here. The
//! defaults reproduce the one document and one site layout the tool was
//! written for, so an empty (or absent) file behaves like the original
//! hard-coded setup.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! document = "design.pdf"
//! images = "assets/images"
//!
//! [extract]
//! strategy = "priority"
//! min_area = 40000
//!
//! [[mapping.rules]]
//! page = 3
//! image = 39
//! category = "hero"
//! target = "main-hero.jpeg"
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::MockupThresholds;
use crate::error::HarvestError;
use crate::rules::{DEFAULT_CATEGORIES, MappingRule, default_rules};
use crate::scan::DEFAULT_ASSET_PREFIX;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "harvest.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub extract: ExtractConfig,
    pub mapping: MappingConfig,
    pub cleanup: CleanupConfig,

    /// Directory relative paths are resolved against. Set by [`HarvestConfig::load`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// `[paths]`: where the document and the site's image folders live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Project root, relative to the config file's directory.
    pub root: PathBuf,
    /// Source document, relative to `root`.
    pub document: PathBuf,
    /// Images directory holding the category folders, relative to `root`.
    pub images: PathBuf,
    /// Staging folder name inside `images`.
    pub staging: String,
    /// Root-relative prefix that asset references must start with.
    pub asset_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            document: PathBuf::from("SF리마스터 웹기획서_260115.pdf"),
            images: PathBuf::from("assets/images"),
            staging: "other".to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
        }
    }
}

/// `[sources]`: site files scanned for asset references, relative to `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub markup: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
    /// Directories whose `*.css` files are scanned (not recursive).
    pub style_dirs: Vec<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            markup: vec![PathBuf::from("src/html/index.html")],
            scripts: vec![PathBuf::from("src/js/main.js")],
            style_dirs: vec![PathBuf::from("src/css")],
        }
    }
}

/// Which images the extraction driver keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractStrategy {
    /// Every image, named without dimensions.
    All,
    /// Flat minimum width/height filter.
    MinSize,
    /// Minimum area, page priority ordering and duplicate suppression.
    Priority,
    /// Six-gate mockup classifier.
    #[default]
    Mockup,
}

impl ExtractStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStrategy::All => "all",
            ExtractStrategy::MinSize => "min-size",
            ExtractStrategy::Priority => "priority",
            ExtractStrategy::Mockup => "mockup",
        }
    }
}

/// Priority of one page; lower numbers mark more important pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePriority {
    /// 1-based page number.
    pub page: usize,
    pub priority: u32,
}

/// `[extract]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub strategy: ExtractStrategy,
    /// `min-size`: minimum pixel width.
    pub min_width: u32,
    /// `min-size`: minimum pixel height.
    pub min_height: u32,
    /// `priority`: minimum pixel area.
    pub min_area: u64,
    /// `priority`: leave the page number out of the duplicate key.
    pub dedupe_across_pages: bool,
    /// `priority`: priority for pages missing from `page_priority`.
    pub default_priority: u32,
    pub page_priority: Vec<PagePriority>,
    /// `mockup`: classifier thresholds.
    pub mockup: MockupThresholds,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let table: [(usize, u32); 18] = [
            (1, 1),
            (2, 2),
            (3, 1),
            (4, 2),
            (5, 3),
            (6, 3),
            (7, 2),
            (8, 3),
            (9, 3),
            (10, 3),
            (11, 2),
            (12, 3),
            (13, 2),
            (14, 2),
            (15, 2),
            (16, 2),
            (17, 3),
            (18, 2),
        ];
        Self {
            strategy: ExtractStrategy::default(),
            min_width: 300,
            min_height: 200,
            min_area: 50_000,
            dedupe_across_pages: false,
            default_priority: 10,
            page_priority: table
                .iter()
                .map(|&(page, priority)| PagePriority { page, priority })
                .collect(),
            mockup: MockupThresholds::default(),
        }
    }
}

impl ExtractConfig {
    /// Priority of a 1-based page number.
    pub fn priority_for(&self, page: usize) -> u32 {
        self.page_priority
            .iter()
            .find(|p| p.page == page)
            .map_or(self.default_priority, |p| p.priority)
    }
}

/// Order in which staged files are offered to mapping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOrder {
    /// Ascending file name.
    #[default]
    Name,
    /// Largest `<W>x<H>` area first, then file name.
    LargestFirst,
}

/// `[mapping]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Category folder names under the images directory.
    pub categories: Vec<String>,
    pub order: CandidateOrder,
    /// When no file matches `page<P>_img<I>`, take the first file of page `P`.
    pub page_fallback: bool,
    pub rules: Vec<MappingRule>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            order: CandidateOrder::default(),
            page_fallback: false,
            rules: default_rules(),
        }
    }
}

/// `[cleanup]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Extensions (case-insensitive) considered site images.
    pub extensions: Vec<String>,
    /// Keep same-stem siblings of a required file with another image extension.
    pub keep_same_stem: bool,
    /// Folders under the images directory scanned besides the categories.
    pub folders: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "svg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            keep_same_stem: true,
            folders: vec!["backgrounds".to_string()],
        }
    }
}

impl CleanupConfig {
    pub fn is_image(&self, file_name: &str) -> bool {
        crate::rules::file_extension(file_name)
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

impl HarvestConfig {
    /// Parse TOML, returning the config and the dotted paths of unknown keys.
    pub fn from_toml_str(content: &str) -> Result<(Self, Vec<String>), HarvestError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            ignored.push(path.to_string());
        })
        .map_err(|e| HarvestError::Config(e.to_string()))?;
        config.validate()?;
        Ok((config, ignored))
    }

    /// Load a config file; relative paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        let content = fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;
        let (mut config, ignored) = Self::from_toml_str(&content)
            .map_err(|e| HarvestError::Config(format!("{}: {e}", path.display())))?;
        for field in &ignored {
            tracing::warn!(config = %path.display(), field = %field, "ignoring unknown config field");
        }
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to the defaults with
    /// paths relative to the current directory.
    pub fn load_or_default(path: &Path) -> Result<Self, HarvestError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(config = %path.display(), "config file absent, using defaults");
            Ok(Self::default())
        }
    }

    /// Check that every rule has a selector and a known category.
    pub fn validate(&self) -> Result<(), HarvestError> {
        for (i, rule) in self.mapping.rules.iter().enumerate() {
            if rule.selector().is_none() {
                return Err(HarvestError::Config(format!(
                    "mapping rule {} needs either `source` or both `page` and `image`",
                    i + 1
                )));
            }
            if !self.mapping.categories.contains(&rule.category) {
                return Err(HarvestError::Config(format!(
                    "mapping rule {} uses unknown category '{}'",
                    i + 1,
                    rule.category
                )));
            }
        }
        if self.paths.staging.is_empty() {
            return Err(HarvestError::Config("paths.staging must not be empty".into()));
        }
        let images = self.paths.images_url_path();
        let prefix = self.paths.asset_prefix.trim_matches('/');
        if images != prefix.trim_start_matches("./") {
            return Err(HarvestError::Config(format!(
                "paths.images '{images}' does not match paths.asset_prefix '{}'",
                self.paths.asset_prefix
            )));
        }
        Ok(())
    }
}

impl PathsConfig {
    /// `images` as a `/`-separated path, as site references spell it.
    pub fn images_url_path(&self) -> String {
        self.images
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
