//! Mapping rules: which staged file becomes which site asset.

use serde::{Deserialize, Serialize};

use crate::naming::{page_prefix, rule_prefix};

/// Default asset categories, one folder each under the images directory.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["logo", "hero", "features", "news", "icons"];

/// How a rule picks its staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelector {
    /// First file whose stem starts with `page<P>_img<I>`.
    Image { page: usize, image: usize },
    /// The staged file with exactly this name.
    File(String),
}

impl RuleSelector {
    /// Whether `file_name` satisfies this selector.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            RuleSelector::Image { page, image } => {
                file_stem(file_name).starts_with(&rule_prefix(*page, *image))
            }
            RuleSelector::File(name) => file_name == name,
        }
    }

    /// Whether `file_name` belongs to the same page, for page-level fallback.
    pub fn matches_page(&self, file_name: &str) -> bool {
        match self {
            RuleSelector::Image { page, .. } => file_stem(file_name).starts_with(&page_prefix(*page)),
            RuleSelector::File(_) => false,
        }
    }

    /// Pattern shown in reports.
    pub fn describe(&self) -> String {
        match self {
            RuleSelector::Image { page, image } => rule_prefix(*page, *image),
            RuleSelector::File(name) => name.clone(),
        }
    }
}

/// A hand-authored `(selector, category, target)` tuple.
///
/// Either `page` + `image` or `source` selects the staged file. Nothing
/// stops two rules from naming the same target; the later copy wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// 1-based image number within the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<usize>,
    /// Exact staged file name, as an alternative to `page` + `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Target folder name (e.g. "hero").
    pub category: String,
    /// Target file name inside the category folder.
    pub target: String,
}

impl MappingRule {
    pub fn image(page: usize, image: usize, category: &str, target: &str) -> Self {
        Self {
            page: Some(page),
            image: Some(image),
            source: None,
            category: category.to_string(),
            target: target.to_string(),
        }
    }

    pub fn file(source: &str, category: &str, target: &str) -> Self {
        Self {
            page: None,
            image: None,
            source: Some(source.to_string()),
            category: category.to_string(),
            target: target.to_string(),
        }
    }

    /// The selector, or `None` when the rule names neither a complete
    /// `page`/`image` pair nor a `source`.
    pub fn selector(&self) -> Option<RuleSelector> {
        match (&self.source, self.page, self.image) {
            (Some(source), _, _) => Some(RuleSelector::File(source.clone())),
            (None, Some(page), Some(image)) => Some(RuleSelector::Image { page, image }),
            _ => None,
        }
    }
}

/// The rule table the site was last built with.
pub fn default_rules() -> Vec<MappingRule> {
    vec![
        MappingRule::image(3, 39, "hero", "main-hero.jpeg"),
        MappingRule::image(3, 1, "hero", "hero-bg-fallback.jpeg"),
        MappingRule::image(7, 1, "features", "level-design.jpeg"),
        MappingRule::image(11, 2, "features", "moving-control.jpeg"),
        MappingRule::image(11, 3, "features", "shooting-system.jpeg"),
        MappingRule::image(11, 4, "features", "weapon-system.jpeg"),
        MappingRule::image(13, 7, "news", "news-001.jpeg"),
        MappingRule::image(18, 1, "news", "news-002.jpeg"),
        MappingRule::image(19, 5, "news", "news-003.jpeg"),
        MappingRule::image(6, 1, "news", "news-004.jpeg"),
    ]
}

/// File name without its last extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    }
}

/// Lowercased last extension, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(file_name[dot + 1..].to_ascii_lowercase()),
    }
}

/// Replace the target's extension with the source's when they differ.
///
/// Comparison is case-insensitive. Content is never transcoded, so a rule
/// asking for `main-hero.jpeg` that matches a `.png` file yields
/// `main-hero.png`. Returns the file name to write and whether it changed.
pub fn adjust_extension(target: &str, source_file: &str) -> (String, bool) {
    let source_ext = file_extension(source_file).unwrap_or_default();
    let target_ext = file_extension(target).unwrap_or_default();
    if source_ext == target_ext {
        return (target.to_string(), false);
    }
    let stem = file_stem(target);
    if source_ext.is_empty() {
        (stem.to_string(), true)
    } else {
        (format!("{stem}.{source_ext}"), true)
    }
}
