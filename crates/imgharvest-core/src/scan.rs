//! Asset reference scanning.
//!
//! Finds the image paths a site's markup, stylesheets and scripts refer to.
//! Three patterns are recognized in any source:
//!
//! - `src="..."` / `src='...'` attributes
//! - `url(...)` references, quoted or not
//! - quoted string literals that start with the asset prefix
//!
//! Every hit is normalized to a root-relative path (`assets/images/...`);
//! hits outside the asset prefix are dropped.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Root-relative prefix shared by all site images.
pub const DEFAULT_ASSET_PREFIX: &str = "assets/images/";

static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(([^)]+)\)").expect("valid regex"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"'\s()]+)["']"#).expect("valid regex"));

/// The set of asset paths a site declares it needs.
pub type RequiredPaths = BTreeSet<String>;

/// Normalize a raw reference to a root-relative path under `prefix`.
///
/// Strips surrounding quotes and whitespace, any `?query` or `#fragment`,
/// and leading `/`, `./` and `../` segments. Returns `None` when the result
/// does not start with `prefix` or climbs out of it with a `..` segment.
pub fn normalize_asset_path(raw: &str, prefix: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(['"', '\'']).trim();
    let path = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut rest = path;
    loop {
        if let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }

    let tail = rest.strip_prefix(prefix)?;
    if tail.is_empty() || tail.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(rest.to_string())
}

/// Pattern-based reference scanner for one asset prefix.
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    prefix: String,
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_PREFIX)
    }
}

impl ReferenceScanner {
    /// Create a scanner; a trailing `/` is added to `prefix` when missing.
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_start_matches('/');
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Scan `text` and return every normalized reference found.
    pub fn scan(&self, text: &str) -> RequiredPaths {
        let mut found = RequiredPaths::new();
        self.scan_into(text, &mut found);
        found
    }

    /// Scan `text`, adding normalized references to `found`.
    pub fn scan_into(&self, text: &str, found: &mut RequiredPaths) {
        for re in [&*SRC_ATTR, &*CSS_URL, &*QUOTED] {
            for caps in re.captures_iter(text) {
                if let Some(path) = normalize_asset_path(&caps[1], &self.prefix) {
                    found.insert(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<String> {
        ReferenceScanner::default().scan(text).into_iter().collect()
    }

    #[test]
    fn markup_src_strips_leading_slash() {
        let found = scan(r#"<img src="/assets/images/hero/main-hero.png" alt="">"#);
        assert_eq!(found, vec!["assets/images/hero/main-hero.png"]);
    }

    #[test]
    fn single_quoted_src() {
        let found = scan("<img src='/assets/images/news/news-001.jpeg'>");
        assert_eq!(found, vec!["assets/images/news/news-001.jpeg"]);
    }

    #[test]
    fn stylesheet_relative_url() {
        let found = scan(".logo { background: url(../assets/images/logo/shield-logo.svg); }");
        assert_eq!(found, vec!["assets/images/logo/shield-logo.svg"]);
    }

    #[test]
    fn quoted_url_in_script() {
        let found =
            scan("hero.style.backgroundImage = 'url(/assets/images/hero/hero-bg-fallback.jpg)';");
        assert_eq!(found, vec!["assets/images/hero/hero-bg-fallback.jpg"]);
    }

    #[test]
    fn plain_string_literal_in_script() {
        let found = scan(r#"const icon = "/assets/images/icons/youtube.svg";"#);
        assert_eq!(found, vec!["assets/images/icons/youtube.svg"]);
    }

    #[test]
    fn ignores_paths_outside_prefix() {
        let found = scan(
            r#"<script src="/src/js/main.js"></script><link href="x.css">
               .a { background: url(data:image/png;base64,AAAA); }
               .b { background: url("https://cdn.example.com/assets/images/x.png"); }"#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let found = scan(
            r#"<img src="/assets/images/hero/a.png"><img src="assets/images/hero/a.png">
               .x { background: url('../assets/images/hero/a.png') }"#,
        );
        assert_eq!(found, vec!["assets/images/hero/a.png"]);
    }

    #[test]
    fn normalize_strips_query_and_dot_segments() {
        assert_eq!(
            normalize_asset_path("  './../assets/images/hero/a.png?v=3#x' ", DEFAULT_ASSET_PREFIX),
            Some("assets/images/hero/a.png".to_string())
        );
        assert_eq!(normalize_asset_path("/assets/images/", DEFAULT_ASSET_PREFIX), None);
        assert_eq!(normalize_asset_path("/img/a.png", DEFAULT_ASSET_PREFIX), None);
    }

    #[test]
    fn parent_segments_after_prefix_are_dropped() {
        assert_eq!(
            normalize_asset_path("/assets/images/../../x.png", DEFAULT_ASSET_PREFIX),
            None
        );
        assert_eq!(
            normalize_asset_path("assets/images/hero/../a.png", DEFAULT_ASSET_PREFIX),
            None
        );
        assert!(scan(r#"<img src="/assets/images/../../etc/x.png">"#).is_empty());
        assert_eq!(
            normalize_asset_path("/assets/images/hero/a..b.png", DEFAULT_ASSET_PREFIX).as_deref(),
            Some("assets/images/hero/a..b.png")
        );
    }

    #[test]
    fn custom_prefix_gets_trailing_slash() {
        let scanner = ReferenceScanner::new("/static/img");
        assert_eq!(scanner.prefix(), "static/img/");
        let found = scanner.scan(r#"<img src="/static/img/a.png"><img src="/static/imgx/b.png">"#);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["static/img/a.png"]);
    }
}
