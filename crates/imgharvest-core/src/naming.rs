//! Staged filename encoding.
//!
//! Extracted images are written as `page<P>_img<I>[_<W>x<H>].<ext>`, where
//! `P` is the 1-based page number and `I` the 1-based position of the image
//! in the page's image list. Mapping rules and summaries parse these names
//! back, so the format is the contract between the two pipelines.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static STAGED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^page(\d+)_img(\d+)(?:_(\d+)x(\d+))?\.([A-Za-z0-9]+)$").expect("valid regex")
});

static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)x(\d+)").expect("valid regex"));

/// Parsed or to-be-written staged file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedName {
    /// 1-based page number.
    pub page: usize,
    /// 1-based image number within the page.
    pub image: usize,
    /// Pixel size, when known at extraction time.
    pub size: Option<(u32, u32)>,
    /// Extension without the dot.
    pub extension: String,
}

impl StagedName {
    /// Name for the image at 0-based `image_index` on 1-based page `page`.
    pub fn new(
        page: usize,
        image_index: usize,
        size: Option<(u32, u32)>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            page,
            image: image_index + 1,
            size,
            extension: extension.into(),
        }
    }

    /// Parse a file name produced by [`StagedName::file_name`].
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = STAGED_NAME.captures(file_name)?;
        let page = caps[1].parse().ok()?;
        let image = caps[2].parse().ok()?;
        let size = match (caps.get(3), caps.get(4)) {
            (Some(w), Some(h)) => Some((w.as_str().parse().ok()?, h.as_str().parse().ok()?)),
            _ => None,
        };
        Some(Self {
            page,
            image,
            size,
            extension: caps[5].to_string(),
        })
    }

    /// File name without the extension.
    pub fn stem(&self) -> String {
        match self.size {
            Some((w, h)) => format!("page{}_img{}_{w}x{h}", self.page, self.image),
            None => format!("page{}_img{}", self.page, self.image),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.extension)
    }
}

impl fmt::Display for StagedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem(), self.extension)
    }
}

/// Prefix a mapping rule looks for: `page<P>_img<I>`.
///
/// Matching is a plain `starts_with`, so `page3_img1` also matches
/// `page3_img12_...`. The first staged file in listing order wins.
pub fn rule_prefix(page: usize, image: usize) -> String {
    format!("page{page}_img{image}")
}

/// Prefix shared by every image of a page: `page<P>_img`.
pub fn page_prefix(page: usize) -> String {
    format!("page{page}_img")
}

/// First `_<W>x<H>` group found in a file stem.
pub fn size_from_stem(stem: &str) -> Option<(u32, u32)> {
    let caps = SIZE_SUFFIX.captures(stem)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_page_index_and_size() {
        let name = StagedName::new(3, 0, Some((2080, 1234)), "jpeg");
        assert_eq!(name.file_name(), "page3_img1_2080x1234.jpeg");
        assert_eq!(name.to_string(), "page3_img1_2080x1234.jpeg");
    }

    #[test]
    fn encodes_without_size() {
        let name = StagedName::new(13, 6, None, "png");
        assert_eq!(name.file_name(), "page13_img7.png");
        assert_eq!(name.stem(), "page13_img7");
    }

    #[test]
    fn parses_sized_name() {
        let name = StagedName::parse("page11_img4_943x462.jpeg").unwrap();
        assert_eq!(name.page, 11);
        assert_eq!(name.image, 4);
        assert_eq!(name.size, Some((943, 462)));
        assert_eq!(name.extension, "jpeg");
    }

    #[test]
    fn parses_unsized_name() {
        let name = StagedName::parse("page1_img2.png").unwrap();
        assert_eq!((name.page, name.image, name.size), (1, 2, None));
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(StagedName::parse("main-hero.jpeg").is_none());
        assert!(StagedName::parse("page1_img2").is_none());
        assert!(StagedName::parse("xpage1_img2.png").is_none());
    }

    #[test]
    fn rule_prefix_is_loose() {
        let prefix = rule_prefix(3, 1);
        assert_eq!(prefix, "page3_img1");
        assert!("page3_img12_800x600".starts_with(&prefix));
        assert!("page3_img1_1257x629".starts_with(&prefix));
        assert_eq!(page_prefix(7), "page7_img");
    }

    #[test]
    fn size_from_stem_reads_first_group() {
        assert_eq!(size_from_stem("page7_img1_1622x912"), Some((1622, 912)));
        assert_eq!(size_from_stem("page7_img1"), None);
        assert_eq!(size_from_stem("news-001"), None);
    }
}
