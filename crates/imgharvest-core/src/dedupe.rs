//! Duplicate image suppression.
//!
//! Design documents often repeat the same screenshot on one page (or across
//! pages). Images are grouped by a coarse key of pixel size and vertical
//! position bucketed to 100 units; only the first image of each group is
//! kept.

use std::collections::HashMap;

/// Height of one vertical position bucket, in page units.
pub const Y_BUCKET: f64 = 100.0;

/// Grouping key for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    /// 0-based page index, `None` when grouping across the whole document.
    pub page: Option<usize>,
    pub width: u32,
    pub height: u32,
    /// Top of the image truncated to a multiple of [`Y_BUCKET`].
    pub y_bucket: i64,
}

impl DuplicateKey {
    pub fn new(page: Option<usize>, width: u32, height: u32, y_pos: f64) -> Self {
        Self {
            page,
            width,
            height,
            y_bucket: (y_pos / Y_BUCKET) as i64 * Y_BUCKET as i64,
        }
    }
}

/// First-wins duplicate filter.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    across_pages: bool,
    seen: HashMap<DuplicateKey, String>,
}

impl DuplicateFilter {
    /// Create a filter. With `across_pages` the page number is left out of
    /// the key, so similar images on different pages collide.
    pub fn new(across_pages: bool) -> Self {
        Self {
            across_pages,
            seen: HashMap::new(),
        }
    }

    pub fn key(&self, page: usize, width: u32, height: u32, y_pos: f64) -> DuplicateKey {
        let page = if self.across_pages { None } else { Some(page) };
        DuplicateKey::new(page, width, height, y_pos)
    }

    /// Label of the image that already holds `key`, if any.
    pub fn holder(&self, key: &DuplicateKey) -> Option<&str> {
        self.seen.get(key).map(String::as_str)
    }

    /// Record `label` under `key` unless the key is taken.
    pub fn claim(&mut self, key: DuplicateKey, label: &str) {
        self.seen.entry(key).or_insert_with(|| label.to_string());
    }

    /// Record `label` under the key for this image.
    ///
    /// Returns `Err` with the label of the earlier image when the key was
    /// already taken; the new image should then be skipped.
    pub fn admit(
        &mut self,
        page: usize,
        width: u32,
        height: u32,
        y_pos: f64,
        label: &str,
    ) -> Result<(), String> {
        let key = self.key(page, width, height, y_pos);
        if let Some(existing) = self.holder(&key) {
            return Err(existing.to_string());
        }
        self.claim(key, label);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_truncates_to_hundreds() {
        assert_eq!(DuplicateKey::new(None, 1, 1, 0.0).y_bucket, 0);
        assert_eq!(DuplicateKey::new(None, 1, 1, 99.9).y_bucket, 0);
        assert_eq!(DuplicateKey::new(None, 1, 1, 100.0).y_bucket, 100);
        assert_eq!(DuplicateKey::new(None, 1, 1, 257.0).y_bucket, 200);
    }

    #[test]
    fn same_page_same_bucket_is_duplicate() {
        let mut filter = DuplicateFilter::new(false);
        assert!(filter.admit(0, 800, 400, 120.0, "page1_img1").is_ok());
        assert_eq!(
            filter.admit(0, 800, 400, 180.0, "page1_img2"),
            Err("page1_img1".to_string())
        );
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn different_bucket_is_kept() {
        let mut filter = DuplicateFilter::new(false);
        assert!(filter.admit(0, 800, 400, 120.0, "a").is_ok());
        assert!(filter.admit(0, 800, 400, 220.0, "b").is_ok());
        assert!(filter.admit(0, 801, 400, 120.0, "c").is_ok());
    }

    #[test]
    fn page_scoped_keys_keep_other_pages() {
        let mut filter = DuplicateFilter::new(false);
        assert!(filter.admit(0, 1617, 302, 10.0, "page1").is_ok());
        assert!(filter.admit(1, 1617, 302, 10.0, "page2").is_ok());
    }

    #[test]
    fn holder_without_claim_leaves_key_free() {
        let mut filter = DuplicateFilter::new(false);
        let key = filter.key(2, 640, 480, 50.0);
        assert_eq!(filter.holder(&key), None);
        filter.claim(key, "page3_img1");
        filter.claim(key, "page3_img2");
        assert_eq!(filter.holder(&key), Some("page3_img1"));
    }

    #[test]
    fn document_scoped_keys_collide_across_pages() {
        let mut filter = DuplicateFilter::new(true);
        assert!(filter.admit(14, 1617, 302, 10.0, "page15_img1").is_ok());
        assert_eq!(
            filter.admit(15, 1617, 302, 10.0, "page16_img1"),
            Err("page15_img1".to_string())
        );
    }
}
