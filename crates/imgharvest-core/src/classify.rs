//! Mockup classification heuristics.
//!
//! Decides from geometry alone whether an embedded image looks like a web
//! page mockup (large, landscape, in the upper part of the page) or a
//! planning graphic (diagram, icon, text block).

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// Page size the estimator assumes the document was authored at.
pub const BASELINE_PAGE_WIDTH: f64 = 960.0;
pub const BASELINE_PAGE_HEIGHT: f64 = 540.0;
/// Fudge factor applied on top of the baseline page size.
pub const ESTIMATE_SCALE: f64 = 1.5;

/// Resolution of PDF user space and of the screen it is shown on.
pub const PDF_DPI: f64 = 72.0;
pub const SCREEN_DPI: f64 = 96.0;

/// Width over height, or 0 when the height is 0.
pub fn aspect_ratio(width: f64, height: f64) -> f64 {
    if height > 0.0 { width / height } else { 0.0 }
}

/// Thresholds of the six-gate mockup test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockupThresholds {
    pub min_width: f64,
    pub min_height: f64,
    pub min_area: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Multiplier on the page's vertical center; images whose top lies below
    /// `page_height * 0.5 * max_center_offset` are rejected.
    pub max_center_offset: f64,
    /// Minimum share of the page width the image must span.
    pub min_width_ratio: f64,
}

impl Default for MockupThresholds {
    fn default() -> Self {
        Self {
            min_width: 600.0,
            min_height: 300.0,
            min_area: 180_000.0,
            min_aspect_ratio: 1.0,
            max_aspect_ratio: 3.5,
            max_center_offset: 1.4,
            min_width_ratio: 0.4,
        }
    }
}

impl MockupThresholds {
    /// Apply every gate; any failure classifies the image as a planning graphic.
    pub fn accepts(
        &self,
        width: f64,
        height: f64,
        area: f64,
        y_pos: f64,
        page_height: f64,
        page_width: f64,
    ) -> bool {
        if width < self.min_width || height < self.min_height {
            return false;
        }

        if area < self.min_area {
            return false;
        }

        let ratio = aspect_ratio(width, height);
        if ratio < self.min_aspect_ratio {
            return false;
        }

        let page_center_y = page_height * 0.5;
        if y_pos > page_center_y * self.max_center_offset {
            return false;
        }

        let width_ratio = if page_width > 0.0 { width / page_width } else { 0.0 };
        if width_ratio < self.min_width_ratio {
            return false;
        }

        ratio <= self.max_aspect_ratio
    }
}

/// Six-gate mockup test with the default thresholds.
pub fn is_web_mockup(
    width: f64,
    height: f64,
    area: f64,
    y_pos: f64,
    page_height: f64,
    page_width: f64,
) -> bool {
    MockupThresholds::default().accepts(width, height, area, y_pos, page_height, page_width)
}

/// Back-compute a pixel size from where an image sits on the page.
///
/// Assumes a 960x540 page rendered at 1.5x. This is an approximation with
/// no ground truth behind it; callers feed the result to the classifier
/// unadjusted.
pub fn estimate_pixel_size(placement: &BBox, page_width: f64, page_height: f64) -> (u32, u32) {
    let w = placement.width();
    let h = placement.height();
    if page_width > 0.0 && page_height > 0.0 {
        (
            (w / page_width * BASELINE_PAGE_WIDTH * ESTIMATE_SCALE) as u32,
            (h / page_height * BASELINE_PAGE_HEIGHT * ESTIMATE_SCALE) as u32,
        )
    } else {
        ((w * ESTIMATE_SCALE) as u32, (h * ESTIMATE_SCALE) as u32)
    }
}

/// Back-compute a pixel size by rendering the placement at 96 DPI.
pub fn estimate_screen_size(placement: &BBox) -> (u32, u32) {
    (
        (placement.width() * SCREEN_DPI / PDF_DPI) as u32,
        (placement.height() * SCREEN_DPI / PDF_DPI) as u32,
    )
}

/// How a size is back-computed when the image metadata lacks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeEstimate {
    /// [`estimate_pixel_size`]: share of a 960x540 page at 1.5x.
    PageScale,
    /// [`estimate_screen_size`]: placement points at 96 DPI.
    ScreenDpi,
}

/// Coarse size bucket used in extraction summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeClass {
    /// At least 1000x600.
    Large,
    /// At least 500x300.
    Medium,
    Small,
}

impl SizeClass {
    pub fn of(width: u32, height: u32) -> Self {
        if width >= 1000 && height >= 600 {
            SizeClass::Large
        } else if width >= 500 && height >= 300 {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SizeClass::Large => "Large (1000x600+)",
            SizeClass::Medium => "Medium (500x300+)",
            SizeClass::Small => "Small (<500x300)",
        }
    }
}
