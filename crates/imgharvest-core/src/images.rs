//! Embedded image model.
//!
//! A [`PageImage`] describes one image XObject referenced by a page: its
//! stream metadata plus the rectangle it is first painted into. The payload
//! is fetched separately as [`ImageContent`] so that listing a document stays
//! cheap.

use crate::classify::{SizeEstimate, aspect_ratio, estimate_pixel_size, estimate_screen_size};
use crate::geometry::BBox;

/// PDF stream filter used to encode image data.
///
/// Maps to the last entry of the `/Filter` chain in an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG compression (DCTDecode).
    DCTDecode,
    /// Flate (zlib/deflate) compression.
    FlateDecode,
    /// CCITT fax compression (Group 3 or 4).
    CCITTFaxDecode,
    /// JBIG2 compression.
    JBIG2Decode,
    /// JPEG 2000 compression (JPXDecode).
    JPXDecode,
    /// LZW compression.
    LZWDecode,
    /// Run-length encoding.
    RunLengthDecode,
    /// No filter, raw samples.
    Raw,
}

impl ImageFilter {
    /// Parse a PDF filter name string to an `ImageFilter`.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "DCTDecode" | "DCT" => ImageFilter::DCTDecode,
            "FlateDecode" | "Fl" => ImageFilter::FlateDecode,
            "CCITTFaxDecode" | "CCF" => ImageFilter::CCITTFaxDecode,
            "JBIG2Decode" => ImageFilter::JBIG2Decode,
            "JPXDecode" => ImageFilter::JPXDecode,
            "LZWDecode" | "LZW" => ImageFilter::LZWDecode,
            "RunLengthDecode" | "RL" => ImageFilter::RunLengthDecode,
            _ => ImageFilter::Raw,
        }
    }

    /// Whether the stream holds plain samples once the filter chain is undone.
    pub fn yields_samples(&self) -> bool {
        matches!(
            self,
            ImageFilter::FlateDecode
                | ImageFilter::LZWDecode
                | ImageFilter::RunLengthDecode
                | ImageFilter::Raw
        )
    }
}

/// Encoded format of a staged image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG bytes copied straight from a DCTDecode stream.
    Jpeg,
    /// PNG produced from raw samples.
    Png,
    /// JPEG 2000 codestream.
    Jpx,
    /// JBIG2 segment data.
    Jbig2,
}

impl ImageFormat {
    /// File extension used for staged files.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Jpx => "jpx",
            ImageFormat::Jbig2 => "jb2",
        }
    }
}

/// Image payload ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    /// Encoded file bytes.
    pub data: Vec<u8>,
    /// Encoding of `data`.
    pub format: ImageFormat,
    /// Pixel width from the stream dictionary (0 when absent).
    pub width: u32,
    /// Pixel height from the stream dictionary (0 when absent).
    pub height: u32,
}

/// An image XObject referenced by a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// 0-based position in the page's image list.
    pub index: usize,
    /// Resource name (e.g. "Im0").
    pub name: String,
    /// Object number and generation of the image stream.
    pub xref: (u32, u16),
    /// `/Width` from the stream dictionary.
    pub src_width: Option<u32>,
    /// `/Height` from the stream dictionary.
    pub src_height: Option<u32>,
    /// `/BitsPerComponent`.
    pub bits_per_component: Option<u32>,
    /// Color space name (e.g. "DeviceRGB").
    pub color_space: Option<String>,
    /// Last filter of the `/Filter` chain.
    pub filter: Option<ImageFilter>,
    /// First rectangle the image is painted into, if it is painted at all.
    pub placement: Option<BBox>,
}

/// Pixel size of an image and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSize {
    pub width: u32,
    pub height: u32,
    /// `true` when the size was back-computed from the placement rectangle.
    pub estimated: bool,
}

impl ResolvedSize {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        aspect_ratio(f64::from(self.width), f64::from(self.height))
    }
}

impl PageImage {
    /// Distance from the top of the page to the image, 0 when never painted.
    pub fn y_pos(&self) -> f64 {
        self.placement.map_or(0.0, |p| p.top)
    }

    /// Resolve pixel dimensions.
    ///
    /// Stream metadata wins when both values are present and non-zero.
    /// Otherwise the size is estimated from the placement rectangle; an
    /// image that is never painted has no size.
    pub fn resolve_size(&self, page_width: f64, page_height: f64) -> Option<ResolvedSize> {
        self.resolve_size_with(SizeEstimate::PageScale, page_width, page_height)
    }

    /// [`resolve_size`](Self::resolve_size) with an explicit estimator.
    pub fn resolve_size_with(
        &self,
        estimate: SizeEstimate,
        page_width: f64,
        page_height: f64,
    ) -> Option<ResolvedSize> {
        match (self.src_width, self.src_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(ResolvedSize {
                width: w,
                height: h,
                estimated: false,
            }),
            _ => self.placement.map(|rect| {
                let (width, height) = match estimate {
                    SizeEstimate::PageScale => estimate_pixel_size(&rect, page_width, page_height),
                    SizeEstimate::ScreenDpi => estimate_screen_size(&rect),
                };
                ResolvedSize {
                    width,
                    height,
                    estimated: true,
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(src: Option<(u32, u32)>, placement: Option<BBox>) -> PageImage {
        PageImage {
            index: 0,
            name: "Im0".to_string(),
            xref: (7, 0),
            src_width: src.map(|s| s.0),
            src_height: src.map(|s| s.1),
            bits_per_component: Some(8),
            color_space: Some("DeviceRGB".to_string()),
            filter: Some(ImageFilter::DCTDecode),
            placement,
        }
    }

    #[test]
    fn test_filter_from_pdf_name() {
        assert_eq!(ImageFilter::from_pdf_name("DCTDecode"), ImageFilter::DCTDecode);
        assert_eq!(ImageFilter::from_pdf_name("Fl"), ImageFilter::FlateDecode);
        assert_eq!(ImageFilter::from_pdf_name("Bogus"), ImageFilter::Raw);
    }

    #[test]
    fn test_filter_yields_samples() {
        assert!(ImageFilter::FlateDecode.yields_samples());
        assert!(ImageFilter::Raw.yields_samples());
        assert!(!ImageFilter::DCTDecode.yields_samples());
        assert!(!ImageFilter::JBIG2Decode.yields_samples());
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpx.extension(), "jpx");
        assert_eq!(ImageFormat::Jbig2.extension(), "jb2");
    }

    #[test]
    fn test_resolve_size_prefers_metadata() {
        let img = image(Some((2080, 1234)), Some(BBox::new(0.0, 0.0, 10.0, 10.0)));
        let size = img.resolve_size(960.0, 540.0).unwrap();
        assert_eq!((size.width, size.height), (2080, 1234));
        assert!(!size.estimated);
        assert_eq!(size.area(), 2080 * 1234);
    }

    #[test]
    fn test_resolve_size_estimates_when_metadata_zero() {
        // Half the page in each direction: 480/960*960*1.5 = 720, 270/540*540*1.5 = 405
        let img = image(Some((0, 0)), Some(BBox::new(0.0, 0.0, 480.0, 270.0)));
        let size = img.resolve_size(960.0, 540.0).unwrap();
        assert_eq!((size.width, size.height), (720, 405));
        assert!(size.estimated);
    }

    #[test]
    fn test_resolve_size_with_screen_dpi() {
        let img = image(None, Some(BBox::new(0.0, 0.0, 480.0, 270.0)));
        let size = img
            .resolve_size_with(SizeEstimate::ScreenDpi, 960.0, 540.0)
            .unwrap();
        assert_eq!((size.width, size.height), (640, 360));
        assert!(size.estimated);
    }

    #[test]
    fn test_resolve_size_none_without_metadata_or_placement() {
        let img = image(None, None);
        assert!(img.resolve_size(960.0, 540.0).is_none());
    }

    #[test]
    fn test_y_pos_defaults_to_zero() {
        assert_eq!(image(None, None).y_pos(), 0.0);
        let placed = image(None, Some(BBox::new(0.0, 42.0, 1.0, 50.0)));
        assert_eq!(placed.y_pos(), 42.0);
    }
}
