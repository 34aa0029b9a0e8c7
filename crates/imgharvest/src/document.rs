//! Source document access.

use std::path::Path;

use imgharvest_core::{HarvestError, ImageContent, PageImage};
use imgharvest_parse::{LopdfBackend, LopdfDocument, PdfBackend};

/// One page with its size and image list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 0-based page index.
    pub index: usize,
    /// Width of the visible page rectangle.
    pub width: f64,
    /// Height of the visible page rectangle.
    pub height: f64,
    /// Images in page resource order.
    pub images: Vec<PageImage>,
}

impl Page {
    /// 1-based page number, as used in staged file names.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Iterator over the pages of a [`Document`], loading each page on demand.
pub struct PagesIter<'a> {
    doc: &'a Document,
    current: usize,
    count: usize,
}

impl Iterator for PagesIter<'_> {
    type Item = Result<Page, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let result = self.doc.page(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PagesIter<'_> {}

/// A PDF design document opened for image harvesting.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open_file("design.pdf")?;
/// for page in doc.pages() {
///     let page = page?;
///     println!("page {} has {} images", page.number(), page.images.len());
/// }
/// ```
pub struct Document {
    doc: LopdfDocument,
}

impl Document {
    /// Open a document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::DocumentNotFound`] when the path does not
    /// exist, [`HarvestError::Io`] when it cannot be read and
    /// [`HarvestError::Pdf`] when it is not a readable PDF.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarvestError::DocumentNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| HarvestError::io(path, e))?;
        Self::open(&bytes)
    }

    /// Open a document from bytes.
    pub fn open(bytes: &[u8]) -> Result<Self, HarvestError> {
        let doc = LopdfBackend::open(bytes)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    /// Load the page at 0-based `index`.
    pub fn page(&self, index: usize) -> Result<Page, HarvestError> {
        let page = LopdfBackend::get_page(&self.doc, index)?;
        let page_box = LopdfBackend::page_box(&self.doc, &page)?;
        let images = LopdfBackend::page_images(&self.doc, &page)?;
        Ok(Page {
            index,
            width: page_box.width(),
            height: page_box.height(),
            images,
        })
    }

    /// Iterate over all pages in order.
    pub fn pages(&self) -> PagesIter<'_> {
        PagesIter {
            doc: self,
            current: 0,
            count: self.page_count(),
        }
    }

    /// Fetch an image's payload as a writable file.
    pub fn image_content(&self, image: &PageImage) -> Result<ImageContent, HarvestError> {
        Ok(LopdfBackend::extract_image_content(&self.doc, image)?)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("page_count", &self.page_count())
            .finish_non_exhaustive()
    }
}
