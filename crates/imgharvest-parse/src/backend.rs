//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the few document
//! operations image harvesting needs, so the pipelines do not depend on
//! lopdf types directly.

use imgharvest_core::{BBox, HarvestError, ImageContent, PageImage};

/// Trait abstracting PDF parsing operations.
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let page_box = MyBackend::page_box(&doc, &page)?;
/// for image in MyBackend::page_images(&doc, &page)? {
///     let content = MyBackend::extract_image_content(&doc, &image)?;
/// }
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`HarvestError`].
    type Error: std::error::Error + Into<HarvestError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a readable PDF document.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// Visible page rectangle: the CropBox when present, else the MediaBox.
    ///
    /// The box is returned in PDF coordinates with `top` holding the lower y
    /// and `bottom` the upper y, normalized so width and height are positive.
    ///
    /// # Errors
    ///
    /// Returns an error if neither box can be resolved.
    fn page_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error>;

    /// Image XObjects the page references, in resource order, including
    /// images nested in Form XObjects. Each image carries the first
    /// rectangle it is painted into.
    ///
    /// # Errors
    ///
    /// Returns an error if the page resources cannot be read.
    fn page_images(doc: &Self::Document, page: &Self::Page) -> Result<Vec<PageImage>, Self::Error>;

    /// Fetch and encode the payload of one image.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be decoded or uses an encoding
    /// that cannot be written as a standalone file.
    fn extract_image_content(
        doc: &Self::Document,
        image: &PageImage,
    ) -> Result<ImageContent, Self::Error>;
}
