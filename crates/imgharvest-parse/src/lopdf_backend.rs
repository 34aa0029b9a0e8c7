//! lopdf-based PDF parsing backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate. Image listing reads page resources directly; placements come from
//! [`PlacementWalker`]; payloads are passed through for JPEG, JPEG 2000 and
//! JBIG2 streams and re-encoded as PNG for raw samples.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::LazyLock;

use image::{DynamicImage, GrayImage, RgbImage};
use imgharvest_core::{BBox, Ctm, ImageContent, ImageFilter, ImageFormat, PageImage};

use crate::backend::PdfBackend;
use crate::error::BackendError;
use crate::placement::{MAX_FORM_DEPTH, PlacementWalker};

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page object ids in page order.
    page_ids: Vec<lopdf::ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A reference to a single page within a [`LopdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct LopdfPage {
    pub object_id: lopdf::ObjectId,
    /// 0-based page index.
    pub index: usize,
}

/// The lopdf-based PDF backend.
pub struct LopdfBackend;

fn extract_bbox_from_array(array: &[lopdf::Object]) -> Result<BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let x0 = object_to_f64(&array[0])?;
    let y0 = object_to_f64(&array[1])?;
    let x1 = object_to_f64(&array[2])?;
    let y1 = object_to_f64(&array[3])?;
    Ok(BBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Result<f64, BackendError> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Resolve an indirect reference, returning the referenced object.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Decode a stream, decompressing if it carries a filter.
pub(crate) fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, BackendError> {
    let mut current_id = page_id;
    let mut visited = HashSet::new();
    loop {
        if !visited.insert(current_id) {
            return Err(BackendError::Parse("cycle in page tree /Parent chain".into()));
        }
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve_ref(doc, value)));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
}

/// Get the resources dictionary for a page, handling inheritance.
fn get_page_resources(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<&lopdf::Dictionary, BackendError> {
    static EMPTY_DICT: LazyLock<lopdf::Dictionary> = LazyLock::new(lopdf::Dictionary::new);

    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_DICT),
    }
}

/// Concatenated, decoded bytes of a page's content stream(s).
fn get_page_content_bytes(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<u8>, BackendError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => resolve_ref(doc, obj),
        Err(_) => return Ok(Vec::new()),
    };

    match contents_obj {
        lopdf::Object::Stream(stream) => decode_stream(stream),
        lopdf::Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve_ref(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

fn dict_u32(dict: &lopdf::Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn name_string(obj: &lopdf::Object) -> Option<String> {
    obj.as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Filter names of a stream, in application order.
fn filter_chain(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Vec<String> {
    match dict.get(b"Filter").map(|o| resolve_ref(doc, o)) {
        Ok(lopdf::Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(lopdf::Object::Array(arr)) => arr
            .iter()
            .filter_map(|item| name_string(resolve_ref(doc, item)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Color space label for listings: the name, or the family of an array.
fn color_space_label(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<String> {
    let obj = resolve_ref(doc, dict.get(b"ColorSpace").ok()?);
    match obj {
        lopdf::Object::Name(_) => name_string(obj),
        lopdf::Object::Array(arr) => arr.first().and_then(name_string),
        _ => None,
    }
}

fn image_metadata(
    doc: &lopdf::Document,
    id: lopdf::ObjectId,
    name: String,
    stream: &lopdf::Stream,
    index: usize,
) -> PageImage {
    let dict = &stream.dict;
    PageImage {
        index,
        name,
        xref: (id.0, id.1),
        src_width: dict_u32(dict, b"Width"),
        src_height: dict_u32(dict, b"Height"),
        bits_per_component: dict_u32(dict, b"BitsPerComponent"),
        color_space: color_space_label(doc, dict),
        filter: filter_chain(doc, dict)
            .last()
            .map(|f| ImageFilter::from_pdf_name(f)),
        placement: None,
    }
}

/// Append every image XObject in `resources` to `out`, descending into
/// Form XObjects. Each object is listed once.
fn collect_images(
    doc: &lopdf::Document,
    resources: &lopdf::Dictionary,
    seen: &mut HashSet<lopdf::ObjectId>,
    out: &mut Vec<PageImage>,
    depth: usize,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return;
    };

    for (key, value) in xobjects.iter() {
        let Ok(id) = value.as_reference() else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        let Ok(stream) = doc.get_object(id).and_then(|o| o.as_stream()) else {
            continue;
        };
        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        match subtype {
            b"Image" => {
                let name = String::from_utf8_lossy(key).into_owned();
                out.push(image_metadata(doc, id, name, stream, out.len()));
            }
            b"Form" if depth < MAX_FORM_DEPTH => {
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .map(|o| resolve_ref(doc, o))
                    .and_then(|o| o.as_dict().ok())
                {
                    collect_images(doc, form_resources, seen, out, depth + 1);
                }
            }
            _ => {}
        }
    }
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = LopdfPage;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "encrypted PDFs are not supported".to_string(),
            ));
        }

        let page_ids: Vec<lopdf::ObjectId> = inner.get_pages().values().copied().collect();
        tracing::debug!(pages = page_ids.len(), "opened PDF");

        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
        let object_id = doc.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                doc.page_ids.len()
            ))
        })?;
        Ok(LopdfPage { object_id, index })
    }

    fn page_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error> {
        if let Some(crop) = resolve_inherited(&doc.inner, page.object_id, b"CropBox")? {
            if let Ok(array) = crop.as_array() {
                if let Ok(bbox) = extract_bbox_from_array(array) {
                    return Ok(bbox);
                }
            }
            tracing::debug!(page = page.index, "ignoring malformed CropBox");
        }
        let media = resolve_inherited(&doc.inner, page.object_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
        let array = media
            .as_array()
            .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
        extract_bbox_from_array(array)
    }

    fn page_images(doc: &Self::Document, page: &Self::Page) -> Result<Vec<PageImage>, Self::Error> {
        let inner = &doc.inner;
        let resources = get_page_resources(inner, page.object_id)?;

        let mut images = Vec::new();
        let mut seen = HashSet::new();
        collect_images(inner, resources, &mut seen, &mut images, 0);
        if images.is_empty() {
            return Ok(images);
        }

        let page_box = Self::page_box(doc, page)?;
        let mut walker = PlacementWalker::new(inner, page_box.height());
        // Page box origin becomes (0, 0)
        let origin = Ctm::new(1.0, 0.0, 0.0, 1.0, -page_box.x0, -page_box.top);
        let walked = get_page_content_bytes(inner, page.object_id)
            .and_then(|content| walker.walk(&content, resources, origin, 0));
        if let Err(e) = walked {
            tracing::warn!(page = page.index + 1, error = %e, "content stream only partly interpreted");
        }

        let placements = walker.into_placements();
        for image in &mut images {
            image.placement = placements.get(&(image.xref.0, image.xref.1)).copied();
        }
        Ok(images)
    }

    fn extract_image_content(
        doc: &Self::Document,
        image: &PageImage,
    ) -> Result<ImageContent, Self::Error> {
        let inner = &doc.inner;
        let name = &image.name;
        let stream = inner
            .get_object((image.xref.0, image.xref.1))
            .and_then(|o| o.as_stream())
            .map_err(|e| BackendError::Parse(format!("failed to resolve image /{name}: {e}")))?;

        let dict = &stream.dict;
        let width = dict_u32(dict, b"Width").unwrap_or(0);
        let height = dict_u32(dict, b"Height").unwrap_or(0);
        let filters = filter_chain(inner, dict);
        let last = filters.last().map(|f| ImageFilter::from_pdf_name(f));

        let decompress = || {
            stream
                .decompressed_content()
                .map_err(|e| BackendError::Parse(format!("failed to decompress image /{name}: {e}")))
        };

        let (data, format) = match last {
            Some(ImageFilter::DCTDecode) => {
                let data = if filters.len() == 1 {
                    stream.content.clone()
                } else {
                    decompress()?
                };
                (data, ImageFormat::Jpeg)
            }
            Some(ImageFilter::JPXDecode) => (stream.content.clone(), ImageFormat::Jpx),
            Some(ImageFilter::JBIG2Decode) => (stream.content.clone(), ImageFormat::Jbig2),
            Some(ImageFilter::CCITTFaxDecode) => {
                return Err(BackendError::Unsupported(format!(
                    "CCITTFaxDecode image /{name}"
                )));
            }
            _ => {
                let samples = if filters.is_empty() {
                    stream.content.clone()
                } else {
                    decompress()?
                };
                let png = encode_png(inner, dict, &samples, width, height)
                    .map_err(|e| match e {
                        BackendError::Unsupported(msg) => {
                            BackendError::Unsupported(format!("image /{name}: {msg}"))
                        }
                        other => other,
                    })?;
                (png, ImageFormat::Png)
            }
        };

        Ok(ImageContent {
            data,
            format,
            width,
            height,
        })
    }
}

/// Sample layout of a raw image.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorModel>,
        lookup: Vec<u8>,
    },
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

fn color_model(doc: &lopdf::Document, obj: &lopdf::Object, depth: usize) -> Option<ColorModel> {
    if depth > 4 {
        return None;
    }
    match resolve_ref(doc, obj) {
        lopdf::Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"G" | b"CalGray" => Some(ColorModel::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorModel::Cmyk),
            _ => None,
        },
        lopdf::Object::Array(arr) => {
            let family = arr.first()?.as_name().ok()?;
            match family {
                b"CalGray" => Some(ColorModel::Gray),
                b"CalRGB" => Some(ColorModel::Rgb),
                b"ICCBased" => {
                    let profile = resolve_ref(doc, arr.get(1)?).as_stream().ok()?;
                    match dict_u32(&profile.dict, b"N")? {
                        1 => Some(ColorModel::Gray),
                        3 => Some(ColorModel::Rgb),
                        4 => Some(ColorModel::Cmyk),
                        _ => None,
                    }
                }
                b"Indexed" | b"I" => {
                    let base = color_model(doc, arr.get(1)?, depth + 1)?;
                    let lookup = match resolve_ref(doc, arr.get(3)?) {
                        lopdf::Object::String(bytes, _) => bytes.clone(),
                        lopdf::Object::Stream(s) => decode_stream(s).ok()?,
                        _ => return None,
                    };
                    Some(ColorModel::Indexed {
                        base: Box::new(base),
                        lookup,
                    })
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Split packed rows into one byte per sample. Rows are padded to a byte
/// boundary. Gray-scale values are stretched to 0..=255; `raw_values`
/// keeps indices unscaled for indexed images.
fn unpack_samples(
    data: &[u8],
    samples_per_row: usize,
    rows: usize,
    bpc: u32,
    raw_values: bool,
) -> Result<Vec<u8>, BackendError> {
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(BackendError::Unsupported(format!("{bpc} bits per component")));
    }
    let row_bytes = (samples_per_row * bpc as usize).div_ceil(8);
    if row_bytes == 0 {
        return Err(BackendError::Unsupported("empty image rows".to_string()));
    }
    if data.len() < row_bytes * rows {
        return Err(BackendError::Parse(format!(
            "image data too short: {} bytes, expected {}",
            data.len(),
            row_bytes * rows
        )));
    }

    let mut out = Vec::with_capacity(samples_per_row * rows);
    for row in data.chunks_exact(row_bytes).take(rows) {
        match bpc {
            8 => out.extend_from_slice(&row[..samples_per_row]),
            16 => out.extend(row.chunks_exact(2).take(samples_per_row).map(|pair| pair[0])),
            1 | 2 | 4 => {
                let max = (1u32 << bpc) - 1;
                for i in 0..samples_per_row {
                    let bit = i * bpc as usize;
                    let byte = row[bit / 8];
                    let shift = 8 - bpc as usize - (bit % 8);
                    let value = (u32::from(byte) >> shift) & max;
                    out.push(if raw_values {
                        value as u8
                    } else {
                        (value * 255 / max) as u8
                    });
                }
            }
            other => {
                return Err(BackendError::Unsupported(format!(
                    "{other} bits per component"
                )));
            }
        }
    }
    Ok(out)
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let white = 255 - u32::from(k);
    let channel = |v: u8| ((255 - u32::from(v)) * white / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

/// Convert samples of `model` into 8-bit gray or RGB pixels.
fn to_pixels(model: &ColorModel, samples: &[u8]) -> (Vec<u8>, bool) {
    match model {
        ColorModel::Gray => (samples.to_vec(), false),
        ColorModel::Rgb => (samples.to_vec(), true),
        ColorModel::Cmyk => (
            samples
                .chunks_exact(4)
                .flat_map(|px| cmyk_to_rgb(px[0], px[1], px[2], px[3]))
                .collect(),
            true,
        ),
        ColorModel::Indexed { base, lookup } => {
            let n = base.components();
            let mut expanded = Vec::with_capacity(samples.len() * n);
            for &index in samples {
                let start = usize::from(index) * n;
                match lookup.get(start..start + n) {
                    Some(entry) => expanded.extend_from_slice(entry),
                    None => expanded.extend(std::iter::repeat_n(0, n)),
                }
            }
            to_pixels(base, &expanded)
        }
    }
}

/// Encode raw image samples as a PNG file.
fn encode_png(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    samples: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::Unsupported(
            "missing /Width or /Height".to_string(),
        ));
    }

    let is_mask = dict
        .get(b"ImageMask")
        .ok()
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);
    let (model, bpc) = if is_mask {
        (ColorModel::Gray, 1)
    } else {
        let model = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| color_model(doc, cs, 0))
            .ok_or_else(|| {
                let label = color_space_label(doc, dict).unwrap_or_else(|| "none".to_string());
                BackendError::Unsupported(format!("color space {label}"))
            })?;
        (model, dict_u32(dict, b"BitsPerComponent").unwrap_or(8))
    };

    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(BackendError::Unsupported(format!("{bpc} bits per component")));
    }

    let raw_values = matches!(model, ColorModel::Indexed { .. });
    let samples_per_row = width as usize * model.components();
    let unpacked = unpack_samples(samples, samples_per_row, height as usize, bpc, raw_values)?;
    let (pixels, rgb) = to_pixels(&model, &unpacked);

    let image = if rgb {
        RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    } else {
        GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
    }
    .ok_or_else(|| BackendError::Parse("image buffer size mismatch".to_string()))?;

    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| BackendError::Parse(format!("failed to encode PNG: {e}")))?;
    Ok(buffer)
}
