//! PDF fixtures built in code with lopdf.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

pub const FAKE_JPEG: &[u8] = b"\xff\xd8\xff\xe0fixture-jpeg\xff\xd9";
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Payload of a fixture image.
#[derive(Debug, Clone, Copy)]
pub enum Payload {
    /// DCT-encoded bytes passed through as-is.
    Jpeg,
    /// Unfiltered 8-bit RGB samples, encoded to PNG on extraction.
    Rgb,
    /// Unfiltered samples declaring `/BitsPerComponent 0`; cannot be decoded.
    ZeroDepth,
}

/// One image XObject and where it is painted.
#[derive(Debug, Clone, Copy)]
pub struct FixtureImage {
    pub width: u32,
    pub height: u32,
    pub payload: Payload,
    /// `[x, y, w, h]` in PDF user space (origin bottom-left).
    pub rect: Option<[f64; 4]>,
}

impl FixtureImage {
    pub fn jpeg(width: u32, height: u32, rect: [f64; 4]) -> Self {
        Self {
            width,
            height,
            payload: Payload::Jpeg,
            rect: Some(rect),
        }
    }

    pub fn rgb(width: u32, height: u32, rect: [f64; 4]) -> Self {
        Self {
            width,
            height,
            payload: Payload::Rgb,
            rect: Some(rect),
        }
    }
}

impl FixtureImage {
    pub fn zero_depth(width: u32, height: u32, rect: [f64; 4]) -> Self {
        Self {
            width,
            height,
            payload: Payload::ZeroDepth,
            rect: Some(rect),
        }
    }
}

/// Build a PDF with one 960x540 page per entry of `pages`.
pub fn build_pdf(pages: &[Vec<FixtureImage>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for images in pages {
        let mut xobjects = Dictionary::new();
        let mut content = String::new();
        for (i, image) in images.iter().enumerate() {
            let name = format!("Im{i}");
            let id = doc.add_object(image_stream(image));
            xobjects.set(name.as_bytes(), id);
            if let Some([x, y, w, h]) = image.rect {
                content.push_str(&format!("q {w} 0 0 {h} {x} {y} cm /{name} Do Q\n"));
            }
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 960.into(), 540.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}

fn image_stream(image: &FixtureImage) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    let data = match image.payload {
        Payload::Jpeg => {
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            FAKE_JPEG.to_vec()
        }
        Payload::Rgb => vec![200; (image.width * image.height * 3) as usize],
        Payload::ZeroDepth => {
            dict.set("BitsPerComponent", 0);
            vec![0; 16]
        }
    };
    Stream::new(dict, data)
}

/// Two pages:
///
/// - page 1: a 1600x900 screenshot at the top, a 200x100 badge, and a second
///   1600x900 copy painted over the first
/// - page 2: a 2x2 raw RGB swatch and a 1280x720 diagram near the bottom
pub fn design_document() -> Vec<u8> {
    build_pdf(&[
        vec![
            FixtureImage::jpeg(1600, 900, [80.0, 40.0, 800.0, 450.0]),
            FixtureImage::jpeg(200, 100, [20.0, 20.0, 60.0, 30.0]),
            FixtureImage::jpeg(1600, 900, [80.0, 40.0, 800.0, 450.0]),
        ],
        vec![
            FixtureImage::rgb(2, 2, [10.0, 500.0, 20.0, 20.0]),
            FixtureImage::jpeg(1280, 720, [100.0, 20.0, 700.0, 100.0]),
        ],
    ])
}
