//! Site fixtures for CLI tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

pub const FAKE_JPEG: &[u8] = b"\xff\xd8\xff\xe0cli-fixture\xff\xd9";

/// `(width, height, [x, y, w, h])` of a painted JPEG.
pub type Painted = (i64, i64, [i64; 4]);

/// A 960x540 PDF; each page paints its JPEG images in order.
pub fn build_pdf(pages: &[&[Painted]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for images in pages {
        let mut xobjects = Dictionary::new();
        let mut content = String::new();
        for (i, (width, height, [x, y, w, h])) in images.iter().enumerate() {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width,
                    "Height" => *height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                FAKE_JPEG.to_vec(),
            ));
            xobjects.set(format!("Im{i}").into_bytes(), image_id);
            content.push_str(&format!("q {w} 0 0 {h} {x} {y} cm /Im{i} Do Q\n"));
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

/// Write a site under `root`: `design.pdf`, an index page and a
/// `harvest.toml` mapping page 1's two images to hero and news.
pub fn write_site(root: &Path) {
    let pdf = build_pdf(&[
        &[
            (1600, 900, [80, 40, 800, 450]),
            (1280, 720, [100, 20, 700, 100]),
        ],
        &[(200, 100, [20, 20, 60, 30])],
    ]);
    fs::write(root.join("design.pdf"), pdf).unwrap();

    fs::create_dir_all(root.join("src/html")).unwrap();
    fs::write(
        root.join("src/html/index.html"),
        r#"<img src="/assets/images/hero/main-hero.jpeg">"#,
    )
    .unwrap();

    fs::write(
        root.join("harvest.toml"),
        r#"
[paths]
document = "design.pdf"

[extract]
strategy = "min-size"

[[mapping.rules]]
page = 1
image = 1
category = "hero"
target = "main-hero.jpeg"

[[mapping.rules]]
page = 1
image = 2
category = "news"
target = "news-001.png"

[[mapping.rules]]
page = 4
image = 1
category = "features"
target = "level-design.jpeg"
"#,
    )
    .unwrap();
}
