use imgharvest::{Document, HarvestConfig, MockupThresholds, Page, PageImage, SiteLayout};

use crate::cli::OutputFormat;
use crate::shared::{ProgressReporter, open_document};

pub fn run(config: &HarvestConfig, layout: &SiteLayout, format: &OutputFormat) -> Result<(), i32> {
    let doc = open_document(layout)?;
    let reporter = ProgressReporter::new(doc.page_count());
    let thresholds = &config.extract.mockup;

    match format {
        OutputFormat::Text => write_text(&doc, thresholds, &reporter),
        OutputFormat::Json => write_json(&doc, thresholds, &reporter),
    }
}

fn load_page(doc: &Document, idx: usize) -> Result<Page, i32> {
    doc.page(idx).map_err(|e| {
        eprintln!("Error reading page {}: {e}", idx + 1);
        1
    })
}

fn is_mockup(image: &PageImage, page: &Page, thresholds: &MockupThresholds) -> Option<bool> {
    let size = image.resolve_size(page.width, page.height)?;
    Some(thresholds.accepts(
        f64::from(size.width),
        f64::from(size.height),
        size.area() as f64,
        image.y_pos(),
        page.height,
        page.width,
    ))
}

fn write_text(
    doc: &Document,
    thresholds: &MockupThresholds,
    reporter: &ProgressReporter,
) -> Result<(), i32> {
    for idx in 0..doc.page_count() {
        reporter.report(idx + 1);
        let page = load_page(doc, idx)?;

        println!("--- Page {} ({:.0}x{:.0}) ---", page.number(), page.width, page.height);
        for image in &page.images {
            let size = image.resolve_size(page.width, page.height);
            let kind = match is_mockup(image, &page, thresholds) {
                Some(true) => "mockup",
                Some(false) => "planning",
                None => "-",
            };
            let placement = image.placement.map_or("-".to_string(), |p| {
                format!("x0={:.1}\ttop={:.1}\tx1={:.1}\tbottom={:.1}", p.x0, p.top, p.x1, p.bottom)
            });
            println!(
                "  img{}\t{}\t{}{}\t{}\t{}\t{}",
                image.index + 1,
                image.name,
                size.map_or("-".to_string(), |s| format!("{}x{}", s.width, s.height)),
                if size.is_some_and(|s| s.estimated) { "~" } else { "" },
                image.color_space.as_deref().unwrap_or("-"),
                placement,
                kind,
            );
        }
    }
    reporter.finish();
    Ok(())
}

fn write_json(
    doc: &Document,
    thresholds: &MockupThresholds,
    reporter: &ProgressReporter,
) -> Result<(), i32> {
    let mut pages_json = Vec::new();

    for idx in 0..doc.page_count() {
        reporter.report(idx + 1);
        let page = load_page(doc, idx)?;

        let images_json: Vec<serde_json::Value> = page
            .images
            .iter()
            .map(|image| {
                let size = image.resolve_size(page.width, page.height);
                serde_json::json!({
                    "image": image.index + 1,
                    "name": image.name,
                    "width": size.map(|s| s.width),
                    "height": size.map(|s| s.height),
                    "estimated": size.map(|s| s.estimated),
                    "src_width": image.src_width,
                    "src_height": image.src_height,
                    "bits_per_component": image.bits_per_component,
                    "color_space": image.color_space,
                    "filter": image.filter.map(|f| format!("{f:?}")),
                    "placement": image.placement.map(|p| serde_json::json!({
                        "x0": p.x0,
                        "top": p.top,
                        "x1": p.x1,
                        "bottom": p.bottom,
                    })),
                    "mockup": is_mockup(image, &page, thresholds),
                })
            })
            .collect();

        pages_json.push(serde_json::json!({
            "page": page.number(),
            "width": page.width,
            "height": page.height,
            "images": images_json,
        }));
    }
    reporter.finish();

    let output = serde_json::to_string_pretty(&pages_json).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;
    println!("{output}");
    Ok(())
}
