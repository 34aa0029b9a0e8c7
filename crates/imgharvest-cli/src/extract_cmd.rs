use imgharvest::{
    ExtractReport, ExtractStrategy, HarvestConfig, SiteLayout, SizeClass, Verdict, WrittenImage,
    extract_with_progress, summarize_staging,
};

use crate::cli::StrategyArg;
use crate::shared::{ProgressReporter, open_document, rule_line, thousands};

pub fn run(
    config: &HarvestConfig,
    layout: &SiteLayout,
    strategy: Option<StrategyArg>,
) -> Result<(), i32> {
    let doc = open_document(layout)?;
    let mut extract = config.extract.clone();
    if let Some(strategy) = strategy {
        extract.strategy = strategy.into();
    }

    println!("Opening PDF: {}", layout.document().display());
    println!("Total pages: {}", doc.page_count());
    println!("Strategy: {}", extract.strategy.as_str());
    println!("{}", rule_line());

    let reporter = ProgressReporter::new(doc.page_count());
    let report = extract_with_progress(&doc, &extract, layout.staging_dir(), |current, _| {
        reporter.report(current)
    })
    .map_err(|e| {
        reporter.finish();
        eprintln!("Error: {e}");
        1
    })?;
    reporter.finish();

    let save_location = layout.display_path(layout.staging_dir());
    match report.strategy {
        ExtractStrategy::Mockup => print_mockups(&report, &save_location),
        ExtractStrategy::Priority => {
            print_priority(&report, &save_location);
            print_size_summary(layout);
        }
        ExtractStrategy::All | ExtractStrategy::MinSize => {
            print_flat(&report, &save_location);
            print_size_summary(layout);
        }
    }
    Ok(())
}

fn written_for(report: &ExtractReport, page: usize, image: usize) -> Option<&WrittenImage> {
    report
        .written
        .iter()
        .find(|w| w.page == page && w.image == image)
}

fn print_failures(report: &ExtractReport, page: usize) {
    for failure in report.failures.iter().filter(|f| f.page == page) {
        match failure.image {
            Some(image) => println!("  [WARN] img {image}: {}", failure.message),
            None => println!("  [WARN] page could not be read: {}", failure.message),
        }
    }
}

fn print_mockups(report: &ExtractReport, save_location: &str) {
    println!("Analyzing images to distinguish mockups from planning graphics...");
    println!("{}", rule_line());
    for page in 1..=report.page_count {
        println!("\nPage {page}:");
        for record in report.records.iter().filter(|r| r.page == page) {
            let label = match record.verdict {
                Verdict::Mockup => "MOCKUP",
                Verdict::Planning => "PLANNING",
                _ => {
                    println!("  [SKIP] img{}: size unknown", record.image);
                    continue;
                }
            };
            if let Some(size) = record.size {
                println!(
                    "  [{label}] img{}: {}x{} (area: {}, ratio: {:.2}, y: {:.0})",
                    record.image,
                    size.width,
                    size.height,
                    thousands(size.area()),
                    size.aspect_ratio(),
                    record.y_pos,
                );
            }
        }
        print_failures(report, page);
    }

    println!("\n{}", rule_line());
    println!("Extracting mockup images only...");
    println!("{}", rule_line());
    for page in 1..=report.page_count {
        let written: Vec<&WrittenImage> = report.written.iter().filter(|w| w.page == page).collect();
        if written.is_empty() {
            continue;
        }
        println!("\nPage {page} - {} mockup(s):", written.len());
        for image in written {
            println!("  [OK] {}", image.file_name);
            if let Some(size) = image.size {
                println!(
                    "    Size: {}x{}px | Area: {} | Ratio: {:.2}",
                    size.width,
                    size.height,
                    thousands(size.area()),
                    size.aspect_ratio(),
                );
            }
        }
    }

    println!("\n{}", rule_line());
    println!("[DONE] Extraction complete!");
    println!("[INFO] Total images analyzed: {}", report.mockups() + report.planning());
    println!("[INFO] Mockups identified: {}", report.mockups());
    println!("[INFO] Planning graphics: {}", report.planning());
    println!("[INFO] Mockups extracted: {}", report.extracted());
    println!("[INFO] Images skipped: {}", report.skipped());
    println!("[INFO] Save location: {save_location}");
}

fn print_priority(report: &ExtractReport, save_location: &str) {
    for page in 1..=report.page_count {
        let records: Vec<_> = report.records.iter().filter(|r| r.page == page).collect();
        let Some(first) = records.first() else {
            print_failures(report, page);
            continue;
        };
        println!("\nPage {page} (priority: {}):", first.priority);
        for record in records {
            match &record.verdict {
                Verdict::Duplicate { of } => {
                    println!("  [SKIP] img{}: Duplicate or similar to {of}", record.image);
                }
                Verdict::Kept => {
                    let Some(image) = written_for(report, page, record.image) else {
                        continue;
                    };
                    println!("  [OK] {}", image.file_name);
                    if let Some(size) = image.size {
                        println!(
                            "    Size: {}x{}px (area: {}) | Ratio: {:.2} | Y: {:.0}",
                            size.width,
                            size.height,
                            thousands(size.area()),
                            size.aspect_ratio(),
                            image.y_pos,
                        );
                    }
                }
                _ => {}
            }
        }
        print_failures(report, page);
    }

    println!("\n{}", rule_line());
    println!("[DONE] Extraction complete!");
    println!("[INFO] Total {} images extracted.", report.extracted());
    println!(
        "[INFO] {} images filtered out (too small or duplicate).",
        report.skipped()
    );
    println!("[INFO] Save location: {save_location}");
}

fn print_flat(report: &ExtractReport, save_location: &str) {
    for page in 1..=report.page_count {
        let records: Vec<_> = report.records.iter().filter(|r| r.page == page).collect();
        if records.is_empty() && !report.failures.iter().any(|f| f.page == page) {
            continue;
        }
        println!("\nPage {page}: {} image(s)", records.len());
        for record in records {
            match (&record.verdict, record.size) {
                (Verdict::TooSmall, Some(size)) => {
                    println!("  [SKIP] img{}: {}x{} too small", record.image, size.width, size.height);
                }
                (Verdict::Kept, _) => {
                    if let Some(image) = written_for(report, page, record.image) {
                        println!("  [OK] {}", image.file_name);
                    }
                }
                _ => {}
            }
        }
        print_failures(report, page);
    }

    println!("\n{}", rule_line());
    println!("[DONE] Extraction complete!");
    println!("[INFO] Total {} images extracted.", report.extracted());
    println!("[INFO] {} images skipped.", report.skipped());
    println!("[INFO] Save location: {save_location}");
}

fn print_size_summary(layout: &SiteLayout) {
    let summary = match summarize_staging(layout.staging_dir()) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(error = %e, "cannot summarize staging folder");
            return;
        }
    };
    if summary.classes.is_empty() {
        return;
    }

    println!("\n[SUMMARY] Images by size category:");
    for class in [SizeClass::Large, SizeClass::Medium, SizeClass::Small] {
        let files = summary.files(class);
        if files.is_empty() {
            continue;
        }
        println!("  {}: {} files", class.label(), files.len());
        if class == SizeClass::Small {
            continue;
        }
        for name in files.iter().take(5) {
            println!("     - {name}");
        }
        if files.len() > 5 {
            println!("     ... and {} more", files.len() - 5);
        }
    }
}
