//! End-to-end tests of the extraction and reconciliation pipelines on
//! generated documents.

mod common;

use std::fs;
use std::path::Path;

use common::{FAKE_JPEG, FixtureImage, PNG_SIGNATURE, build_pdf, design_document};
use imgharvest::{
    Document, ExtractStrategy, HarvestConfig, HarvestError, MapOutcome, MappingRule, SiteLayout,
    Verdict, automap, execute_cleanup, extract, map_staged, plan_cleanup,
};

fn site(root: &Path, strategy: ExtractStrategy) -> (HarvestConfig, SiteLayout) {
    let mut config = HarvestConfig::default();
    config.base_dir = root.to_path_buf();
    config.extract.strategy = strategy;
    config.mapping.rules = vec![
        MappingRule::image(1, 1, "hero", "main-hero.jpeg"),
        MappingRule::image(1, 3, "features", "level-design.png"),
        MappingRule::image(9, 1, "news", "news-001.jpeg"),
    ];
    let layout = SiteLayout::new(&config);
    (config, layout)
}

fn staged(layout: &SiteLayout) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(layout.staging_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn missing_document_is_reported_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let (_, layout) = site(dir.path(), ExtractStrategy::Mockup);
    let err = Document::open_file(layout.document()).unwrap_err();
    assert!(matches!(err, HarvestError::DocumentNotFound(_)));
    assert!(err.is_fatal());
    assert!(!layout.staging_dir().exists());
}

#[test]
fn document_pages_and_placements() {
    let doc = Document::open(&design_document()).unwrap();
    assert_eq!(doc.page_count(), 2);
    let pages: Vec<_> = doc.pages().map(Result::unwrap).collect();
    assert_eq!(pages[0].images.len(), 3);
    assert_eq!(pages[1].images.len(), 2);
    assert_eq!(pages[0].width, 960.0);
    assert_eq!(pages[0].images[0].y_pos(), 50.0);
    assert_eq!(pages[1].images[1].y_pos(), 420.0);
}

#[test]
fn mockup_strategy_stages_only_mockups() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::Mockup);
    let doc = Document::open(&design_document()).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.analyzed(), 5);
    assert_eq!(report.mockups(), 2);
    assert_eq!(report.planning(), 3);
    assert_eq!(report.skipped(), 0);
    assert_eq!(
        staged(&layout),
        ["page1_img1_1600x900.jpeg", "page1_img3_1600x900.jpeg"]
    );
    let bytes = fs::read(layout.staging_dir().join("page1_img1_1600x900.jpeg")).unwrap();
    assert_eq!(bytes, FAKE_JPEG);
}

#[test]
fn all_strategy_names_files_without_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::All);
    let doc = Document::open(&design_document()).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.extracted(), 5);
    assert_eq!(
        staged(&layout),
        [
            "page1_img1.jpeg",
            "page1_img2.jpeg",
            "page1_img3.jpeg",
            "page2_img1.png",
            "page2_img2.jpeg",
        ]
    );
    let png = fs::read(layout.staging_dir().join("page2_img1.png")).unwrap();
    assert!(png.starts_with(PNG_SIGNATURE));
}

#[test]
fn min_size_strategy_filters_small_images() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::MinSize);
    let doc = Document::open(&design_document()).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.skipped(), 2);
    assert_eq!(
        staged(&layout),
        [
            "page1_img1_1600x900.jpeg",
            "page1_img3_1600x900.jpeg",
            "page2_img2_1280x720.jpeg",
        ]
    );
}

#[test]
fn min_size_estimates_unsized_images_at_screen_dpi() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::MinSize);
    // No /Width or /Height: 240x160 pt is 320x213 px, 210x140 pt is 280x186 px
    let bytes = build_pdf(&[vec![
        FixtureImage::jpeg(0, 0, [10.0, 300.0, 240.0, 160.0]),
        FixtureImage::jpeg(0, 0, [300.0, 300.0, 210.0, 140.0]),
    ]]);
    let doc = Document::open(&bytes).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.skipped(), 1);
    assert_eq!(staged(&layout), ["page1_img1_320x213.jpeg"]);
}

#[test]
fn priority_strategy_suppresses_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::Priority);
    let doc = Document::open(&design_document()).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(
        staged(&layout),
        ["page1_img1_1600x900.jpeg", "page2_img2_1280x720.jpeg"]
    );
    assert_eq!(report.skipped(), 3);
    let duplicate = report
        .records
        .iter()
        .find(|r| r.page == 1 && r.image == 3)
        .unwrap();
    assert_eq!(
        duplicate.verdict,
        Verdict::Duplicate {
            of: "page1_img1_1600x900.jpeg".to_string()
        }
    );
}

#[test]
fn undecodable_image_is_a_failed_item() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::All);
    let bytes = build_pdf(&[
        vec![
            FixtureImage::zero_depth(4, 4, [10.0, 10.0, 40.0, 40.0]),
            FixtureImage::jpeg(1600, 900, [80.0, 40.0, 800.0, 450.0]),
        ],
        vec![FixtureImage::jpeg(1280, 720, [100.0, 20.0, 700.0, 100.0])],
    ]);
    let doc = Document::open(&bytes).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.extracted(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, 1);
    assert_eq!(report.failures[0].image, Some(1));
    assert!(report.failures[0].message.contains("bits per component"));
    assert_eq!(report.skipped(), 1);
    assert_eq!(staged(&layout), ["page1_img2.jpeg", "page2_img1.jpeg"]);
}

#[test]
fn failed_image_does_not_claim_duplicate_key() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::Priority);
    let rect = [80.0, 40.0, 800.0, 450.0];
    let bytes = build_pdf(&[vec![
        FixtureImage::zero_depth(800, 450, rect),
        FixtureImage::jpeg(800, 450, rect),
    ]]);
    let doc = Document::open(&bytes).unwrap();

    let report = extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(staged(&layout), ["page1_img2_800x450.jpeg"]);
    assert!(
        report
            .records
            .iter()
            .all(|r| !matches!(r.verdict, Verdict::Duplicate { .. }))
    );
}

#[test]
fn rerunning_extraction_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::Mockup);
    let doc = Document::open(&design_document()).unwrap();

    extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    let first = staged(&layout);
    extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    assert_eq!(staged(&layout), first);
}

#[test]
fn map_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = site(dir.path(), ExtractStrategy::Mockup);
    let doc = Document::open(&design_document()).unwrap();
    extract(&doc, &config.extract, layout.staging_dir()).unwrap();

    let first = map_staged(&layout, &config.mapping).unwrap();
    assert_eq!(first.mapped(), 2);
    assert_eq!(first.failed(), 1);
    assert!(matches!(
        &first.outcomes[1].outcome,
        MapOutcome::Mapped { target, adjusted_from: Some(_), .. } if target == "level-design.jpeg"
    ));
    assert_eq!(first.outcomes[2].outcome, MapOutcome::NotFound);

    let hero = layout.category_dir("hero").join("main-hero.jpeg");
    let features = layout.category_dir("features").join("level-design.jpeg");
    let before = (fs::read(&hero).unwrap(), fs::read(&features).unwrap());

    let second = map_staged(&layout, &config.mapping).unwrap();
    assert_eq!(second.outcomes, first.outcomes);
    assert_eq!((fs::read(&hero).unwrap(), fs::read(&features).unwrap()), before);
    assert!(!layout.category_dir("features").join("level-design.png").exists());
}

#[test]
fn scan_automap_and_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let (config, layout) = site(root, ExtractStrategy::Mockup);
    let doc = Document::open(&design_document()).unwrap();
    extract(&doc, &config.extract, layout.staging_dir()).unwrap();
    map_staged(&layout, &config.mapping).unwrap();

    fs::create_dir_all(root.join("src/html")).unwrap();
    fs::write(
        root.join("src/html/index.html"),
        r#"<img src="/assets/images/hero/main-hero.jpeg"><img src="/assets/images/news/page1_img3_1600x900.jpg">"#,
    )
    .unwrap();

    let required = layout.collect_required_paths();
    assert_eq!(required.len(), 2);

    let auto = automap(&layout, &required).unwrap();
    assert_eq!(auto.mapped(), 1);
    assert!(layout.category_dir("news").join("page1_img3_1600x900.jpeg").is_file());

    let required = layout.collect_required_paths();
    let plan = plan_cleanup(&layout, &required, &config.mapping.categories, &config.cleanup).unwrap();
    let unused: Vec<String> = plan.unused.iter().map(|p| layout.display_path(p)).collect();
    assert_eq!(unused, ["assets/images/features/level-design.jpeg"]);
    assert_eq!(plan.staging_files.len(), 2);

    let report = execute_cleanup(&plan);
    assert!(report.failures.is_empty());
    assert_eq!(report.deleted.len(), 3);
    assert!(!layout.staging_dir().exists());
    assert!(layout.category_dir("hero").join("main-hero.jpeg").is_file());
    assert!(layout.category_dir("news").join("page1_img3_1600x900.jpeg").is_file());

    let again = plan_cleanup(&layout, &required, &config.mapping.categories, &config.cleanup).unwrap();
    assert!(again.is_empty());
}
