//! Extraction driver.
//!
//! Walks every page of a [`Document`], decides per image whether it should be
//! staged according to the configured [`ExtractStrategy`], and writes the
//! chosen payloads into the staging folder as `page<P>_img<I>[_<W>x<H>].<ext>`.
//!
//! Failures on a single page or image are logged, recorded in the report and
//! counted as skipped; only failing to create the staging folder aborts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use imgharvest_core::naming::size_from_stem;
use imgharvest_core::{
    DuplicateFilter, ExtractConfig, ExtractStrategy, HarvestError, PageImage, ResolvedSize,
    SizeClass, SizeEstimate, StagedName,
};

use crate::document::{Document, Page};

/// What the driver decided for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Staged by the `all`, `min-size` or `priority` strategies.
    Kept,
    /// Passed the mockup classifier.
    Mockup,
    /// Failed the mockup classifier; not staged.
    Planning,
    /// Below the size or area threshold.
    TooSmall,
    /// Same size and vertical bucket as an image already staged.
    Duplicate { of: String },
    /// No dimensions in the stream and never painted on the page.
    Unsized,
}

impl Verdict {
    fn is_skip(&self) -> bool {
        matches!(
            self,
            Verdict::TooSmall | Verdict::Duplicate { .. } | Verdict::Unsized
        )
    }
}

/// One analyzed image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// 1-based page number.
    pub page: usize,
    /// 1-based image number within the page.
    pub image: usize,
    pub size: Option<ResolvedSize>,
    /// Distance from the top of the page.
    pub y_pos: f64,
    pub priority: u32,
    pub verdict: Verdict,
}

/// A file written to the staging folder.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenImage {
    pub page: usize,
    pub image: usize,
    pub file_name: String,
    pub path: PathBuf,
    pub size: Option<ResolvedSize>,
    pub y_pos: f64,
}

/// A page or image that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub page: usize,
    /// `None` when the whole page failed to load.
    pub image: Option<usize>,
    pub message: String,
}

/// Outcome of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub strategy: ExtractStrategy,
    pub page_count: usize,
    pub staging_dir: PathBuf,
    /// Decisions in the order they were made.
    pub records: Vec<ImageRecord>,
    /// Files in the order they were written.
    pub written: Vec<WrittenImage>,
    pub failures: Vec<ItemFailure>,
}

impl ExtractReport {
    /// Images that reached a verdict.
    pub fn analyzed(&self) -> usize {
        self.records.len()
    }

    pub fn mockups(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Mockup))
    }

    pub fn planning(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Planning))
    }

    pub fn extracted(&self) -> usize {
        self.written.len()
    }

    /// Filtered, duplicate, unsized and failed images.
    pub fn skipped(&self) -> usize {
        self.count(Verdict::is_skip) + self.failures.len()
    }

    fn count(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.verdict)).count()
    }
}

/// Extract images from `doc` into `staging_dir`.
pub fn extract(
    doc: &Document,
    config: &ExtractConfig,
    staging_dir: &Path,
) -> Result<ExtractReport, HarvestError> {
    extract_with_progress(doc, config, staging_dir, |_, _| {})
}

/// Like [`extract`], calling `on_page(current, total)` before each page
/// (1-based `current`).
pub fn extract_with_progress(
    doc: &Document,
    config: &ExtractConfig,
    staging_dir: &Path,
    mut on_page: impl FnMut(usize, usize),
) -> Result<ExtractReport, HarvestError> {
    fs::create_dir_all(staging_dir).map_err(|e| HarvestError::io(staging_dir, e))?;

    let mut run = Run {
        doc,
        config,
        staging_dir,
        dedupe: DuplicateFilter::new(config.dedupe_across_pages),
        report: ExtractReport {
            strategy: config.strategy,
            page_count: doc.page_count(),
            staging_dir: staging_dir.to_path_buf(),
            records: Vec::new(),
            written: Vec::new(),
            failures: Vec::new(),
        },
    };

    let total = doc.page_count();
    for (idx, page) in doc.pages().enumerate() {
        on_page(idx + 1, total);
        match page {
            Ok(page) => run.page(&page),
            Err(e) => {
                tracing::warn!(page = idx + 1, error = %e, "failed to load page");
                run.report.failures.push(ItemFailure {
                    page: idx + 1,
                    image: None,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        strategy = config.strategy.as_str(),
        written = run.report.written.len(),
        skipped = run.report.skipped(),
        "extraction finished"
    );
    Ok(run.report)
}

struct Run<'a> {
    doc: &'a Document,
    config: &'a ExtractConfig,
    staging_dir: &'a Path,
    dedupe: DuplicateFilter,
    report: ExtractReport,
}

/// An image that survived the per-image filters, waiting to be written.
struct Candidate<'p> {
    image: &'p PageImage,
    size: Option<ResolvedSize>,
    record: usize,
}

impl Run<'_> {
    fn page(&mut self, page: &Page) {
        let priority = self.config.priority_for(page.number());
        let defer = self.config.strategy == ExtractStrategy::Priority;
        let mut candidates = Vec::new();
        let mut deferred = Vec::new();
        let estimate = match self.config.strategy {
            ExtractStrategy::MinSize => SizeEstimate::ScreenDpi,
            _ => SizeEstimate::PageScale,
        };

        for image in &page.images {
            let size = image.resolve_size_with(estimate, page.width, page.height);
            let verdict = self.judge(page, image, size);
            let keep = matches!(verdict, Verdict::Kept | Verdict::Mockup);
            let record = ImageRecord {
                page: page.number(),
                image: image.index + 1,
                size,
                y_pos: image.y_pos(),
                priority,
                verdict,
            };
            if keep && defer {
                deferred.push((image, record));
                continue;
            }
            self.report.records.push(record);
            if keep {
                candidates.push(Candidate {
                    image,
                    size,
                    record: self.report.records.len() - 1,
                });
            }
        }

        match self.config.strategy {
            ExtractStrategy::All | ExtractStrategy::MinSize => {
                for c in &candidates {
                    self.write(page, c);
                }
            }
            ExtractStrategy::Mockup => {
                candidates.sort_by_key(|c| std::cmp::Reverse(area(c.size)));
                for c in &candidates {
                    self.write(page, c);
                }
            }
            ExtractStrategy::Priority => {
                // Priority is per page, so within a page the order reduces
                // to largest area first, then topmost.
                deferred.sort_by(|(_, a), (_, b)| {
                    area(b.size)
                        .cmp(&area(a.size))
                        .then(a.y_pos.total_cmp(&b.y_pos))
                });
                for (image, record) in deferred {
                    let size = record.size;
                    self.report.records.push(record);
                    let c = Candidate {
                        image,
                        size,
                        record: self.report.records.len() - 1,
                    };
                    self.write_deduped(page, &c);
                }
            }
        }
    }

    fn judge(&self, page: &Page, image: &PageImage, size: Option<ResolvedSize>) -> Verdict {
        let cfg = self.config;
        match cfg.strategy {
            ExtractStrategy::All => Verdict::Kept,
            ExtractStrategy::MinSize => match size {
                Some(s) if s.width < cfg.min_width || s.height < cfg.min_height => {
                    Verdict::TooSmall
                }
                _ => Verdict::Kept,
            },
            ExtractStrategy::Priority => match size {
                None => Verdict::Unsized,
                Some(s) if s.area() < cfg.min_area => Verdict::TooSmall,
                Some(_) => Verdict::Kept,
            },
            ExtractStrategy::Mockup => match size {
                None => Verdict::Unsized,
                Some(s) if cfg.mockup.accepts(
                    f64::from(s.width),
                    f64::from(s.height),
                    s.area() as f64,
                    image.y_pos(),
                    page.height,
                    page.width,
                ) =>
                {
                    Verdict::Mockup
                }
                Some(_) => Verdict::Planning,
            },
        }
    }

    fn write_deduped(&mut self, page: &Page, c: &Candidate<'_>) {
        let Some(size) = c.size else {
            return;
        };
        let key = self
            .dedupe
            .key(page.index, size.width, size.height, c.image.y_pos());
        if let Some(of) = self.dedupe.holder(&key) {
            self.report.records[c.record].verdict = Verdict::Duplicate { of: of.to_string() };
            return;
        }
        let Some(content) = self.fetch(page, c) else {
            return;
        };
        let name = self.staged_name(page, c, content.format.extension());
        if self.store(page, c, &name, &content.data) {
            self.dedupe.claim(key, &name.file_name());
        }
    }

    fn write(&mut self, page: &Page, c: &Candidate<'_>) {
        let Some(content) = self.fetch(page, c) else {
            return;
        };
        let name = self.staged_name(page, c, content.format.extension());
        self.store(page, c, &name, &content.data);
    }

    fn fetch(&mut self, page: &Page, c: &Candidate<'_>) -> Option<imgharvest_core::ImageContent> {
        match self.doc.image_content(c.image) {
            Ok(content) => Some(content),
            Err(e) => {
                self.fail(page, c, e.to_string());
                None
            }
        }
    }

    fn staged_name(&self, page: &Page, c: &Candidate<'_>, extension: &str) -> StagedName {
        let dims = match self.config.strategy {
            ExtractStrategy::All => None,
            _ => c.size.map(|s| (s.width, s.height)),
        };
        StagedName::new(page.number(), c.image.index, dims, extension)
    }

    /// Write one staged file; `false` when the write failed.
    fn store(&mut self, page: &Page, c: &Candidate<'_>, name: &StagedName, data: &[u8]) -> bool {
        let file_name = name.file_name();
        let path = self.staging_dir.join(&file_name);
        if let Err(e) = fs::write(&path, data) {
            self.fail(page, c, HarvestError::io(&path, e).to_string());
            return false;
        }
        tracing::debug!(file = %file_name, bytes = data.len(), "staged image");
        self.report.written.push(WrittenImage {
            page: page.number(),
            image: c.image.index + 1,
            file_name,
            path,
            size: c.size,
            y_pos: c.image.y_pos(),
        });
        true
    }

    fn fail(&mut self, page: &Page, c: &Candidate<'_>, message: String) {
        tracing::warn!(
            page = page.number(),
            image = c.image.index + 1,
            error = %message,
            "failed to extract image"
        );
        self.report.failures.push(ItemFailure {
            page: page.number(),
            image: Some(c.image.index + 1),
            message,
        });
    }
}

fn area(size: Option<ResolvedSize>) -> u64 {
    size.map_or(0, |s| s.area())
}

/// Staged files grouped by the size encoded in their names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagingSummary {
    pub classes: BTreeMap<SizeClass, Vec<String>>,
}

impl StagingSummary {
    /// File names in `class`, sorted.
    pub fn files(&self, class: SizeClass) -> &[String] {
        self.classes.get(&class).map_or(&[], Vec::as_slice)
    }
}

/// Bucket every staged file carrying a `_<W>x<H>` suffix by [`SizeClass`].
/// Files without a size are left out.
pub fn summarize_staging(dir: &Path) -> Result<StagingSummary, HarvestError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| HarvestError::io(dir, e))?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut summary = StagingSummary::default();
    for name in names {
        let stem = imgharvest_core::rules::file_stem(&name);
        if let Some((w, h)) = size_from_stem(stem) {
            summary
                .classes
                .entry(SizeClass::of(w, h))
                .or_default()
                .push(name);
        }
    }
    Ok(summary)
}
