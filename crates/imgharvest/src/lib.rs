//! imgharvest: Stage images from a design PDF and reconcile them with a
//! static site's asset folders.
//!
//! This is the public API facade. It re-exports the types of
//! imgharvest-core and drives imgharvest-parse for PDF reading.
//!
//! # Architecture
//!
//! - **imgharvest-core**: Backend-independent types, heuristics and configuration
//! - **imgharvest-parse**: lopdf backend (pages, image placements, payloads)
//! - **imgharvest** (this crate): Document API, extraction driver, reference
//!   collection, mapping, auto-mapping and cleanup
//!
//! # Example
//!
//! ```ignore
//! use imgharvest::{Document, HarvestConfig, SiteLayout, extract, map_staged};
//!
//! let config = HarvestConfig::load_or_default("harvest.toml".as_ref())?;
//! let layout = SiteLayout::new(&config);
//! let doc = Document::open_file(layout.document())?;
//! let report = extract(&doc, &config.extract, layout.staging_dir())?;
//! println!("{} images staged", report.extracted());
//! let mapped = map_staged(&layout, &config.mapping)?;
//! println!("{} mapped, {} failed", mapped.mapped(), mapped.failed());
//! ```

mod document;
mod extract;
mod reconcile;
mod site;

pub use imgharvest_core;
pub use imgharvest_parse;

pub use document::{Document, Page, PagesIter};
pub use extract::{
    ExtractReport, ImageRecord, ItemFailure, StagingSummary, Verdict, WrittenImage, extract,
    extract_with_progress, summarize_staging,
};
pub use reconcile::{
    AutoMapEntry, AutoMapOutcome, AutoMapReport, CleanupPlan, CleanupReport, MapOutcome,
    MapReport, RuleOutcome, automap, execute_cleanup, list_candidates, map_staged, plan_cleanup,
};
pub use site::SiteLayout;

pub use imgharvest_core::{
    BBox, CONFIG_FILE, CandidateOrder, CleanupConfig, ExtractConfig, ExtractStrategy,
    HarvestConfig, HarvestError, ImageContent, ImageFilter, ImageFormat, MappingConfig,
    MappingRule, MockupThresholds, PageImage, RequiredPaths, ResolvedSize, RuleSelector,
    SizeClass, StagedName,
};
