//! imgharvest-core: Backend-independent types and heuristics.
//!
//! This crate holds everything that does not need to read a PDF or touch
//! the filesystem beyond loading configuration: geometry, the embedded image
//! model, the mockup classifier, duplicate suppression, staged filename
//! encoding, mapping rules and asset reference scanning.

pub mod classify;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod geometry;
pub mod images;
pub mod naming;
pub mod rules;
pub mod scan;

pub use classify::{
    MockupThresholds, SizeClass, SizeEstimate, estimate_pixel_size, estimate_screen_size,
    is_web_mockup,
};
pub use config::{
    CONFIG_FILE, CandidateOrder, CleanupConfig, ExtractConfig, ExtractStrategy, HarvestConfig,
    MappingConfig, PagePriority, PathsConfig, SourcesConfig,
};
pub use dedupe::{DuplicateFilter, DuplicateKey};
pub use error::HarvestError;
pub use geometry::{BBox, Ctm, Point, placement_from_ctm};
pub use images::{ImageContent, ImageFilter, ImageFormat, PageImage, ResolvedSize};
pub use naming::StagedName;
pub use rules::{MappingRule, RuleSelector, adjust_extension, default_rules};
pub use scan::{ReferenceScanner, RequiredPaths, normalize_asset_path};
