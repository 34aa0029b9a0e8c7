//! Reconciliation: copy staged images into category folders and remove what
//! the site no longer references.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use imgharvest_core::naming::size_from_stem;
use imgharvest_core::rules::{file_extension, file_stem};
use imgharvest_core::{
    CandidateOrder, CleanupConfig, HarvestError, MappingConfig, MappingRule, RequiredPaths,
    RuleSelector, adjust_extension,
};

use crate::site::{SiteLayout, require_dir};

/// Extensions a staged file must have to be offered to rules.
const CANDIDATE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn is_candidate(file_name: &str) -> bool {
    file_extension(file_name).is_some_and(|ext| CANDIDATE_EXTENSIONS.contains(&ext.as_str()))
}

/// Staged candidate file names in the requested order.
pub fn list_candidates(staging_dir: &Path, order: CandidateOrder) -> Result<Vec<String>, HarvestError> {
    require_dir(staging_dir)?;
    let mut names: Vec<String> = fs::read_dir(staging_dir)
        .map_err(|e| HarvestError::io(staging_dir, e))?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| is_candidate(name))
        .collect();
    names.sort();
    if order == CandidateOrder::LargestFirst {
        names.sort_by_key(|name| {
            let area = size_from_stem(file_stem(name)).map_or(0, |(w, h)| u64::from(w) * u64::from(h));
            std::cmp::Reverse(area)
        });
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// map
// ---------------------------------------------------------------------------

/// Result of applying one rule.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Mapped {
        source: String,
        /// Written file name, after extension adjustment.
        target: String,
        /// Original target name when the extension was adjusted.
        adjusted_from: Option<String>,
        /// Matched by page only.
        fallback: bool,
    },
    NotFound,
    CopyFailed {
        source: String,
        target: String,
        message: String,
    },
    UnknownCategory,
    /// Neither `source` nor `page` + `image` set.
    InvalidRule,
}

/// One rule and what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: MappingRule,
    /// Prefix or file name the rule searched for.
    pub pattern: String,
    pub outcome: MapOutcome,
}

impl RuleOutcome {
    pub fn is_mapped(&self) -> bool {
        matches!(self.outcome, MapOutcome::Mapped { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl MapReport {
    pub fn mapped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_mapped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.mapped()
    }
}

/// Apply every mapping rule, in order, to the staged files.
///
/// Category folders are created first. Each rule takes the first candidate
/// its selector matches; copies overwrite, so running twice produces the
/// same tree. A missing staging folder is fatal; everything else is a
/// per-rule failure.
pub fn map_staged(layout: &SiteLayout, mapping: &MappingConfig) -> Result<MapReport, HarvestError> {
    let candidates = list_candidates(layout.staging_dir(), mapping.order)?;
    for category in &mapping.categories {
        let dir = layout.category_dir(category);
        fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;
    }
    tracing::debug!(candidates = candidates.len(), rules = mapping.rules.len(), "mapping staged images");

    let outcomes = mapping
        .rules
        .iter()
        .map(|rule| apply_rule(layout, mapping, &candidates, rule))
        .collect();
    Ok(MapReport { outcomes })
}

fn apply_rule(
    layout: &SiteLayout,
    mapping: &MappingConfig,
    candidates: &[String],
    rule: &MappingRule,
) -> RuleOutcome {
    let Some(selector) = rule.selector() else {
        return RuleOutcome {
            rule: rule.clone(),
            pattern: String::new(),
            outcome: MapOutcome::InvalidRule,
        };
    };
    let pattern = selector.describe();
    let done = |outcome| RuleOutcome {
        rule: rule.clone(),
        pattern: pattern.clone(),
        outcome,
    };

    if !mapping.categories.contains(&rule.category) {
        tracing::warn!(category = %rule.category, "rule names an unknown category");
        return done(MapOutcome::UnknownCategory);
    }

    let Some((source, fallback)) = find_match(&selector, candidates, mapping.page_fallback) else {
        return done(MapOutcome::NotFound);
    };
    if fallback {
        tracing::warn!(pattern = %pattern, source = %source, "no exact match, using first image of the page");
    }

    let (target, adjusted) = adjust_extension(&rule.target, source);
    let from = layout.staging_dir().join(source);
    let to = layout.category_dir(&rule.category).join(&target);
    match fs::copy(&from, &to) {
        Ok(_) => {
            tracing::debug!(source = %source, target = %to.display(), "mapped");
            done(MapOutcome::Mapped {
                source: source.clone(),
                target,
                adjusted_from: adjusted.then(|| rule.target.clone()),
                fallback,
            })
        }
        Err(e) => {
            tracing::warn!(source = %source, target = %to.display(), error = %e, "copy failed");
            done(MapOutcome::CopyFailed {
                source: source.clone(),
                target,
                message: e.to_string(),
            })
        }
    }
}

fn find_match<'c>(
    selector: &RuleSelector,
    candidates: &'c [String],
    page_fallback: bool,
) -> Option<(&'c String, bool)> {
    if let Some(exact) = candidates.iter().find(|c| selector.matches(c)) {
        return Some((exact, false));
    }
    if page_fallback {
        return candidates
            .iter()
            .find(|c| selector.matches_page(c))
            .map(|c| (c, true));
    }
    None
}

// ---------------------------------------------------------------------------
// automap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AutoMapOutcome {
    /// Already on disk.
    Present,
    Mapped { source: String, target: String },
    NotFound,
    CopyFailed { source: String, message: String },
}

/// One required path and how it was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoMapEntry {
    /// Root-relative required path.
    pub required: String,
    pub outcome: AutoMapOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct AutoMapReport {
    pub entries: Vec<AutoMapEntry>,
}

impl AutoMapReport {
    /// Required paths that were not on disk before the run.
    pub fn missing(&self) -> impl Iterator<Item = &AutoMapEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome != AutoMapOutcome::Present)
    }

    pub fn mapped(&self) -> usize {
        self.count(|o| matches!(o, AutoMapOutcome::Mapped { .. }))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| !matches!(o, AutoMapOutcome::Present | AutoMapOutcome::Mapped { .. }))
    }

    fn count(&self, pred: impl Fn(&AutoMapOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Fill required paths that are missing on disk with the staged file of the
/// same stem (case-insensitive), keeping the staged file's extension.
pub fn automap(layout: &SiteLayout, required: &RequiredPaths) -> Result<AutoMapReport, HarvestError> {
    let candidates = list_candidates(layout.staging_dir(), CandidateOrder::Name)?;
    let mut by_stem: HashMap<String, &String> = HashMap::new();
    for name in &candidates {
        by_stem
            .entry(file_stem(name).to_lowercase())
            .or_insert(name);
    }

    let mut entries = Vec::with_capacity(required.len());
    for req in required {
        let dest = layout.asset_path(req);
        let outcome = if dest.exists() {
            AutoMapOutcome::Present
        } else {
            fill_missing(layout, &dest, &by_stem)
        };
        entries.push(AutoMapEntry {
            required: req.clone(),
            outcome,
        });
    }
    Ok(AutoMapReport { entries })
}

fn fill_missing(layout: &SiteLayout, dest: &Path, by_stem: &HashMap<String, &String>) -> AutoMapOutcome {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(source) = by_stem.get(&file_stem(&file_name).to_lowercase()) else {
        return AutoMapOutcome::NotFound;
    };

    let (target, _) = adjust_extension(&file_name, source);
    let dir = dest.parent().unwrap_or(layout.root());
    let copied = fs::create_dir_all(dir).and_then(|()| fs::copy(layout.staging_dir().join(source), dir.join(&target)));
    match copied {
        Ok(_) => AutoMapOutcome::Mapped {
            source: source.to_string(),
            target: layout.display_path(&dir.join(&target)),
        },
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "copy failed");
            AutoMapOutcome::CopyFailed {
                source: source.to_string(),
                message: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// cleanup
// ---------------------------------------------------------------------------

/// Files a cleanup run would delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupPlan {
    /// Site images that no source references, in folder then name order.
    pub unused: Vec<PathBuf>,
    /// Every file under the staging folder.
    pub staging_files: Vec<PathBuf>,
    pub staging_dir: PathBuf,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.unused.is_empty() && self.staging_files.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Work out which category files are unreferenced.
///
/// A required path keeps its own file and, with `keep_same_stem`, every
/// sibling sharing its stem (so `logo.png` keeps `logo.svg`).
pub fn plan_cleanup(
    layout: &SiteLayout,
    required: &RequiredPaths,
    categories: &[String],
    cleanup: &CleanupConfig,
) -> Result<CleanupPlan, HarvestError> {
    let keep_stems: BTreeSet<String> = required.iter().map(|r| file_stem(r).to_string()).collect();
    let is_required = |relative: &str| {
        required.contains(relative) || (cleanup.keep_same_stem && keep_stems.contains(file_stem(relative)))
    };

    let mut folders: Vec<&String> = categories.iter().chain(&cleanup.folders).collect();
    let mut seen = BTreeSet::new();
    folders.retain(|f| seen.insert(f.as_str()));

    let mut unused = Vec::new();
    for folder in folders {
        let dir = layout.category_dir(folder);
        let Ok(entries) = fs::read_dir(&dir) else {
            tracing::debug!(dir = %dir.display(), "folder absent, skipping");
            continue;
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| p.file_name().is_some_and(|n| cleanup.is_image(&n.to_string_lossy())))
            .collect();
        files.sort();
        unused.extend(files.into_iter().filter(|p| !is_required(&layout.display_path(p))));
    }

    let staging_dir = layout.staging_dir().to_path_buf();
    let mut staging_files = Vec::new();
    if staging_dir.is_dir() {
        walk_files(&staging_dir, &mut staging_files).map_err(|e| HarvestError::io(&staging_dir, e))?;
    }

    Ok(CleanupPlan {
        unused,
        staging_files,
        staging_dir,
    })
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Delete everything in `plan`, then remove staging directories left empty.
/// Failures are collected; the run always finishes.
pub fn execute_cleanup(plan: &CleanupPlan) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in plan.unused.iter().chain(&plan.staging_files) {
        match fs::remove_file(path) {
            Ok(()) => report.deleted.push(path.clone()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "delete failed");
                report.failures.push((path.clone(), e.to_string()));
            }
        }
    }
    if plan.staging_dir.is_dir() {
        remove_empty_dirs(&plan.staging_dir, &mut report.removed_dirs);
    }
    report
}

/// Remove `dir` and its subdirectories bottom-up, stopping at any that
/// still hold files.
fn remove_empty_dirs(dir: &Path, removed: &mut Vec<PathBuf>) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                remove_empty_dirs(&path, removed);
            }
        }
    }
    if fs::remove_dir(dir).is_ok() {
        removed.push(dir.to_path_buf());
    }
}
