//! Site layout and asset reference collection.

use std::fs;
use std::path::{Path, PathBuf};

use imgharvest_core::{HarvestConfig, HarvestError, ReferenceScanner, RequiredPaths};

/// Resolved filesystem locations for one configuration.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
    document: PathBuf,
    images_dir: PathBuf,
    staging_dir: PathBuf,
    markup: Vec<PathBuf>,
    scripts: Vec<PathBuf>,
    style_dirs: Vec<PathBuf>,
    asset_prefix: String,
}

impl SiteLayout {
    pub fn new(config: &HarvestConfig) -> Self {
        let root = config.base_dir.join(&config.paths.root);
        let images_dir = root.join(&config.paths.images);
        Self {
            document: root.join(&config.paths.document),
            staging_dir: images_dir.join(&config.paths.staging),
            markup: join_all(&root, &config.sources.markup),
            scripts: join_all(&root, &config.sources.scripts),
            style_dirs: join_all(&root, &config.sources.style_dirs),
            asset_prefix: config.paths.asset_prefix.clone(),
            images_dir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Directory holding the category folders.
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.images_dir.join(category)
    }

    /// On-disk location of a root-relative asset path.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// `path` relative to the project root with `/` separators, for reports.
    pub fn display_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Every source file to scan: markup, scripts, then `*.css` files of
    /// each style directory in name order. Missing paths are kept; the
    /// caller decides what to do with them.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.markup.iter().chain(&self.scripts).cloned().collect();
        for dir in &self.style_dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                tracing::debug!(dir = %dir.display(), "style directory not found");
                continue;
            };
            let mut styles: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
                })
                .collect();
            styles.sort();
            files.extend(styles);
        }
        files
    }

    /// Scan every source file for asset references.
    ///
    /// A missing or unreadable source contributes nothing. Non-UTF-8 bytes
    /// are replaced rather than rejected.
    pub fn collect_required_paths(&self) -> RequiredPaths {
        let scanner = ReferenceScanner::new(&self.asset_prefix);
        let mut required = RequiredPaths::new();
        for file in self.source_files() {
            match fs::read(&file) {
                Ok(bytes) => {
                    let before = required.len();
                    scanner.scan_into(&String::from_utf8_lossy(&bytes), &mut required);
                    tracing::debug!(
                        source = %file.display(),
                        added = required.len() - before,
                        "scanned source"
                    );
                }
                Err(e) => {
                    tracing::debug!(source = %file.display(), error = %e, "source not readable, skipping");
                }
            }
        }
        required
    }
}

fn join_all(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|p| root.join(p)).collect()
}

/// Fail with [`HarvestError::Io`] (not found) when `dir` does not exist.
pub(crate) fn require_dir(dir: &Path) -> Result<(), HarvestError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(HarvestError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        ))
    }
}
