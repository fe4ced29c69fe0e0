use crate::category::Category;
use crate::error::ScanError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// An item found on disk, keyed by its bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub category: Category,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Result of listing the download root.
#[derive(Debug, Default)]
pub struct Scan {
    /// Entries in scan order. Names may repeat across categories.
    pub entries: Vec<CatalogEntry>,
    pub category_count: usize,
    pub skipped_categories: Vec<PathBuf>,
}

fn children(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    let name = entry.file_name().to_str().map(str::to_owned);
    if name.is_none() {
        warn!(path = %entry.path().display(), "skipping entry with non UTF-8 name");
    }
    name
}

/// Lists `root` one level deep: plain files become `root` entries, directories
/// are categories whose immediate children become entries.
pub fn scan(root: &Path) -> Result<Scan, ScanError> {
    let meta = fs::metadata(root).map_err(|e| ScanError::from_io(root.to_path_buf(), e))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut scan = Scan::default();

    for entry in children(root) {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 means the root itself could not be listed.
            Err(e) if e.depth() == 0 => {
                let path = root.to_path_buf();
                return Err(match e.into_io_error() {
                    Some(io) => ScanError::from_io(path, io),
                    None => ScanError::PermissionDenied(path),
                });
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry under download root");
                continue;
            }
        };

        let Some(name) = entry_name(&entry) else {
            continue;
        };

        if entry.path().is_dir() {
            scan.category_count += 1;
            scan_category(entry.path(), &name, &mut scan);
        } else {
            scan.entries.push(CatalogEntry::new(name, Category::Root));
        }
    }

    info!(
        root = %root.display(),
        categories = scan.category_count,
        items = scan.entries.len(),
        skipped = scan.skipped_categories.len(),
        "scan complete"
    );
    Ok(scan)
}

fn scan_category(dir: &Path, folder: &str, scan: &mut Scan) {
    let before = scan.entries.len();

    for entry in children(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                warn!(path = %dir.display(), error = %e, "cannot access category folder, skipping");
                scan.skipped_categories.push(dir.to_path_buf());
                scan.entries.truncate(before);
                return;
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry in category folder");
                continue;
            }
        };

        if let Some(name) = entry_name(&entry) {
            scan.entries
                .push(CatalogEntry::new(name, Category::Folder(folder.to_owned())));
        }
    }

    debug!(category = folder, items = scan.entries.len() - before, "scanned category");
}
