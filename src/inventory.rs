//! Tracked items as reported by the torrent client.
//!
//! The expected input is the JSON array returned by the client's
//! `torrents/info` endpoint. Only `content_path` is required; everything else
//! is informational.

use crate::error::InventoryError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    pub content_path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

impl TrackedItem {
    pub fn new(content_path: impl Into<String>) -> Self {
        Self {
            content_path: content_path.into(),
            name: None,
            category: None,
            hash: None,
        }
    }

    /// Final component of `content_path`, accepting both `/` and `\` separators.
    pub fn base_name(&self) -> &str {
        let trimmed = self.content_path.trim_end_matches(['/', '\\']);
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(trimmed)
    }
}

/// Names expected to exist on disk for the given tracked items.
pub fn expected_names(items: &[TrackedItem]) -> HashSet<String> {
    items
        .iter()
        .map(TrackedItem::base_name)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn read_inventory<R: Read>(reader: R, source_name: &str) -> Result<Vec<TrackedItem>, InventoryError> {
    serde_json::from_reader(reader).map_err(|source| InventoryError::Parse {
        source_name: source_name.to_owned(),
        source,
    })
}

/// Loads the inventory from a JSON file, or from stdin when `path` is `-`.
pub fn load_inventory(path: &Path) -> Result<Vec<TrackedItem>, InventoryError> {
    let items = if path == Path::new("-") {
        read_inventory(io::stdin().lock(), "stdin")?
    } else {
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|source| InventoryError::Io {
            source_name: source_name.clone(),
            source,
        })?;
        read_inventory(BufReader::new(file), &source_name)?
    };

    info!(tracked = items.len(), "loaded client inventory");
    Ok(items)
}
