use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Label used for items that live directly under the download root.
pub const ROOT_LABEL: &str = "root";

/// Categories excluded from deletion unless the caller opts out.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["ISOs"];

/// Where an item sits under the download root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Root,
    Folder(String),
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Root => ROOT_LABEL,
            Category::Folder(name) => name,
        }
    }

    /// Absolute location of `item` inside this category.
    pub fn resolve(&self, root: &Path, item: &str) -> PathBuf {
        match self {
            Category::Root => root.join(item),
            Category::Folder(folder) => root.join(folder).join(item),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Category names whose orphans are kept out of the deletable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    categories: BTreeSet<String>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn none() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn with<S: Into<String>>(mut self, category: S) -> Self {
        self.categories.insert(category.into());
        self
    }

    /// Matches on the rendered name, so `"root"` also excludes top-level items.
    pub fn excludes(&self, category: &Category) -> bool {
        self.categories.contains(category.name())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().copied())
    }
}
