use crate::category::{Category, ExclusionPolicy};
use crate::scanner::CatalogEntry;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// An on-disk item with no counterpart in the client inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Orphan {
    pub name: String,
    pub category: Category,
}

impl Orphan {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

impl fmt::Display for Orphan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (in {})", self.name, self.category)
    }
}

/// Orphans split by exclusion policy. Both lists are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanPartition {
    pub excluded: Vec<Orphan>,
    pub deletable: Vec<Orphan>,
}

impl OrphanPartition {
    pub fn len(&self) -> usize {
        self.excluded.len() + self.deletable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty() && self.deletable.is_empty()
    }
}

/// Computes the orphans of `catalog` against `expected` and partitions them.
///
/// Identity is the bare name. When the same name appears in several
/// categories the last entry wins, so only one category is reported for it.
pub fn reconcile<'a, I>(catalog: I, expected: &HashSet<String>, policy: &ExclusionPolicy) -> OrphanPartition
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let mut by_name: BTreeMap<&str, &Category> = BTreeMap::new();
    for entry in catalog {
        if let Some(previous) = by_name.insert(&entry.name, &entry.category) {
            debug!(
                name = %entry.name,
                shadowed = %previous,
                kept = %entry.category,
                "name appears in several categories"
            );
        }
    }

    let mut partition = OrphanPartition::default();
    for (name, category) in by_name {
        if expected.contains(name) {
            continue;
        }
        let orphan = Orphan::new(name, category.clone());
        if policy.excludes(category) {
            partition.excluded.push(orphan);
        } else {
            partition.deletable.push(orphan);
        }
    }

    info!(
        orphans = partition.len(),
        excluded = partition.excluded.len(),
        deletable = partition.deletable.len(),
        "reconciled catalog against inventory"
    );
    partition
}
