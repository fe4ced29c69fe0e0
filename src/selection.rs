use crate::error::SelectionError;
use crate::reconcile::{Orphan, OrphanPartition};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub orphan: Orphan,
    /// Whether the candidate starts out selected for deletion.
    pub checked: bool,
}

/// Flat, ordered list of orphans a caller can pick from.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    candidates: Vec<Candidate>,
}

impl Selection {
    /// Excluded orphans come first and unchecked, deletable ones follow checked.
    pub fn from_partition(partition: &OrphanPartition) -> Self {
        let excluded = partition.excluded.iter().map(|orphan| Candidate {
            orphan: orphan.clone(),
            checked: false,
        });
        let deletable = partition.deletable.iter().map(|orphan| Candidate {
            orphan: orphan.clone(),
            checked: true,
        });
        Self {
            candidates: excluded.chain(deletable).collect(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn defaults(&self) -> Vec<bool> {
        self.candidates.iter().map(|c| c.checked).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Orphans at the given indices, in candidate order. Unknown indices are ignored.
    pub fn picked(&self, indices: &[usize]) -> Vec<Orphan> {
        let indices: BTreeSet<usize> = indices.iter().copied().collect();
        indices
            .into_iter()
            .filter_map(|i| self.candidates.get(i))
            .map(|c| c.orphan.clone())
            .collect()
    }

    /// Orphans checked by default.
    pub fn checked(&self) -> Vec<Orphan> {
        self.candidates
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.orphan.clone())
            .collect()
    }
}

/// Parses a comma separated list of 1-based positions into 0-based indices.
///
/// Empty input or `none` means nothing is excluded.
pub fn parse_exclusions(input: &str, len: usize) -> Result<BTreeSet<usize>, SelectionError> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("none") {
        return Ok(BTreeSet::new());
    }

    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let index: usize = part
                .parse()
                .map_err(|_| SelectionError::NotANumber(part.to_owned()))?;
            if index == 0 || index > len {
                return Err(SelectionError::OutOfRange { index, len });
            }
            Ok(index - 1)
        })
        .collect()
}

/// The deletable list minus the excluded 0-based positions.
pub fn final_deletion_list(deletable: &[Orphan], excluded: &BTreeSet<usize>) -> Vec<Orphan> {
    deletable
        .iter()
        .enumerate()
        .filter(|(i, _)| !excluded.contains(i))
        .map(|(_, orphan)| orphan.clone())
        .collect()
}
