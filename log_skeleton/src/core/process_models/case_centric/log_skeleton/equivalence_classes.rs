use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{is_artificial, Activity};

/// Highest supported noise level (in percent)
pub const MAX_NOISE_LEVEL: usize = 20;

/// Partitions of the activities into same-count classes, one partition per noise level
///
/// The partition at noise level `n + 1` is always a coarsening of the partition at level `n`.
/// Classes within a partition are ordered by their smallest activity. The _representative_ of a
/// class is its smallest activity other than the artificial start and end activities (or the
/// smallest activity, if the class only consists of those).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceClasses {
    levels: Vec<Vec<BTreeSet<Activity>>>,
}

impl EquivalenceClasses {
    /// Wrap mined partitions, indexed by noise level `0..=MAX_NOISE_LEVEL`
    pub(crate) fn from_levels(levels: Vec<Vec<BTreeSet<Activity>>>) -> Self {
        debug_assert_eq!(levels.len(), MAX_NOISE_LEVEL + 1);
        Self { levels }
    }

    /// Number of available noise levels
    pub fn number_of_levels(&self) -> usize {
        self.levels.len()
    }

    /// Partition at the given noise level (clamped to [`MAX_NOISE_LEVEL`])
    pub fn at_noise_level(&self, noise_level: usize) -> &[BTreeSet<Activity>] {
        self.levels
            .get(noise_level.min(MAX_NOISE_LEVEL))
            .map(|classes| classes.as_slice())
            .unwrap_or(&[])
    }

    /// Class containing `activity` at the given noise level
    pub fn class_of(&self, activity: &str, noise_level: usize) -> Option<&BTreeSet<Activity>> {
        self.at_noise_level(noise_level)
            .iter()
            .find(|class| class.contains(activity))
    }

    /// Representative of the class containing `activity`
    pub fn representative(&self, activity: &str, noise_level: usize) -> Option<&Activity> {
        self.class_of(activity, noise_level)
            .and_then(representative_of)
    }

    /// Whether both activities are in the same class at the given noise level
    pub fn are_equivalent(&self, a: &str, b: &str, noise_level: usize) -> bool {
        self.class_of(a, noise_level)
            .is_some_and(|class| class.contains(b))
    }
}

/// Representative of a class (see [`EquivalenceClasses`])
pub fn representative_of(class: &BTreeSet<Activity>) -> Option<&Activity> {
    class
        .iter()
        .find(|a| !is_artificial(a))
        .or_else(|| class.first())
}

/// Whether every class of `finer` is contained in some class of `coarser`
pub fn is_coarsening_of(coarser: &[BTreeSet<Activity>], finer: &[BTreeSet<Activity>]) -> bool {
    finer
        .iter()
        .all(|class| coarser.iter().any(|c| class.is_subset(c)))
}
