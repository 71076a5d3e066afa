use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Splits an activity into two activities, depending on its direct predecessor
///
/// Every occurrence of `activity` that is directly preceded by an occurrence of `predecessor`
/// is relabeled to `activity@predecessor` (see [`ActivitySplitter::DELIMITER`]).
/// All other occurrences keep their label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ActivitySplitter {
    /// Activity to split
    pub activity: String,
    /// Direct predecessor that selects the occurrences to relabel
    pub predecessor: String,
}

impl ActivitySplitter {
    /// Delimiter between the split activity and its predecessor in the new label
    pub const DELIMITER: &'static str = "@";

    /// Create a new splitter
    pub fn new<S: Into<String>>(activity: S, predecessor: S) -> Self {
        Self {
            activity: activity.into(),
            predecessor: predecessor.into(),
        }
    }

    /// Label given to the split-off occurrences
    pub fn split_label(&self) -> String {
        format!("{}{}{}", self.activity, Self::DELIMITER, self.predecessor)
    }
}

impl std::fmt::Display for ActivitySplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} after {}", self.activity, self.predecessor)
    }
}

///
/// Relabels the activities of one trace according to the given splitters
///
/// Splitters are matched against the _original_ labels, so relabeling one occurrence never
/// influences whether its successor is relabeled. If several splitters match an occurrence,
/// the first one wins.
///
pub fn apply_splitters(activities: Vec<String>, splitters: &[ActivitySplitter]) -> Vec<String> {
    if splitters.is_empty() {
        return activities;
    }
    let relabeled: Vec<Option<String>> = activities
        .iter()
        .enumerate()
        .map(|(i, act)| {
            let prev = i.checked_sub(1).map(|p| &activities[p])?;
            splitters
                .iter()
                .find(|s| &s.activity == act && &s.predecessor == prev)
                .map(|s| s.split_label())
        })
        .collect();
    activities
        .into_iter()
        .zip(relabeled)
        .map(|(act, new_label)| new_label.unwrap_or(act))
        .collect()
}
