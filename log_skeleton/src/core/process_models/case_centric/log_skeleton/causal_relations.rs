use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::Activity;

/// Window used for computing the (filtered) preset and postset of an activity occurrence
///
/// Scanning starts next to the occurrence and moves outwards. It stops after `horizon`
/// positions (unless `horizon` is `0`) and directly after the first boundary activity
/// (the boundary activity itself is still included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CausalWindow {
    /// Maximal number of positions to scan in each direction (`0` = unbounded)
    pub horizon: usize,
    /// Activities which end a scan once encountered
    pub boundary_activities: BTreeSet<Activity>,
}

impl CausalWindow {
    /// Create a new window
    pub fn new(horizon: usize, boundary_activities: BTreeSet<Activity>) -> Self {
        Self {
            horizon,
            boundary_activities,
        }
    }

    fn scan<'a, I>(&self, positions: I) -> BTreeSet<&'a str>
    where
        I: Iterator<Item = &'a Activity>,
    {
        let mut set = BTreeSet::new();
        for (steps, act) in positions.enumerate() {
            if self.horizon > 0 && steps >= self.horizon {
                break;
            }
            set.insert(act.as_str());
            if self.boundary_activities.contains(act) {
                break;
            }
        }
        set
    }

    /// Filtered preset of the occurrence at `position` in `sequence`
    pub fn preset<'a>(&self, sequence: &'a [Activity], position: usize) -> BTreeSet<&'a str> {
        self.scan(sequence[..position.min(sequence.len())].iter().rev())
    }

    /// Filtered postset of the occurrence at `position` in `sequence`
    pub fn postset<'a>(&self, sequence: &'a [Activity], position: usize) -> BTreeSet<&'a str> {
        let start = (position + 1).min(sequence.len());
        self.scan(sequence[start..].iter())
    }
}

/// Causal dependencies between activities
///
/// * `all_pre[a]`: activities in the filtered preset of _every_ occurrence of `a` (reduced, see below)
/// * `any_pre[a]`: activities in the filtered preset of _some_ occurrence of `a`
///
/// and symmetrically `all_post`/`any_post` for postsets.
///
/// `all_pre` and `all_post` are reduced: an entry that is only present because of a longer,
/// non-cyclic chain of dependencies is removed.
///
/// Next to the sets, the number of occurrences of `a` having `b` in their preset, postset, or
/// either of the two is kept as support for threshold-based queries.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalRelations {
    pub(crate) window: CausalWindow,
    pub(crate) all_pre: BTreeMap<Activity, BTreeSet<Activity>>,
    pub(crate) all_post: BTreeMap<Activity, BTreeSet<Activity>>,
    pub(crate) any_pre: BTreeMap<Activity, BTreeSet<Activity>>,
    pub(crate) any_post: BTreeMap<Activity, BTreeSet<Activity>>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub(crate) pre_support: BTreeMap<(Activity, Activity), u64>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub(crate) post_support: BTreeMap<(Activity, Activity), u64>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub(crate) co_support: BTreeMap<(Activity, Activity), u64>,
}

fn support(map: &BTreeMap<(Activity, Activity), u64>, a: &str, b: &str) -> u64 {
    map.get(&(a.to_string(), b.to_string()))
        .copied()
        .unwrap_or(0)
}

impl CausalRelations {
    /// Window the relations were mined with
    pub fn window(&self) -> &CausalWindow {
        &self.window
    }

    /// Activities always (somewhere) before `activity`
    pub fn all_pre(&self, activity: &str) -> Option<&BTreeSet<Activity>> {
        self.all_pre.get(activity)
    }

    /// Activities always (somewhere) after `activity`
    pub fn all_post(&self, activity: &str) -> Option<&BTreeSet<Activity>> {
        self.all_post.get(activity)
    }

    /// Activities sometimes before `activity`
    pub fn any_pre(&self, activity: &str) -> Option<&BTreeSet<Activity>> {
        self.any_pre.get(activity)
    }

    /// Activities sometimes after `activity`
    pub fn any_post(&self, activity: &str) -> Option<&BTreeSet<Activity>> {
        self.any_post.get(activity)
    }

    /// Number of occurrences of `a` with `b` in their filtered preset
    pub fn pre_support(&self, a: &str, b: &str) -> u64 {
        support(&self.pre_support, a, b)
    }

    /// Number of occurrences of `a` with `b` in their filtered postset
    pub fn post_support(&self, a: &str, b: &str) -> u64 {
        support(&self.post_support, a, b)
    }

    /// Number of occurrences of `a` with `b` in their filtered preset or postset
    pub fn co_support(&self, a: &str, b: &str) -> u64 {
        support(&self.co_support, a, b)
    }

    /// The reduced always-before relation of all activities
    pub fn all_pre_map(&self) -> &BTreeMap<Activity, BTreeSet<Activity>> {
        &self.all_pre
    }

    /// The reduced always-after relation of all activities
    pub fn all_post_map(&self) -> &BTreeMap<Activity, BTreeSet<Activity>> {
        &self.all_post
    }

    /// The sometimes-before relation of all activities
    pub fn any_pre_map(&self) -> &BTreeMap<Activity, BTreeSet<Activity>> {
        &self.any_pre
    }

    /// The sometimes-after relation of all activities
    pub fn any_post_map(&self) -> &BTreeMap<Activity, BTreeSet<Activity>> {
        &self.any_post
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(acts: &[&str]) -> Vec<Activity> {
        acts.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn unbounded_window() {
        let s = seq(&["s", "a", "b", "c", "e"]);
        let window = CausalWindow::default();
        assert_eq!(window.preset(&s, 2), BTreeSet::from(["a", "s"]));
        assert_eq!(window.postset(&s, 2), BTreeSet::from(["c", "e"]));
        assert!(window.preset(&s, 0).is_empty());
        assert!(window.postset(&s, 4).is_empty());
    }

    #[test]
    fn horizon_limits_scan() {
        let s = seq(&["s", "a", "b", "c", "d", "e"]);
        let window = CausalWindow::new(2, BTreeSet::new());
        assert_eq!(window.preset(&s, 4), BTreeSet::from(["b", "c"]));
        assert_eq!(window.postset(&s, 1), BTreeSet::from(["b", "c"]));
    }

    #[test]
    fn boundary_is_included_then_stops() {
        let s = seq(&["s", "a", "x", "b", "x", "c", "e"]);
        let window = CausalWindow::new(0, BTreeSet::from(["x".to_string()]));
        assert_eq!(window.preset(&s, 3), BTreeSet::from(["x"]));
        assert_eq!(window.postset(&s, 3), BTreeSet::from(["x"]));
        assert_eq!(window.postset(&s, 5), BTreeSet::from(["e"]));
        assert_eq!(window.preset(&s, 2), BTreeSet::from(["a", "s"]));
    }
}
