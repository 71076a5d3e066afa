use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::core::process_models::case_centric::log_skeleton::{
    Activity, CausalRelations, CausalWindow,
};

type Support = BTreeMap<(Activity, Activity), u64>;

/// Per-occurrence statistics accumulated over the traces
#[derive(Debug, Default)]
struct Accumulator {
    occurrences: BTreeMap<Activity, u64>,
    pre: Support,
    post: Support,
    co: Support,
}

fn add_all<K: Ord>(into: &mut BTreeMap<K, u64>, from: BTreeMap<K, u64>) {
    for (key, count) in from {
        *into.entry(key).or_default() += count;
    }
}

impl Accumulator {
    fn add_sequence(&mut self, window: &CausalWindow, sequence: &[Activity]) {
        for (position, act) in sequence.iter().enumerate() {
            *self.occurrences.entry(act.clone()).or_default() += 1;
            let preset = window.preset(sequence, position);
            let postset = window.postset(sequence, position);
            for other in &preset {
                *self.pre.entry((act.clone(), other.to_string())).or_default() += 1;
            }
            for other in &postset {
                *self.post.entry((act.clone(), other.to_string())).or_default() += 1;
            }
            for other in preset.union(&postset) {
                *self.co.entry((act.clone(), other.to_string())).or_default() += 1;
            }
        }
    }

    fn merge(mut self, other: Self) -> Self {
        add_all(&mut self.occurrences, other.occurrences);
        add_all(&mut self.pre, other.pre);
        add_all(&mut self.post, other.post);
        add_all(&mut self.co, other.co);
        self
    }

    /// `(all, any)`: activities found around every / some occurrence
    fn relations(
        &self,
        activities: &BTreeSet<Activity>,
        support: &Support,
    ) -> (
        BTreeMap<Activity, BTreeSet<Activity>>,
        BTreeMap<Activity, BTreeSet<Activity>>,
    ) {
        let mut all: BTreeMap<Activity, BTreeSet<Activity>> = activities
            .iter()
            .map(|a| (a.clone(), BTreeSet::new()))
            .collect();
        let mut any = all.clone();
        for ((a, b), count) in support {
            any.entry(a.clone()).or_default().insert(b.clone());
            if self.occurrences.get(a) == Some(count) {
                all.entry(a.clone()).or_default().insert(b.clone());
            }
        }
        (all, any)
    }
}

///
/// Mine the causal relations of `activities` over the given traces (with start and end activity)
///
/// For every occurrence, the filtered preset and postset are computed with `window`. Activities
/// found in the preset of every (resp. some) occurrence of `a` form `all_pre[a]` (resp.
/// `any_pre[a]`); postsets likewise. `all_pre` and `all_post` are then reduced with
/// [`reduce_indirect_dependencies`].
///
/// Every activity of `activities` gets an entry in all four maps, even if it never occurs.
///
pub fn mine_causal_relations<S>(
    activities: &BTreeSet<Activity>,
    sequences: &[S],
    window: CausalWindow,
) -> CausalRelations
where
    S: AsRef<[Activity]> + Sync,
{
    let acc = sequences
        .par_iter()
        .fold(Accumulator::default, |mut acc, seq| {
            acc.add_sequence(&window, seq.as_ref());
            acc
        })
        .reduce(Accumulator::default, Accumulator::merge);

    let (mut all_pre, any_pre) = acc.relations(activities, &acc.pre);
    let (mut all_post, any_post) = acc.relations(activities, &acc.post);
    let pre_rounds = reduce_indirect_dependencies(&mut all_pre);
    let post_rounds = reduce_indirect_dependencies(&mut all_post);
    log::debug!(
        "Reduced always-before relation in {} rounds, always-after relation in {} rounds",
        pre_rounds,
        post_rounds
    );

    CausalRelations {
        window,
        all_pre,
        all_post,
        any_pre,
        any_post,
        pre_support: acc.pre,
        post_support: acc.post,
        co_support: acc.co,
    }
}

///
/// Remove indirect dependencies from a relation until nothing changes anymore
///
/// `c` is removed from `relation[a]` if there is some `b` in `relation[a]` with `c` in
/// `relation[b]` while `b` is not in `relation[c]` (i.e., `c` is only related to `a` through
/// `b`, and `b` and `c` do not form a cycle). Each round works on a snapshot of the previous
/// round, so the result does not depend on the order of the activities.
///
/// Returns the number of rounds. Applying the reduction to an already reduced relation
/// changes nothing.
///
pub fn reduce_indirect_dependencies(
    relation: &mut BTreeMap<Activity, BTreeSet<Activity>>,
) -> usize {
    let mut rounds = 0;
    loop {
        rounds += 1;
        let snapshot = relation.clone();
        let related = |x: &str, y: &str| snapshot.get(x).is_some_and(|s| s.contains(y));
        let mut changed = false;
        for (a, deps) in relation.iter_mut() {
            let Some(before) = snapshot.get(a) else {
                continue;
            };
            let size = deps.len();
            deps.retain(|c| {
                c == a
                    || !before.iter().any(|b| {
                        b != a && b != c && related(b, c) && !related(c, b)
                    })
            });
            changed |= deps.len() != size;
        }
        if !changed {
            return rounds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::case_centric::log_skeleton::{
        count_model::with_sentinels, END_ACTIVITY, START_ACTIVITY,
    };

    fn sequences(traces: &[&[&str]]) -> Vec<Vec<Activity>> {
        traces
            .iter()
            .map(|t| with_sentinels(t.iter().map(|a| a.to_string())))
            .collect()
    }

    fn activities(seqs: &[Vec<Activity>]) -> BTreeSet<Activity> {
        seqs.iter().flatten().cloned().collect()
    }

    fn set(acts: &[&str]) -> BTreeSet<Activity> {
        acts.iter().map(|a| a.to_string()).collect()
    }

    fn relation(entries: &[(&str, &[&str])]) -> BTreeMap<Activity, BTreeSet<Activity>> {
        entries
            .iter()
            .map(|(a, deps)| (a.to_string(), set(deps)))
            .collect()
    }

    #[test]
    fn chains_are_reduced() {
        let seqs = sequences(&[&["a", "b", "c", "d"], &["a", "b", "c", "d"]]);
        let causal = mine_causal_relations(&activities(&seqs), &seqs, CausalWindow::default());
        assert_eq!(causal.all_pre("d"), Some(&set(&["c"])));
        assert_eq!(causal.all_pre("a"), Some(&set(&[START_ACTIVITY])));
        assert_eq!(causal.all_post("a"), Some(&set(&["b"])));
        assert_eq!(causal.all_post("d"), Some(&set(&[END_ACTIVITY])));
        assert_eq!(causal.any_pre("d"), Some(&set(&[START_ACTIVITY, "a", "b", "c"])));
        assert_eq!(causal.pre_support("d", "a"), 2);
        assert_eq!(causal.post_support("d", "a"), 0);
        assert_eq!(causal.co_support("b", "d"), 2);
    }

    #[test]
    fn cycles_are_kept() {
        let mut rel = relation(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &["b"])]);
        reduce_indirect_dependencies(&mut rel);
        assert_eq!(rel["a"], set(&["b", "c"]));
        assert_eq!(rel["b"], set(&["c"]));
    }

    #[test]
    fn reduction_is_idempotent() {
        let seqs = sequences(&[
            &["a", "b", "c", "d", "e"],
            &["a", "c", "b", "d", "e", "e"],
            &["a", "b", "d", "c", "e"],
        ]);
        let causal = mine_causal_relations(&activities(&seqs), &seqs, CausalWindow::default());
        for reduced in [causal.all_pre_map(), causal.all_post_map()] {
            let mut again = reduced.clone();
            assert_eq!(reduce_indirect_dependencies(&mut again), 1);
            assert_eq!(&again, reduced);
        }
    }

    #[test]
    fn window_limits_relations() {
        let seqs = sequences(&[&["a", "x", "b"], &["a", "x", "b", "b"]]);
        let window = CausalWindow::new(0, set(&["x"]));
        let causal = mine_causal_relations(&activities(&seqs), &seqs, window);
        assert_eq!(causal.any_pre("b"), Some(&set(&["b", "x"])));
        assert_eq!(causal.all_pre("b"), Some(&set(&["x"])));
        assert_eq!(causal.pre_support("b", "a"), 0);
        assert_eq!(causal.any_post("a"), Some(&set(&["x"])));
    }

    #[test]
    fn unseen_activities_have_empty_relations() {
        let causal = mine_causal_relations::<Vec<Activity>>(
            &set(&[START_ACTIVITY, END_ACTIVITY]),
            &[],
            CausalWindow::default(),
        );
        assert_eq!(causal.all_pre(START_ACTIVITY), Some(&BTreeSet::new()));
        assert_eq!(causal.any_post(END_ACTIVITY), Some(&BTreeSet::new()));
        assert_eq!(causal.all_pre("a"), None);
    }
}
