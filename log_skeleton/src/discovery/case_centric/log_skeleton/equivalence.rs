use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::core::process_models::case_centric::log_skeleton::{
    equivalence_classes::representative_of, Activity, CountModel, EquivalenceClasses,
    MAX_NOISE_LEVEL,
};

type CountVector = Vec<u64>;

fn distance(v: &[u64], w: &[u64]) -> u64 {
    v.iter().zip(w).map(|(x, y)| x.abs_diff(*y)).sum()
}

///
/// Mine the same-count classes of `activities` for every noise level `0..=MAX_NOISE_LEVEL`
///
/// Every activity is described by its count vector (its number of occurrences in each of the
/// `trace_models`). At noise level `0`, activities with identical vectors form a class.
/// At noise level `n > 0`, starting from the partition of level `n - 1`, two classes are
/// merged whenever the L1 distance `d` of the vectors of their representatives satisfies
/// `100 * d < n * number_of_traces`, until no more classes can be merged.
///
/// Without any traces every activity forms its own class at every level.
///
pub fn mine_equivalence_classes(
    activities: &BTreeSet<Activity>,
    trace_models: &[CountModel],
) -> EquivalenceClasses {
    let number_of_traces = trace_models.len();
    if number_of_traces == 0 {
        let singletons: Vec<BTreeSet<Activity>> = activities
            .iter()
            .map(|a| BTreeSet::from([a.clone()]))
            .collect();
        return EquivalenceClasses::from_levels(vec![singletons; MAX_NOISE_LEVEL + 1]);
    }

    let vectors: BTreeMap<&str, CountVector> = activities
        .iter()
        .map(|a| {
            let v = trace_models.iter().map(|m| m.activity_count(a)).collect();
            (a.as_str(), v)
        })
        .collect();

    let mut by_vector: BTreeMap<&CountVector, BTreeSet<Activity>> = BTreeMap::new();
    for (act, v) in &vectors {
        by_vector.entry(v).or_default().insert(act.to_string());
    }
    let mut classes: Vec<BTreeSet<Activity>> = by_vector.into_values().collect();
    classes.sort();

    let mut levels = Vec::with_capacity(MAX_NOISE_LEVEL + 1);
    levels.push(classes.clone());
    for noise_level in 1..=MAX_NOISE_LEVEL {
        let bound = (noise_level * number_of_traces) as u64;
        let merges = merge_to_fixed_point(&mut classes, &vectors, bound);
        log::debug!(
            "Noise level {}: {} merges, {} classes",
            noise_level,
            merges,
            classes.len()
        );
        levels.push(classes.clone());
    }
    EquivalenceClasses::from_levels(levels)
}

fn merge_to_fixed_point(
    classes: &mut Vec<BTreeSet<Activity>>,
    vectors: &BTreeMap<&str, CountVector>,
    bound: u64,
) -> usize {
    let mut merges = 0;
    while let Some((i, j)) = find_mergeable(classes, vectors, bound) {
        let absorbed = classes.remove(j);
        classes[i].extend(absorbed);
        merges += 1;
    }
    classes.sort();
    merges
}

fn find_mergeable(
    classes: &[BTreeSet<Activity>],
    vectors: &BTreeMap<&str, CountVector>,
    bound: u64,
) -> Option<(usize, usize)> {
    let representatives: Vec<Option<&CountVector>> = classes
        .iter()
        .map(|class| representative_of(class).and_then(|r| vectors.get(r.as_str())))
        .collect();
    (0..classes.len())
        .tuple_combinations()
        .find(|&(i, j)| match (representatives[i], representatives[j]) {
            (Some(v), Some(w)) => 100 * distance(v, w) < bound,
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::case_centric::log_skeleton::{
        count_model::with_sentinels, equivalence_classes::is_coarsening_of,
    };

    fn models(traces: &[&[&str]]) -> (BTreeSet<Activity>, Vec<CountModel>) {
        let models: Vec<CountModel> = traces
            .iter()
            .map(|t| CountModel::from_sequence(&with_sentinels(t.iter().map(|a| a.to_string()))))
            .collect();
        let activities = models
            .iter()
            .flat_map(|m| m.activities().cloned())
            .collect();
        (activities, models)
    }

    #[test]
    fn identical_vectors_at_level_zero() {
        let (acts, models) = models(&[&["a", "b", "c", "c"], &["b", "a", "c", "c"], &["a", "b"]]);
        let classes = mine_equivalence_classes(&acts, &models);
        assert!(classes.are_equivalent("a", "b", 0));
        assert!(!classes.are_equivalent("a", "c", 0));
        assert_eq!(classes.representative("b", 0).map(|r| r.as_str()), Some("a"));
    }

    #[test]
    fn merges_at_first_noise_level_above_distance() {
        // 10 traces; b is missing in one of them, so its distance to a is 1
        let mut traces: Vec<&[&str]> = vec![&["a", "b"]; 9];
        traces.push(&["a"]);
        let (acts, models) = models(&traces);
        let classes = mine_equivalence_classes(&acts, &models);
        for level in 0..=10 {
            assert!(!classes.are_equivalent("a", "b", level), "level {level}");
        }
        for level in 11..=MAX_NOISE_LEVEL {
            assert!(classes.are_equivalent("a", "b", level), "level {level}");
        }
    }

    #[test]
    fn levels_are_coarsenings() {
        let (acts, models) = models(&[
            &["a", "b", "c", "d"],
            &["a", "b", "b", "d"],
            &["a", "c", "c", "c"],
            &["a", "b", "c"],
            &["a", "d", "d"],
            &["a", "b", "c", "d", "e"],
        ]);
        let classes = mine_equivalence_classes(&acts, &models);
        for level in 1..=MAX_NOISE_LEVEL {
            assert!(is_coarsening_of(
                classes.at_noise_level(level),
                classes.at_noise_level(level - 1)
            ));
        }
        let partitioned: BTreeSet<Activity> = classes
            .at_noise_level(MAX_NOISE_LEVEL)
            .iter()
            .flatten()
            .cloned()
            .collect();
        assert_eq!(partitioned, acts);
    }

    #[test]
    fn no_traces_means_singletons() {
        let acts: BTreeSet<Activity> = ["a".to_string(), "b".to_string()].into();
        let classes = mine_equivalence_classes(&acts, &[]);
        assert_eq!(classes.number_of_levels(), MAX_NOISE_LEVEL + 1);
        assert!(!classes.are_equivalent("a", "b", MAX_NOISE_LEVEL));
        assert_eq!(classes.at_noise_level(7).len(), 2);
    }
}
