use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::core::event_data::case_centric::{ActivityClassifier, EventLog};

use super::{Activity, END_ACTIVITY, START_ACTIVITY};

///
/// Prepend [`START_ACTIVITY`] and append [`END_ACTIVITY`] to a classified trace
///
pub fn with_sentinels<I>(activities: I) -> Vec<Activity>
where
    I: IntoIterator<Item = Activity>,
{
    std::iter::once(START_ACTIVITY.to_string())
        .chain(activities)
        .chain(std::iter::once(END_ACTIVITY.to_string()))
        .collect()
}

/// Activity and transition (directly-follows) counts of a set of traces
///
/// Both the activity counts and the transition counts include the artificial
/// [`START_ACTIVITY`] and [`END_ACTIVITY`], so an empty trace contributes one start, one end,
/// and the transition from start to end.
///
/// Counts of unknown activities or transitions are `0`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountModel {
    activity_counts: BTreeMap<Activity, u64>,
    #[serde_as(as = "Vec<(_, _)>")]
    transition_counts: BTreeMap<(Activity, Activity), u64>,
}

impl CountModel {
    ///
    /// Count the activities and transitions of the given traces
    ///
    /// Each trace is a sequence of activities that already starts with [`START_ACTIVITY`] and
    /// ends with [`END_ACTIVITY`] (see [`with_sentinels`]).
    ///
    pub fn from_sequences<S: AsRef<[Activity]> + Sync>(sequences: &[S]) -> Self {
        sequences
            .par_iter()
            .fold(CountModel::default, |mut model, seq| {
                model.count_sequence(seq.as_ref());
                model
            })
            .reduce(CountModel::default, CountModel::merge)
    }

    ///
    /// Count the activities and transitions of a single trace (with sentinels)
    ///
    pub fn from_sequence(sequence: &[Activity]) -> Self {
        let mut model = CountModel::default();
        model.count_sequence(sequence);
        model
    }

    /// Count all traces of an [`EventLog`], classifying events with `classifier`
    pub fn from_log<C: ActivityClassifier + Sync + ?Sized>(log: &EventLog, classifier: &C) -> Self {
        let sequences: Vec<Vec<Activity>> = log
            .traces
            .par_iter()
            .map(|t| with_sentinels(log.trace_activities(t, classifier)))
            .collect();
        Self::from_sequences(&sequences)
    }

    fn count_sequence(&mut self, sequence: &[Activity]) {
        for act in sequence {
            *self.activity_counts.entry(act.clone()).or_default() += 1;
        }
        for pair in sequence.windows(2) {
            *self
                .transition_counts
                .entry((pair[0].clone(), pair[1].clone()))
                .or_default() += 1;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (act, count) in other.activity_counts {
            *self.activity_counts.entry(act).or_default() += count;
        }
        for (transition, count) in other.transition_counts {
            *self.transition_counts.entry(transition).or_default() += count;
        }
        self
    }

    ///
    /// Support model: a copy of this model without any transition `(a,b)` for which the
    /// reverse transition `(b,a)` is also counted
    ///
    /// Self-loops `(a,a)` are their own reverse and are always dropped.
    /// Activity counts are kept as they are.
    ///
    pub fn without_reversed_transitions(&self) -> Self {
        Self {
            activity_counts: self.activity_counts.clone(),
            transition_counts: self
                .transition_counts
                .iter()
                .filter(|((a, b), _)| !self.transition_counts.contains_key(&(b.clone(), a.clone())))
                .map(|(t, c)| (t.clone(), *c))
                .collect(),
        }
    }

    /// Number of occurrences of `activity`
    pub fn activity_count(&self, activity: &str) -> u64 {
        self.activity_counts.get(activity).copied().unwrap_or(0)
    }

    /// Number of times `to` directly follows `from`
    pub fn transition_count(&self, from: &str, to: &str) -> u64 {
        self.transition_counts
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `activity` occurs at least once
    pub fn contains_activity(&self, activity: &str) -> bool {
        self.activity_counts.contains_key(activity)
    }

    /// All counted activities with their counts, ordered by activity
    pub fn activity_counts(&self) -> &BTreeMap<Activity, u64> {
        &self.activity_counts
    }

    /// All counted transitions with their counts, ordered by `(from, to)`
    pub fn transition_counts(&self) -> &BTreeMap<(Activity, Activity), u64> {
        &self.transition_counts
    }

    /// Counted activities, ordered
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activity_counts.keys()
    }
}
