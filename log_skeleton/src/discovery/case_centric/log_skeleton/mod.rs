//! Discovering [`LogSkeleton`]s from Event Data
//!
//! Discovery runs in the following phases:
//!
//! 1. Classify every trace, apply the activity splitters, and drop traces rejected by the
//!    required/forbidden activity filter.
//! 2. Count activities and transitions of the whole log and of every single trace.
//! 3. Mine the same-count classes for every noise level ([`mine_equivalence_classes`]).
//! 4. Mine the causal relations with the configured window ([`mine_causal_relations`]).
use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{
    event_data::case_centric::{
        utils::{
            activity_filter::ActivityFilter,
            event_log_splitter::{apply_splitters, ActivitySplitter},
        },
        ActivityClassifier, EventLog,
    },
    process_models::case_centric::log_skeleton::{
        count_model::with_sentinels, Activity, CausalWindow, CountModel, LogSkeleton,
        OccurrenceBounds, SkeletonMetadata, DEFAULT_LABEL, END_ACTIVITY, START_ACTIVITY,
    },
};

/// Causal dependency mining
pub mod causal;
/// Same-count class mining
pub mod equivalence;

pub use causal::{mine_causal_relations, reduce_indirect_dependencies};
pub use equivalence::mine_equivalence_classes;

/// Options for the discovery of a [`LogSkeleton`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LogSkeletonDiscoveryOptions {
    /// Maximal distance (in positions) of activities considered before/after an occurrence
    ///
    /// `0` means unbounded.
    pub horizon: usize,
    /// Activities at which the before/after scan stops (the boundary activity itself is still included)
    pub boundary_activities: BTreeSet<Activity>,
    /// Only traces containing all of these activities are used
    pub required_activities: BTreeSet<Activity>,
    /// Only traces containing none of these activities are used
    pub forbidden_activities: BTreeSet<Activity>,
    /// Splitters applied to every trace before anything else
    pub splitters: Vec<ActivitySplitter>,
}

/// Discover a [`LogSkeleton`] from an [`EventLog`] using `classifier` to derive the activity names
///
/// The skeleton is labeled with the name of the log (or [`DEFAULT_LABEL`] if the log has no name).
/// Events lacking an attribute the classifier needs take it from the global event attributes of the log.
///
/// If there is no special classifier to be used, the default (`&EventLogClassifier::default()`) can simply be passed in.
///
/// ```
/// use log_skeleton::{
///     core::event_data::case_centric::EventLogClassifier,
///     discovery::case_centric::log_skeleton::{discover_log_skeleton, LogSkeletonDiscoveryOptions},
///     event_log,
/// };
///
/// let log = event_log!(["a", "b", "c"], ["a", "c", "b"]);
/// let skeleton = discover_log_skeleton(
///     &log,
///     &EventLogClassifier::default(),
///     &LogSkeletonDiscoveryOptions::default(),
/// );
/// assert_eq!(skeleton.number_of_traces(), 2);
/// assert_eq!(skeleton.max_count("b"), 1);
/// ```
pub fn discover_log_skeleton<C>(
    event_log: &EventLog,
    classifier: &C,
    options: &LogSkeletonDiscoveryOptions,
) -> LogSkeleton
where
    C: ActivityClassifier + Sync + ?Sized,
{
    let traces: Vec<Vec<Activity>> = event_log
        .traces
        .par_iter()
        .map(|t| event_log.trace_activities(t, classifier))
        .collect();
    let label = event_log
        .name()
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());
    discover_log_skeleton_from_sequences(label, traces, options)
}

///
/// Discover a [`LogSkeleton`] from already classified traces
///
/// The traces must not contain [`START_ACTIVITY`] and [`END_ACTIVITY`]; they are added here.
///
pub fn discover_log_skeleton_from_sequences<S: Into<String>>(
    label: S,
    traces: Vec<Vec<Activity>>,
    options: &LogSkeletonDiscoveryOptions,
) -> LogSkeleton {
    let label = label.into();
    let filter = ActivityFilter::new(&options.required_activities, &options.forbidden_activities);
    let number_of_input_traces = traces.len();
    let sequences: Vec<Vec<Activity>> = traces
        .into_par_iter()
        .map(|t| apply_splitters(t, &options.splitters))
        .filter(|t| filter.accepts(t))
        .map(with_sentinels)
        .collect();
    log::info!(
        "Discovering log skeleton '{}' from {} of {} traces",
        label,
        sequences.len(),
        number_of_input_traces
    );

    let count_model = CountModel::from_sequences(&sequences);
    let support_model = count_model.without_reversed_transitions();
    let trace_models: Vec<CountModel> = sequences
        .par_iter()
        .map(|s| CountModel::from_sequence(s))
        .collect();

    let mut activities: BTreeSet<Activity> = count_model.activities().cloned().collect();
    activities.insert(START_ACTIVITY.to_string());
    activities.insert(END_ACTIVITY.to_string());
    log::info!("Found {} activities (including start and end)", activities.len());

    let bounds = occurrence_bounds(&activities, &trace_models);
    let min_transition_counts = min_transition_counts(&count_model, &trace_models);
    let equivalence = mine_equivalence_classes(&activities, &trace_models);
    let window = CausalWindow::new(options.horizon, options.boundary_activities.clone());
    let causal = mine_causal_relations(&activities, &sequences, window);

    LogSkeleton {
        label,
        activities,
        number_of_traces: sequences.len(),
        count_model,
        support_model,
        bounds,
        min_transition_counts,
        equivalence,
        causal,
        metadata: SkeletonMetadata {
            required_activities: options.required_activities.clone(),
            forbidden_activities: options.forbidden_activities.clone(),
            splitters: options.splitters.clone(),
        },
    }
}

fn occurrence_bounds(
    activities: &BTreeSet<Activity>,
    trace_models: &[CountModel],
) -> BTreeMap<Activity, OccurrenceBounds> {
    activities
        .iter()
        .map(|act| {
            let counts = trace_models.iter().map(|m| m.activity_count(act));
            let bounds = OccurrenceBounds {
                min: counts.clone().min().unwrap_or(0),
                max: counts.max().unwrap_or(0),
            };
            (act.clone(), bounds)
        })
        .collect()
}

fn min_transition_counts(
    count_model: &CountModel,
    trace_models: &[CountModel],
) -> BTreeMap<(Activity, Activity), u64> {
    count_model
        .transition_counts()
        .keys()
        .map(|(from, to)| {
            let min = trace_models
                .iter()
                .map(|m| m.transition_count(from, to))
                .min()
                .unwrap_or(0);
            ((from.clone(), to.clone()), min)
        })
        .collect()
}
