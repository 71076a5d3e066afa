//! Log Skeletons
//!
//! A log skeleton is a compact behavioral model of an event log. It records
//!
//! * which activities always occur equally often in a trace ([`EquivalenceClasses`]),
//! * which activities always/sometimes occur before or after an activity ([`CausalRelations`]),
//! * which activities never occur together (derived from [`CausalRelations`]),
//! * how often activities and transitions occur per trace ([`CountModel`], [`OccurrenceBounds`]).
//!
//! Log skeletons are discovered with
//! [`discover_log_skeleton`](crate::discovery::case_centric::log_skeleton::discover_log_skeleton)
//! and traces are checked against them with
//! [`check_trace`](crate::conformance::case_centric::log_skeleton::check_trace).
use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::core::event_data::case_centric::utils::event_log_splitter::ActivitySplitter;

/// Activity and transition counts
pub mod count_model;
/// Causal (precedence/response) relations and the windows they are mined with
pub mod causal_relations;
/// Same-count classes per noise level
pub mod equivalence_classes;
/// JSON and CSV export of log skeletons
pub mod io;

#[doc(inline)]
pub use causal_relations::{CausalRelations, CausalWindow};
#[doc(inline)]
pub use count_model::CountModel;
#[doc(inline)]
pub use equivalence_classes::{EquivalenceClasses, MAX_NOISE_LEVEL};

/// Activity label (after classification)
pub type Activity = String;

/// Artificial activity prepended to every trace
pub const START_ACTIVITY: &str = "__START";
/// Artificial activity appended to every trace
pub const END_ACTIVITY: &str = "__END";

/// Label of a log skeleton discovered from an event log without name
pub const DEFAULT_LABEL: &str = "<no label>";

/// Whether `activity` is [`START_ACTIVITY`] or [`END_ACTIVITY`]
pub fn is_artificial(activity: &str) -> bool {
    activity == START_ACTIVITY || activity == END_ACTIVITY
}

/// Minimal and maximal number of occurrences of an activity in a single trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OccurrenceBounds {
    /// Fewest occurrences in any trace
    pub min: u64,
    /// Most occurrences in any trace
    pub max: u64,
}

/// Information about how the skeleton was discovered, used for presentation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkeletonMetadata {
    /// Only traces containing all of these activities were used
    pub required_activities: BTreeSet<Activity>,
    /// Only traces containing none of these activities were used
    pub forbidden_activities: BTreeSet<Activity>,
    /// Splitters applied to the traces before discovery
    pub splitters: Vec<ActivitySplitter>,
}

/// Thresholds for querying relations of a [`LogSkeleton`]
///
/// All thresholds are percentages in `0..=100` (larger values are clamped to `100`).
/// `100` requires a relation to hold for every observed occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryConfig {
    /// Share of occurrences of `a` that must be preceded by `b` for a precedence
    pub precedence_threshold: u8,
    /// Share of occurrences of `a` that must be followed by `b` for a response
    pub response_threshold: u8,
    /// Share of occurrences of `a` that must not co-occur with `b` for a not co-existence
    pub not_co_existence_threshold: u8,
    /// Equivalence threshold; `100 - equivalence_threshold` is the noise level (at most [`MAX_NOISE_LEVEL`])
    pub equivalence_threshold: u8,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            precedence_threshold: 100,
            response_threshold: 100,
            not_co_existence_threshold: 100,
            equivalence_threshold: 100,
        }
    }
}

impl QueryConfig {
    /// Noise level of the equivalence classes to use
    pub fn noise_level(&self) -> usize {
        usize::from(100 - self.equivalence_threshold.min(100)).min(MAX_NOISE_LEVEL)
    }
}

fn meets_threshold(support: u64, total: u64, threshold: u8) -> bool {
    total > 0 && support > 0 && 100 * support >= u64::from(threshold.min(100)) * total
}

/// A discovered log skeleton
///
/// Constructed by [`discover_log_skeleton`](crate::discovery::case_centric::log_skeleton::discover_log_skeleton);
/// read-only afterwards. Thresholds are not part of the skeleton but passed to every query
/// as a [`QueryConfig`].
///
/// Queries involving an activity that is unknown to the skeleton return `false` (no relation).
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSkeleton {
    pub(crate) label: String,
    pub(crate) activities: BTreeSet<Activity>,
    pub(crate) number_of_traces: usize,
    pub(crate) count_model: CountModel,
    pub(crate) support_model: CountModel,
    pub(crate) bounds: BTreeMap<Activity, OccurrenceBounds>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub(crate) min_transition_counts: BTreeMap<(Activity, Activity), u64>,
    pub(crate) equivalence: EquivalenceClasses,
    pub(crate) causal: CausalRelations,
    pub(crate) metadata: SkeletonMetadata,
}

impl LogSkeleton {
    /// Label (usually the name of the event log)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All known activities (including [`START_ACTIVITY`] and [`END_ACTIVITY`]), ordered
    pub fn activities(&self) -> &BTreeSet<Activity> {
        &self.activities
    }

    /// Whether the skeleton knows `activity`
    pub fn contains_activity(&self, activity: &str) -> bool {
        self.activities.contains(activity)
    }

    /// Number of traces the skeleton was discovered from
    pub fn number_of_traces(&self) -> usize {
        self.number_of_traces
    }

    /// Counts over all traces
    pub fn count_model(&self) -> &CountModel {
        &self.count_model
    }

    /// Counts without mutually reversed transitions; base of all threshold queries
    pub fn support_model(&self) -> &CountModel {
        &self.support_model
    }

    /// Same-count classes at all noise levels
    pub fn equivalence_classes(&self) -> &EquivalenceClasses {
        &self.equivalence
    }

    /// Mined causal relations
    pub fn causal_relations(&self) -> &CausalRelations {
        &self.causal
    }

    /// Discovery metadata (required/forbidden activities, splitters)
    pub fn metadata(&self) -> &SkeletonMetadata {
        &self.metadata
    }

    /// Per-trace occurrence bounds of `activity` (`0..0` if unknown)
    pub fn bounds(&self, activity: &str) -> OccurrenceBounds {
        self.bounds.get(activity).copied().unwrap_or_default()
    }

    /// Fewest occurrences of `activity` in any trace
    pub fn min_count(&self, activity: &str) -> u64 {
        self.bounds(activity).min
    }

    /// Most occurrences of `activity` in any trace
    pub fn max_count(&self, activity: &str) -> u64 {
        self.bounds(activity).max
    }

    /// Fewest occurrences of transition `(from, to)` in any trace
    pub fn min_transition_count(&self, from: &str, to: &str) -> u64 {
        self.min_transition_counts
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn knows_both(&self, a: &str, b: &str) -> bool {
        self.contains_activity(a) && self.contains_activity(b)
    }

    ///
    /// Precedence: `b` occurs (in the filtered preset) before the occurrences of `a`
    ///
    /// Holds if at least `precedence_threshold` percent of the occurrences of `a` are preceded by `b`.
    ///
    pub fn has_precedence(&self, a: &str, b: &str, config: &QueryConfig) -> bool {
        self.knows_both(a, b)
            && meets_threshold(
                self.causal.pre_support(a, b),
                self.support_model.activity_count(a),
                config.precedence_threshold,
            )
    }

    ///
    /// Response: `b` occurs (in the filtered postset) after the occurrences of `a`
    ///
    /// Holds if at least `response_threshold` percent of the occurrences of `a` are followed by `b`.
    ///
    pub fn has_response(&self, a: &str, b: &str, config: &QueryConfig) -> bool {
        self.knows_both(a, b)
            && meets_threshold(
                self.causal.post_support(a, b),
                self.support_model.activity_count(a),
                config.response_threshold,
            )
    }

    ///
    /// Not co-existence: `b` does not occur (in the filtered preset or postset) around `a`
    ///
    /// Holds if at least `not_co_existence_threshold` percent of the occurrences of `a` have no `b` around them.
    ///
    pub fn has_not_co_existence(&self, a: &str, b: &str, config: &QueryConfig) -> bool {
        if a == b || !self.knows_both(a, b) {
            return false;
        }
        let total = self.support_model.activity_count(a);
        let threshold = u64::from(config.not_co_existence_threshold.min(100));
        total > 0 && 100 * self.causal.co_support(a, b) <= (100 - threshold) * total
    }

    /// Whether `relation(a, b)` follows from the same relation on the representative of `a` or `b`
    fn implied_by_representative<F>(&self, a: &str, b: &str, config: &QueryConfig, relation: F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        let noise_level = config.noise_level();
        let rep_a = self.equivalence.representative(a, noise_level);
        let rep_b = self.equivalence.representative(b, noise_level);
        rep_a.is_some_and(|r| r != a && relation(r.as_str(), b))
            || rep_b.is_some_and(|r| r != b && relation(a, r.as_str()))
    }

    /// Whether `relation(a, b)` follows from `relation(a, c)` and `relation(c, b)` for some `c`
    /// outside the equivalence classes of `a` and `b`
    fn implied_by_chain<F>(&self, a: &str, b: &str, config: &QueryConfig, relation: F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        let noise_level = config.noise_level();
        let class_a = self.equivalence.class_of(a, noise_level);
        let class_b = self.equivalence.class_of(b, noise_level);
        let outside = |c: &str| {
            c != a
                && c != b
                && !class_a.is_some_and(|class| class.contains(c))
                && !class_b.is_some_and(|class| class.contains(c))
        };
        self.activities
            .iter()
            .filter(|c| outside(c.as_str()))
            .any(|c| relation(a, c.as_str()) && relation(c.as_str(), b))
    }

    ///
    /// Precedence that is neither implied by the precedence of an equivalence class
    /// representative nor by a chain of precedences through an activity of another class
    ///
    pub fn has_non_redundant_precedence(&self, a: &str, b: &str, config: &QueryConfig) -> bool {
        let relation = |x: &str, y: &str| self.has_precedence(x, y, config);
        relation(a, b)
            && !self.implied_by_representative(a, b, config, relation)
            && !self.implied_by_chain(a, b, config, relation)
    }

    ///
    /// Response that is neither implied by the response of an equivalence class
    /// representative nor by a chain of responses through an activity of another class
    ///
    pub fn has_non_redundant_response(&self, a: &str, b: &str, config: &QueryConfig) -> bool {
        let relation = |x: &str, y: &str| self.has_response(x, y, config);
        relation(a, b)
            && !self.implied_by_representative(a, b, config, relation)
            && !self.implied_by_chain(a, b, config, relation)
    }

    ///
    /// Not co-existence that is not implied by the not co-existence of an equivalence class representative
    ///
    pub fn has_non_redundant_not_co_existence(
        &self,
        a: &str,
        b: &str,
        config: &QueryConfig,
    ) -> bool {
        let relation = |x: &str, y: &str| self.has_not_co_existence(x, y, config);
        relation(a, b) && !self.implied_by_representative(a, b, config, relation)
    }

    ///
    /// Textual legend describing how the skeleton was discovered and which thresholds are applied
    ///
    pub fn legend(&self, config: &QueryConfig) -> String {
        fn listing<'a, I: IntoIterator<Item = &'a String>>(items: I) -> String {
            let joined = items.into_iter().join(", ");
            if joined.is_empty() {
                "none".to_string()
            } else {
                joined
            }
        }
        let window = self.causal.window();
        let horizon = if window.horizon == 0 {
            "unbounded".to_string()
        } else {
            window.horizon.to_string()
        };
        [
            format!("Label: {}", self.label),
            format!("Traces: {}", self.number_of_traces),
            format!(
                "Required activities: {}",
                listing(&self.metadata.required_activities)
            ),
            format!(
                "Forbidden activities: {}",
                listing(&self.metadata.forbidden_activities)
            ),
            format!(
                "Splitters: {}",
                if self.metadata.splitters.is_empty() {
                    "none".to_string()
                } else {
                    self.metadata.splitters.iter().join(", ")
                }
            ),
            format!("Horizon: {}", horizon),
            format!(
                "Boundary activities: {}",
                listing(&window.boundary_activities)
            ),
            format!(
                "Thresholds: precedence {}%, response {}%, not co-existence {}%, equivalence {}% (noise level {})",
                config.precedence_threshold.min(100),
                config.response_threshold.min(100),
                config.not_co_existence_threshold.min(100),
                config.equivalence_threshold.min(100),
                config.noise_level()
            ),
        ]
        .join("\n")
    }
}
