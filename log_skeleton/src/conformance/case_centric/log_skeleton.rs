//! Checking Traces against [`LogSkeleton`]s
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    ops::ControlFlow,
};

use itertools::Itertools;
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{
    event_data::case_centric::{
        utils::event_log_splitter::apply_splitters, ActivityClassifier, EventLog, Trace,
    },
    process_models::case_centric::log_skeleton::{
        count_model::with_sentinels, Activity, CountModel, LogSkeleton,
    },
};

/// Kind of relation a [`Violation`] violates
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ViolationKind {
    /// An activity or transition occurs too often or too rarely
    Cardinality,
    /// Activities of one same-count class occur a different number of times
    Equivalence,
    /// An activity always occurring before another one is missing before it
    Precedence,
    /// An activity always occurring after another one is missing after it
    Response,
    /// An activity that never occurs before another one occurs before it
    NotPrecedence,
    /// An activity that never occurs after another one occurs after it
    NotResponse,
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViolationKind::Cardinality => "Cardinality",
            ViolationKind::Equivalence => "Equivalence",
            ViolationKind::Precedence => "Precedence",
            ViolationKind::Response => "Response",
            ViolationKind::NotPrecedence => "Not Precedence",
            ViolationKind::NotResponse => "Not Response",
        };
        write!(f, "{name}")
    }
}

/// A violation of a [`LogSkeleton`] by a trace
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Violation {
    /// Identifier of the violating trace
    pub trace_id: String,
    /// Violated relation
    pub kind: ViolationKind,
    /// Activities involved in the violation
    pub activities: BTreeSet<Activity>,
    /// Human-readable description
    pub explanation: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.trace_id, self.kind, self.explanation)
    }
}

/// Group of checks that can be enabled in a [`CheckConfig`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum CheckKind {
    /// Occurrence bounds of activities and minimal transition counts
    Cardinality,
    /// Precedence, response, not precedence and not response
    CausalDependency,
    /// Equal counts within same-count classes
    SameCount,
}

/// All [`CheckKind`]s
pub const ALL_CHECK_KINDS: [CheckKind; 3] = [
    CheckKind::Cardinality,
    CheckKind::CausalDependency,
    CheckKind::SameCount,
];

/// Configuration of a conformance check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CheckConfig {
    /// Enabled checks
    pub checks: BTreeSet<CheckKind>,
    /// Stop checking a trace once a violation was found
    pub stop_at_first_violation: bool,
    /// Noise level of the same-count classes used by [`CheckKind::SameCount`]
    ///
    /// Only level `0` guarantees that every trace of the discovery log conforms.
    pub noise_level: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            checks: ALL_CHECK_KINDS.into_iter().collect(),
            stop_at_first_violation: false,
            noise_level: 0,
        }
    }
}

impl CheckConfig {
    /// Only run the given checks
    pub fn with_checks<I: IntoIterator<Item = CheckKind>>(checks: I) -> Self {
        Self {
            checks: checks.into_iter().collect(),
            ..Default::default()
        }
    }

    fn is_enabled(&self, kind: CheckKind) -> bool {
        self.checks.contains(&kind)
    }
}

fn listing<'a, I: IntoIterator<Item = &'a str>>(activities: I) -> String {
    activities.into_iter().join(", ")
}

struct ViolationCollector<'a> {
    trace_id: &'a str,
    stop_at_first_violation: bool,
    violations: BTreeSet<Violation>,
}

impl ViolationCollector<'_> {
    fn report(
        &mut self,
        kind: ViolationKind,
        activities: BTreeSet<Activity>,
        explanation: String,
    ) -> ControlFlow<()> {
        self.violations.insert(Violation {
            trace_id: self.trace_id.to_string(),
            kind,
            activities,
            explanation,
        });
        if self.stop_at_first_violation {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn check_same_count(
    trace_model: &CountModel,
    skeleton: &LogSkeleton,
    noise_level: usize,
    collector: &mut ViolationCollector<'_>,
) -> ControlFlow<()> {
    for class in skeleton.equivalence_classes().at_noise_level(noise_level) {
        let counts: Vec<(&Activity, u64)> = class
            .iter()
            .map(|a| (a, trace_model.activity_count(a)))
            .collect();
        if counts.iter().map(|(_, c)| c).all_equal() {
            continue;
        }
        let explanation = format!(
            "Activities should occur equally often, but occur {}",
            counts
                .iter()
                .map(|(a, c)| format!("{a} {c} times"))
                .join(", ")
        );
        collector.report(ViolationKind::Equivalence, class.clone(), explanation)?;
    }
    ControlFlow::Continue(())
}

fn check_causal_dependencies(
    sequence: &[Activity],
    skeleton: &LogSkeleton,
    collector: &mut ViolationCollector<'_>,
) -> ControlFlow<()> {
    let causal = skeleton.causal_relations();
    let window = causal.window();
    for (position, act) in sequence.iter().enumerate() {
        if !skeleton.contains_activity(act) {
            continue;
        }
        let preset = window.preset(sequence, position);
        let postset = window.postset(sequence, position);

        let missing_before: BTreeSet<Activity> = causal
            .all_pre(act)
            .into_iter()
            .flatten()
            .filter(|b| !preset.contains(b.as_str()))
            .cloned()
            .collect();
        if !missing_before.is_empty() {
            let explanation = format!(
                "{act} should be preceded by {}",
                listing(missing_before.iter().map(String::as_str))
            );
            collector.report(ViolationKind::Precedence, missing_before, explanation)?;
        }

        let missing_after: BTreeSet<Activity> = causal
            .all_post(act)
            .into_iter()
            .flatten()
            .filter(|b| !postset.contains(b.as_str()))
            .cloned()
            .collect();
        if !missing_after.is_empty() {
            let explanation = format!(
                "{act} should be followed by {}",
                listing(missing_after.iter().map(String::as_str))
            );
            collector.report(ViolationKind::Response, missing_after, explanation)?;
        }

        let unexpected = |set: &BTreeSet<&str>, allowed: Option<&BTreeSet<Activity>>| {
            set.iter()
                .filter(|b| skeleton.contains_activity(b))
                .filter(|b| !allowed.is_some_and(|allowed| allowed.contains(**b)))
                .map(|b| b.to_string())
                .collect::<BTreeSet<Activity>>()
        };

        let unexpected_before = unexpected(&preset, causal.any_pre(act));
        if !unexpected_before.is_empty() {
            let explanation = format!(
                "{act} should not be preceded by {}",
                listing(unexpected_before.iter().map(String::as_str))
            );
            collector.report(ViolationKind::NotPrecedence, unexpected_before, explanation)?;
        }

        let unexpected_after = unexpected(&postset, causal.any_post(act));
        if !unexpected_after.is_empty() {
            let explanation = format!(
                "{act} should not be followed by {}",
                listing(unexpected_after.iter().map(String::as_str))
            );
            collector.report(ViolationKind::NotResponse, unexpected_after, explanation)?;
        }
    }
    ControlFlow::Continue(())
}

fn check_cardinality(
    trace_model: &CountModel,
    skeleton: &LogSkeleton,
    collector: &mut ViolationCollector<'_>,
) -> ControlFlow<()> {
    for act in skeleton.activities() {
        let count = trace_model.activity_count(act);
        let bounds = skeleton.bounds(act);
        if count < bounds.min || count > bounds.max {
            let explanation = format!(
                "{act} occurs {count} times, but should occur between {} and {} times",
                bounds.min, bounds.max
            );
            collector.report(
                ViolationKind::Cardinality,
                BTreeSet::from([act.clone()]),
                explanation,
            )?;
        }
    }
    for ((from, to), min) in &skeleton.min_transition_counts {
        let count = trace_model.transition_count(from, to);
        if count < *min {
            let explanation = format!(
                "{to} directly follows {from} {count} times, but should at least {min} times"
            );
            collector.report(
                ViolationKind::Cardinality,
                BTreeSet::from([from.clone(), to.clone()]),
                explanation,
            )?;
        }
    }
    ControlFlow::Continue(())
}

///
/// Check a classified trace against a [`LogSkeleton`]
///
/// `sequence` must start with the start activity and end with the end activity
/// (see [`with_sentinels`]) and `trace_model` must be the [`CountModel`] of `sequence`.
/// Activities unknown to the skeleton are not constrained.
///
/// Checks run in the order same-count, causal dependencies, cardinality.
/// The trace conforms if the returned set is empty.
///
pub fn check_trace(
    trace_id: &str,
    sequence: &[Activity],
    trace_model: &CountModel,
    skeleton: &LogSkeleton,
    config: &CheckConfig,
) -> BTreeSet<Violation> {
    let mut collector = ViolationCollector {
        trace_id,
        stop_at_first_violation: config.stop_at_first_violation,
        violations: BTreeSet::new(),
    };
    let _ = run_checks(sequence, trace_model, skeleton, config, &mut collector);
    collector.violations
}

fn run_checks(
    sequence: &[Activity],
    trace_model: &CountModel,
    skeleton: &LogSkeleton,
    config: &CheckConfig,
    collector: &mut ViolationCollector<'_>,
) -> ControlFlow<()> {
    if config.is_enabled(CheckKind::SameCount) {
        check_same_count(trace_model, skeleton, config.noise_level, collector)?;
    }
    if config.is_enabled(CheckKind::CausalDependency) {
        check_causal_dependencies(sequence, skeleton, collector)?;
    }
    if config.is_enabled(CheckKind::Cardinality) {
        check_cardinality(trace_model, skeleton, collector)?;
    }
    ControlFlow::Continue(())
}

///
/// Check already classified activities (without start and end activity) against a [`LogSkeleton`]
///
/// The splitters the skeleton was discovered with are applied before checking.
///
pub fn check_activities(
    trace_id: &str,
    activities: Vec<Activity>,
    skeleton: &LogSkeleton,
    config: &CheckConfig,
) -> BTreeSet<Violation> {
    let sequence = with_sentinels(apply_splitters(activities, &skeleton.metadata().splitters));
    let trace_model = CountModel::from_sequence(&sequence);
    check_trace(trace_id, &sequence, &trace_model, skeleton, config)
}

///
/// Check a single [`Trace`] against a [`LogSkeleton`]
///
/// The trace is classified with `classifier` on its own; global event attributes of a log are
/// only taken into account by [`classify_event_log`].
///
pub fn check_event_log_trace<C>(
    trace_id: &str,
    trace: &Trace,
    classifier: &C,
    skeleton: &LogSkeleton,
    config: &CheckConfig,
) -> BTreeSet<Violation>
where
    C: ActivityClassifier + ?Sized,
{
    check_activities(trace_id, trace.activities(classifier), skeleton, config)
}

/// Result of [`classify_event_log`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogClassification {
    /// Traces without violations
    pub conforming: EventLog,
    /// Traces with at least one violation
    pub non_conforming: EventLog,
    /// Violations of all non-conforming traces, by index of the trace in the checked log
    pub violations: BTreeMap<usize, BTreeSet<Violation>>,
}

impl LogClassification {
    /// Number of conforming traces
    pub fn number_of_conforming(&self) -> usize {
        self.conforming.traces.len()
    }

    /// Number of non-conforming traces
    pub fn number_of_non_conforming(&self) -> usize {
        self.non_conforming.traces.len()
    }
}

///
/// Check all traces of an [`EventLog`] against a [`LogSkeleton`] and split the log accordingly
///
/// Traces are checked in parallel. Both sub-logs keep the attributes of `event_log` and the
/// relative order of their traces. Violations name traces by [`EventLog::trace_id`].
///
pub fn classify_event_log<C>(
    event_log: &EventLog,
    classifier: &C,
    skeleton: &LogSkeleton,
    config: &CheckConfig,
) -> LogClassification
where
    C: ActivityClassifier + Sync + ?Sized,
{
    log::info!(
        "Checking {} traces against log skeleton '{}'",
        event_log.traces.len(),
        skeleton.label()
    );
    let results: Vec<BTreeSet<Violation>> = event_log
        .traces
        .par_iter()
        .enumerate()
        .map(|(index, trace)| {
            let trace_id = event_log.trace_id(index);
            let activities = event_log.trace_activities(trace, classifier);
            let violations = check_activities(&trace_id, activities, skeleton, config);
            log::debug!("Trace {}: {} violations", trace_id, violations.len());
            violations
        })
        .collect();

    let mut classification = LogClassification {
        conforming: event_log.clone_without_traces(),
        non_conforming: event_log.clone_without_traces(),
        violations: BTreeMap::new(),
    };
    for (index, (trace, violations)) in event_log.traces.iter().zip(results).enumerate() {
        if violations.is_empty() {
            classification.conforming.traces.push(trace.clone());
        } else {
            classification.non_conforming.traces.push(trace.clone());
            classification.violations.insert(index, violations);
        }
    }
    log::info!(
        "{} traces conform, {} do not",
        classification.number_of_conforming(),
        classification.number_of_non_conforming()
    );
    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_data::case_centric::{
        utils::event_log_splitter::ActivitySplitter, EventLogClassifier,
    };
    use crate::core::process_models::case_centric::log_skeleton::END_ACTIVITY;
    use crate::discovery::case_centric::log_skeleton::{
        discover_log_skeleton, LogSkeletonDiscoveryOptions,
    };
    use crate::event_log;

    fn set(acts: &[&str]) -> BTreeSet<Activity> {
        acts.iter().map(|a| a.to_string()).collect()
    }

    fn discover(log: &EventLog, options: &LogSkeletonDiscoveryOptions) -> LogSkeleton {
        discover_log_skeleton(log, &EventLogClassifier::default(), options)
    }

    fn classify(log: &EventLog, skeleton: &LogSkeleton, config: &CheckConfig) -> LogClassification {
        classify_event_log(log, &EventLogClassifier::default(), skeleton, config)
    }

    fn abc_skeleton() -> LogSkeleton {
        let log = event_log!(["A", "B", "C"], ["A", "B", "C"], ["A", "C", "B"]);
        discover(&log, &LogSkeletonDiscoveryOptions::default())
    }

    #[test]
    fn every_discovery_trace_conforms() {
        let log = event_log!(
            ["a", "b", "c", "d"],
            ["a", "c", "b", "d"],
            ["a", "b", "b", "x", "d"],
            ["a", "d"],
            ["e"],
            [],
            ["x", "a", "x", "c", "c"]
        );
        let windows = [
            LogSkeletonDiscoveryOptions::default(),
            LogSkeletonDiscoveryOptions {
                horizon: 2,
                ..Default::default()
            },
            LogSkeletonDiscoveryOptions {
                boundary_activities: set(&["x"]),
                splitters: vec![ActivitySplitter::new("c", "c")],
                ..Default::default()
            },
        ];
        for options in &windows {
            let skeleton = discover(&log, options);
            let classification = classify(&log, &skeleton, &CheckConfig::default());
            assert_eq!(classification.violations, BTreeMap::new());
            assert_eq!(classification.number_of_conforming(), log.traces.len());
            assert_eq!(classification.conforming, log);
        }
    }

    #[test]
    fn abc_conforms_and_a_does_not() {
        let skeleton = abc_skeleton();
        let log = event_log!(["A", "B", "C"], ["A"]);
        let classification = classify(&log, &skeleton, &CheckConfig::default());
        assert_eq!(classification.number_of_conforming(), 1);
        assert_eq!(classification.number_of_non_conforming(), 1);

        let violations = &classification.violations[&1];
        assert!(violations.iter().all(|v| v.trace_id == "1"));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::Response && v.activities == set(&["B", "C"])));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::Precedence && v.explanation.starts_with(END_ACTIVITY)));
        assert!(violations.iter().any(|v| v.kind == ViolationKind::Equivalence));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::Cardinality && v.activities == set(&["B"])));
    }

    #[test]
    fn enabled_checks_only() {
        let skeleton = abc_skeleton();
        let log = event_log!(["A"]);
        let config = CheckConfig::with_checks([CheckKind::CausalDependency]);
        let violations = &classify(&log, &skeleton, &config).violations[&0];
        assert!(!violations.is_empty());
        assert!(violations
            .iter()
            .all(|v| matches!(v.kind, ViolationKind::Precedence | ViolationKind::Response)));
    }

    #[test]
    fn stop_at_first_violation() {
        let skeleton = abc_skeleton();
        let log = event_log!(["A"]);
        let config = CheckConfig {
            stop_at_first_violation: true,
            ..Default::default()
        };
        let violations = &classify(&log, &skeleton, &config).violations[&0];
        assert_eq!(violations.len(), 1);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::Equivalence));
    }

    #[test]
    fn reversed_order_violates_negative_relations() {
        let skeleton = discover(&event_log!(["a", "b"], ["a", "b"]), &Default::default());
        let log = event_log!(["b", "a"]);
        let violations = &classify(&log, &skeleton, &CheckConfig::default()).violations[&0];
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::NotResponse && v.activities == set(&["a"])));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::NotPrecedence && v.activities == set(&["b"])));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::Precedence && v.activities == set(&["a"])));
    }

    #[test]
    fn unknown_activities_are_not_constrained() {
        let skeleton = discover(&event_log!(["a", "b"]), &Default::default());
        let log = event_log!(["a", "z", "b"]);
        let config = CheckConfig::with_checks([CheckKind::CausalDependency, CheckKind::SameCount]);
        let classification = classify(&log, &skeleton, &config);
        assert_eq!(classification.number_of_conforming(), 1);
    }

    #[test]
    fn enabled_checks_serialize_in_order() {
        let config = CheckConfig::with_checks([
            CheckKind::SameCount,
            CheckKind::Cardinality,
            CheckKind::CausalDependency,
        ]);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json["checks"],
            serde_json::json!(["Cardinality", "CausalDependency", "SameCount"])
        );
        let restored: CheckConfig = serde_json::from_value(json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn global_event_attributes_are_used_when_checking() {
        let classifier = EventLogClassifier {
            name: "Activity and resource".into(),
            keys: vec!["concept:name".into(), "org:resource".into()],
        };
        let mut log = event_log!(["a", "b"; {"org:resource" => "Ann"}]);
        log.global_event_attrs = Some(crate::attributes!("org:resource" => "system"));
        let skeleton = discover_log_skeleton(&log, &classifier, &Default::default());
        let config = CheckConfig::default();
        let classification = classify_event_log(&log, &classifier, &skeleton, &config);
        assert_eq!(classification.number_of_conforming(), 1);

        // on its own, the trace has no access to the global resource
        let single = check_event_log_trace("0", &log.traces[0], &classifier, &skeleton, &config);
        assert!(!single.is_empty());
        let labels = vec!["a+system".to_string(), "b+Ann".to_string()];
        assert!(check_activities("0", labels, &skeleton, &config).is_empty());
    }

    #[test]
    fn trace_ids_from_attributes() {
        let skeleton = abc_skeleton();
        let sequence = with_sentinels(["A".to_string()]);
        let model = CountModel::from_sequence(&sequence);
        let violations = check_trace("case-7", &sequence, &model, &skeleton, &CheckConfig::default());
        assert!(violations.iter().all(|v| v.trace_id == "case-7"));
        assert!(violations
            .iter()
            .next()
            .is_some_and(|v| v.to_string().starts_with("[case-7] ")));
    }
}
