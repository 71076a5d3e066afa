use chrono::{DateTime, FixedOffset};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use super::constants::{ACTIVITY_NAME, LOG_NAME, TRACE_ID_NAME};

///
/// Value of an event, trace or log attribute
///
/// Serialized adjacently tagged, e.g., `{"type": "String", "content": "Pay"}`.
///
/// [`AttributeValue`] implements [`Display`]; [`AttributeValue::None`] is displayed as `"None"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", content = "content")]
pub enum AttributeValue {
    /// Text
    String(String),
    /// Point in time with offset
    Date(DateTime<FixedOffset>),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// UUID
    ID(Uuid),
    /// Missing or unparsable value
    None(),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::ID(id) => write!(f, "{}", id),
            AttributeValue::None() => write!(f, "None"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl AttributeValue {
    /// The text of a [`AttributeValue::String`], `None` for all other variants
    pub fn try_as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Key-value pair attached to an event, a trace or a log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Attribute {
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: AttributeValue,
}

impl Attribute {
    /// Create an attribute
    pub fn new(key: String, value: AttributeValue) -> Self {
        Self { key, value }
    }
}

/// List of [`Attribute`]s (see [`EditableAttributes`] for lookups by key)
pub type Attributes = Vec<Attribute>;

/// Adding and looking up attributes by key
pub trait EditableAttributes {
    /// Append an attribute (existing attributes with the same key are kept)
    fn add_attribute(&mut self, attr: Attribute);
    /// First attribute with the given key (linear search)
    fn get_by_key(&self, key: &str) -> Option<&Attribute>;
    /// Like [`EditableAttributes::get_by_key`], falling back to `global_attrs`
    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: Option<&'a Attributes>,
    ) -> Option<&'a Attribute>;
}

impl EditableAttributes for Attributes {
    fn add_attribute(&mut self, attr: Attribute) {
        self.push(attr);
    }

    fn get_by_key(&self, key: &str) -> Option<&Attribute> {
        self.iter().find(|attr| attr.key == key)
    }

    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: Option<&'a Attributes>,
    ) -> Option<&'a Attribute> {
        self.get_by_key(key)
            .or_else(|| global_attrs.and_then(|global| global.get_by_key(key)))
    }
}

/// Single recorded event, described only by its attributes
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Event {
    /// Event attributes
    pub attributes: Attributes,
}

impl Event {
    /// Event with the given activity as [`ACTIVITY_NAME`] attribute
    pub fn new(activity: String) -> Self {
        Event {
            attributes: vec![Attribute::new(
                ACTIVITY_NAME.to_string(),
                AttributeValue::String(activity),
            )],
        }
    }
}

/// Ordered events of one case together with the case attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct Trace {
    /// Trace-level attributes
    pub attributes: Attributes,
    /// Events in order of occurrence
    pub events: Vec<Event>,
}

impl Trace {
    /// Classify all events of this trace, in order
    ///
    /// Global event attributes of a log are not available here; see [`EventLog::trace_activities`].
    pub fn activities<C: ActivityClassifier + ?Sized>(&self, classifier: &C) -> Vec<String> {
        self.events.iter().map(|e| classifier.classify(e)).collect()
    }
}

///
/// Case-centric event log: a list of [`Trace`]s plus log-level information
///
/// `classifiers`, `global_trace_attrs` and `global_event_attrs` may be omitted in JSON.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct EventLog {
    /// Log-level attributes
    pub attributes: Attributes,
    /// Traces of the log
    pub traces: Vec<Trace>,
    /// Named event classifiers declared by the log
    #[serde(default)]
    pub classifiers: Option<Vec<EventLogClassifier>>,
    /// Default values of trace attributes
    #[serde(default)]
    pub global_trace_attrs: Option<Attributes>,
    /// Default values of event attributes
    #[serde(default)]
    pub global_event_attrs: Option<Attributes>,
}

impl EventLog {
    /// Empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this log (attributes, classifiers, global attributes) without any trace
    pub fn clone_without_traces(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            traces: Vec::new(),
            classifiers: self.classifiers.clone(),
            global_trace_attrs: self.global_trace_attrs.clone(),
            global_event_attrs: self.global_event_attrs.clone(),
        }
    }

    /// Classifier declared by the log under `name`
    pub fn classifier(&self, name: &str) -> Option<&EventLogClassifier> {
        self.classifiers.as_ref()?.iter().find(|c| c.name == name)
    }

    ///
    /// Identifier of the trace at `index`
    ///
    /// Uses the [`TRACE_ID_NAME`] attribute (or its global default), or the index itself if
    /// there is no such attribute.
    pub fn trace_id(&self, index: usize) -> String {
        self.traces
            .get(index)
            .and_then(|t| {
                t.attributes
                    .get_by_key_or_global(TRACE_ID_NAME, self.global_trace_attrs.as_ref())
            })
            .map(|a| a.value.to_string())
            .unwrap_or_else(|| index.to_string())
    }

    ///
    /// Classify all events of `trace`, in order, taking missing event attributes from the
    /// global event attributes of this log
    ///
    pub fn trace_activities<C: ActivityClassifier + ?Sized>(
        &self,
        trace: &Trace,
        classifier: &C,
    ) -> Vec<String> {
        let globals = self.global_event_attrs.as_ref();
        trace
            .events
            .iter()
            .map(|e| classifier.classify_with_globals(e, globals))
            .collect()
    }

    /// Name of the log ([`LOG_NAME`] attribute), if present
    pub fn name(&self) -> Option<String> {
        self.attributes
            .get_by_key(LOG_NAME)
            .map(|a| a.value.to_string())
    }
}

/// Maps an [`Event`] to the activity label it represents
///
/// Implemented for [`EventLogClassifier`] and for any `Fn(&Event) -> String`.
pub trait ActivityClassifier {
    /// Activity label of the event
    fn classify(&self, event: &Event) -> String;

    /// Activity label of the event, with default values for attributes the event lacks
    ///
    /// Closures ignore the defaults.
    fn classify_with_globals(&self, event: &Event, global_attrs: Option<&Attributes>) -> String {
        let _ = global_attrs;
        self.classify(event)
    }
}

impl<F> ActivityClassifier for F
where
    F: Fn(&Event) -> String,
{
    fn classify(&self, event: &Event) -> String {
        self(event)
    }
}

///
/// Classifier labeling events by the values of one or more attributes
///
/// The values of `keys` are joined with [`EventLogClassifier::DELIMITER`]. Missing attributes
/// and non-text values contribute an empty string. The default classifier uses only
/// [`ACTIVITY_NAME`].
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct EventLogClassifier {
    /// Name of the classifier
    pub name: String,
    /// Attribute keys making up the label
    pub keys: Vec<String>,
}

impl Default for EventLogClassifier {
    fn default() -> Self {
        Self {
            name: "Activity".to_string(),
            keys: vec![ACTIVITY_NAME.to_string()],
        }
    }
}

impl EventLogClassifier {
    /// Separator between the values of the classifier keys
    pub const DELIMITER: &'static str = "+";

    /// Label of `event`, taking missing attributes from `global_attrs`
    pub fn class_identity(&self, event: &Event, global_attrs: Option<&Attributes>) -> String {
        self.keys
            .iter()
            .map(|k| {
                event
                    .attributes
                    .get_by_key_or_global(k, global_attrs)
                    .and_then(|a| a.value.try_as_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(Self::DELIMITER)
    }
}

impl ActivityClassifier for EventLogClassifier {
    fn classify(&self, event: &Event) -> String {
        self.class_identity(event, None)
    }

    fn classify_with_globals(&self, event: &Event, global_attrs: Option<&Attributes>) -> String {
        self.class_identity(event, global_attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log;

    #[test]
    fn class_identity_joins_keys() {
        let mut ev = Event::new("Pay".to_string());
        ev.attributes
            .add_attribute(Attribute::new("org:resource".into(), "Ann".into()));
        let classifier = EventLogClassifier {
            name: "Activity and resource".into(),
            keys: vec![ACTIVITY_NAME.into(), "org:resource".into(), "missing".into()],
        };
        assert_eq!(classifier.classify(&ev), "Pay+Ann+");
        assert_eq!(EventLogClassifier::default().classify(&ev), "Pay");

        let globals = vec![Attribute::new("missing".into(), "default".into())];
        assert_eq!(
            classifier.class_identity(&ev, Some(&globals)),
            "Pay+Ann+default"
        );
    }

    #[test]
    fn closures_are_classifiers() {
        let upper = |e: &Event| EventLogClassifier::default().classify(e).to_uppercase();
        let trace = crate::trace!("a", "b");
        assert_eq!(trace.activities(&upper), vec!["A", "B"]);
    }

    #[test]
    fn trace_ids_fall_back_to_index() {
        let mut log = event_log!(["a"], ["b"] {"concept:name" => "case-7"});
        assert_eq!(log.trace_id(0), "0");
        assert_eq!(log.trace_id(1), "case-7");
        assert_eq!(log.trace_id(5), "5");
        log.traces[0].attributes.clear();
        assert_eq!(log.trace_id(0), "0");
        log.global_trace_attrs = Some(vec![Attribute::new(TRACE_ID_NAME.into(), "unknown".into())]);
        assert_eq!(log.trace_id(0), "unknown");
        assert_eq!(log.name(), None);
    }

    #[test]
    fn log_classification_uses_global_event_attributes() {
        let mut log = event_log!(["a", "b"; {"org:resource" => "Ann"}]);
        log.global_event_attrs = Some(vec![Attribute::new("org:resource".into(), "system".into())]);
        let classifier = EventLogClassifier {
            name: "Activity and resource".into(),
            keys: vec![ACTIVITY_NAME.into(), "org:resource".into()],
        };
        assert_eq!(
            log.trace_activities(&log.traces[0], &classifier),
            vec!["a+system", "b+Ann"]
        );
        assert_eq!(log.traces[0].activities(&classifier), vec!["a+", "b+Ann"]);
        let plain = |e: &Event| EventLogClassifier::default().classify(e);
        assert_eq!(log.trace_activities(&log.traces[0], &plain), vec!["a", "b"]);
    }

    #[test]
    fn named_classifiers() {
        let mut log = EventLog::new();
        assert!(log.classifier("Activity").is_none());
        log.classifiers = Some(vec![EventLogClassifier::default()]);
        assert_eq!(log.classifier("Activity"), Some(&EventLogClassifier::default()));
    }
}
