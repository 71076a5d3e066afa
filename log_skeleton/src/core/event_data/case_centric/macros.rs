//! Declarative construction of event data, mostly for tests and documentation
//!
//! ```rust
//! use log_skeleton::event_log;
//!
//! let log = event_log!(
//!     {"concept:name" => "Orders"};
//!     ["place", "pay", "ship"] {"concept:name" => "order-1"},
//!     ["place", "cancel"; {"org:resource" => "Kim"}],
//!     [],
//! );
//! assert_eq!(log.traces.len(), 3);
//! assert_eq!(log.name().as_deref(), Some("Orders"));
//! assert_eq!(log.trace_id(0), "order-1");
//! assert_eq!(log.trace_id(1), "1");
//! ```

/// `key => value` as [`Attribute`](crate::core::event_data::case_centric::Attribute)
///
/// The value may be anything convertible into an
/// [`AttributeValue`](crate::core::event_data::case_centric::AttributeValue).
#[macro_export]
macro_rules! attribute {
    ($key:expr => $val:expr) => {
        $crate::core::event_data::case_centric::Attribute::new(
            ::std::string::String::from($key),
            $crate::core::event_data::case_centric::AttributeValue::from($val),
        )
    };
}

/// Comma-separated `key => value` pairs as [`Attributes`](crate::core::event_data::case_centric::Attributes)
#[macro_export]
macro_rules! attributes {
    ($($key:expr => $value:expr),* $(,)?) => {
        ::std::vec![$($crate::attribute!($key => $value)),*]
    };
}

/// Event with an activity and, after a semicolon, optional further attributes in braces
///
/// `event!("pay")` or `event!("pay"; {"cost" => 12.5})`
#[macro_export]
macro_rules! event {
    ($activity:expr $(; { $($key:expr => $value:expr),* $(,)? })?) => {
        $crate::core::event_data::case_centric::Event {
            attributes: $crate::attributes!(
                $crate::core::event_data::case_centric::constants::ACTIVITY_NAME => $activity
                $($(, $key => $value)*)?
            ),
        }
    };
}

/// Trace of events in [`event!`](crate::event) syntax, optionally preceded by trace attributes
///
/// `trace!("a", "b")` or `trace!({"concept:name" => "case-1"}; "a", "b"; {"cost" => 10.0})`
#[macro_export]
macro_rules! trace {
    (
        { $($key:expr => $value:expr),* $(,)? };
        $($activity:expr $(; { $($ekey:expr => $evalue:expr),* $(,)? })?),* $(,)?
    ) => {
        $crate::core::event_data::case_centric::Trace {
            attributes: $crate::attributes!($($key => $value),*),
            events: ::std::vec![
                $($crate::event!($activity $(; { $($ekey => $evalue),* })?)),*
            ],
        }
    };
    ($($events:tt)*) => {
        $crate::trace!({}; $($events)*)
    };
}

/// Event log of traces in square brackets
///
/// Log attributes may precede the traces (`{key => value}; ...`), and trace attributes may
/// follow a trace (`[...] {key => value}`). Traces without `concept:name` get their index as
/// identifier.
#[macro_export]
macro_rules! event_log {
    (
        $({ $($key:expr => $value:expr),* $(,)? }$(;)?)?
        $([$($events:tt)*] $({ $($tkey:expr => $tvalue:expr),* $(,)? })?),* $(,)?
    ) => {{
        use $crate::core::event_data::case_centric::{
            constants::TRACE_ID_NAME, EditableAttributes, EventLog,
        };
        let mut log = EventLog {
            attributes: $crate::attributes!($($($key => $value),*)?),
            traces: ::std::vec![
                $($crate::trace!({ $($($tkey => $tvalue),*)? }; $($events)*)),*
            ],
            classifiers: None,
            global_trace_attrs: None,
            global_event_attrs: None,
        };
        for (index, trace) in log.traces.iter_mut().enumerate() {
            if trace.attributes.get_by_key(TRACE_ID_NAME).is_none() {
                trace
                    .attributes
                    .add_attribute($crate::attribute!(TRACE_ID_NAME => index as i64));
            }
        }
        log
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::event_data::case_centric::{
        AttributeValue, EditableAttributes, EventLogClassifier,
    };

    #[test]
    fn nested_attributes() {
        let log = event_log!(
            {"concept:name" => "Claims"};
            ["register", "decide"] {"concept:name" => "claim-1"},
            ["register", "reject"; {"org:resource" => "Bo", "cost" => 3.5}],
            [],
        );
        assert_eq!(log.traces.len(), 3);
        assert_eq!(log.name().as_deref(), Some("Claims"));
        assert_eq!(log.trace_id(0), "claim-1");
        assert_eq!(log.trace_id(1), "1");
        assert!(log.traces[2].events.is_empty());
        assert_eq!(
            log.traces[1].activities(&EventLogClassifier::default()),
            vec!["register", "reject"]
        );
        let attrs = &log.traces[1].events[1].attributes;
        assert_eq!(
            attrs.get_by_key("org:resource").map(|a| &a.value),
            Some(&AttributeValue::String("Bo".into()))
        );
        assert_eq!(
            attrs.get_by_key("cost").map(|a| &a.value),
            Some(&AttributeValue::Float(3.5))
        );
    }
}
