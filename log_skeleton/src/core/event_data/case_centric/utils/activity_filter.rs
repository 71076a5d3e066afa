use std::collections::BTreeSet;

/// Accepts traces based on required and forbidden activities
///
/// A trace is accepted if it contains every required activity and no forbidden activity.
/// With both sets empty, every trace is accepted.
#[derive(Debug, Clone, Copy)]
pub struct ActivityFilter<'a> {
    /// Activities that must occur in an accepted trace
    pub required: &'a BTreeSet<String>,
    /// Activities that must not occur in an accepted trace
    pub forbidden: &'a BTreeSet<String>,
}

impl<'a> ActivityFilter<'a> {
    /// Create a new filter
    pub fn new(required: &'a BTreeSet<String>, forbidden: &'a BTreeSet<String>) -> Self {
        Self {
            required,
            forbidden,
        }
    }

    /// Whether the filter accepts all traces
    pub fn is_trivial(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }

    /// Check whether the given (classified) trace is accepted
    pub fn accepts<S: AsRef<str>>(&self, activities: &[S]) -> bool {
        if self.is_trivial() {
            return true;
        }
        let present: BTreeSet<&str> = activities.iter().map(|a| a.as_ref()).collect();
        self.required.iter().all(|r| present.contains(r.as_str()))
            && !self.forbidden.iter().any(|f| present.contains(f.as_str()))
    }
}
