//! Versioned change-sets: partial-update descriptions built from events.
//!
//! A change-set names exactly the fields an event explicitly supplies.
//! Fields absent from the event are absent from the change-set, so a
//! sparse update can never blank out previously recorded data, and a
//! late-arriving subset event can never appear to regress fields it does
//! not mention. The incoming version rides along as the ordering input
//! for the store's conditional write.

use crate::deployment::fields;
use crate::event::TaskStateChange;
use capstan_core::item::{Item, Value};
use chrono::{DateTime, Utc};

/// An ordered set of field assignments plus the incoming version.
///
/// Assignments accumulate as (name, value) pairs so inclusion stays
/// independent of how a store implementation renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    version: i64,
    sets: Vec<(&'static str, Value)>,
}

impl ChangeSet {
    /// Creates a change-set for the given incoming version.
    ///
    /// The version is both the ordering condition input and the first
    /// field assignment.
    #[must_use]
    pub fn new(version: i64) -> Self {
        Self {
            version,
            sets: vec![(fields::VERSION, Value::from(version))],
        }
    }

    /// Adds a field assignment.
    #[must_use]
    pub fn set(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.sets.push((field, value.into()));
        self
    }

    /// Adds a timestamp assignment when the event carries one.
    #[must_use]
    pub fn set_optional_time(self, field: &'static str, value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(t) => self.set(field, t),
            None => self,
        }
    }

    /// Adds a string assignment when the event carries a non-empty one.
    #[must_use]
    pub fn set_optional_str(self, field: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => self.set(field, s),
            _ => self,
        }
    }

    /// The incoming version this change-set was built for.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// The accumulated field assignments, in insertion order.
    #[must_use]
    pub fn assignments(&self) -> &[(&'static str, Value)] {
        &self.sets
    }

    /// Returns true when the change-set assigns the given field.
    #[must_use]
    pub fn assigns(&self, field: &str) -> bool {
        self.sets.iter().any(|(name, _)| *name == field)
    }

    /// Applies every assignment to a stored item, leaving unnamed fields
    /// untouched.
    pub fn apply_to(&self, item: &mut Item) {
        for (field, value) in &self.sets {
            item.insert((*field).to_string(), value.clone());
        }
    }
}

/// Builds the change-set for a lifecycle event.
///
/// `taskArn`, `version`, `lastStatus` and `desiredStatus` are always
/// present; timestamps and stop diagnostics are included only when the
/// event supplies them. Terminal events additionally record the
/// `errored` outcome derived from container exit codes. Pure function.
#[must_use]
pub fn change_set_for(detail: &TaskStateChange) -> ChangeSet {
    let mut change = ChangeSet::new(detail.version)
        .set(fields::TASK_ARN, detail.task_arn.as_str())
        .set(fields::LAST_STATUS, detail.last_status.as_str())
        .set(fields::DESIRED_STATUS, detail.desired_status.as_str())
        .set_optional_time(fields::UPDATED_AT, detail.updated_at)
        .set_optional_time(fields::CREATED_AT, detail.created_at)
        .set_optional_time(fields::STARTED_AT, detail.started_at)
        .set_optional_time(fields::STOPPED_AT, detail.stopped_at)
        .set_optional_str(fields::STOP_CODE, detail.stop_code.as_deref())
        .set_optional_str(fields::STOPPED_REASON, detail.stopped_reason.as_deref());

    if let Some(state) = detail.final_state() {
        change = change.set(fields::ERRORED, state.errored);
    }
    change
}
