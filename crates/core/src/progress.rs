//! Completion percentage derived from milestone resources.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{Course, ResourceId};

/// A whole-number completion percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);

    /// Rehydrate a stored percentage, clamping anything above 100.
    #[must_use]
    pub fn from_persisted(value: u32) -> Self {
        Self(u8::try_from(value.min(100)).unwrap_or(100))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0 >= 100
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// `round(100 * done / total)`, rounding halves up, with `0` when `total` is 0.
///
/// Integer-only so the result never depends on float formatting.
#[must_use]
pub fn percentage(done: usize, total: usize) -> Progress {
    if total == 0 {
        return Progress::ZERO;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    let rounded = (200 * done + total) / (2 * total);
    Progress::from_persisted(u32::try_from(rounded).unwrap_or(100))
}

/// Progress of a learner through `course`, counting only milestone resources.
///
/// Completed ids that are not milestones of this course are ignored.
#[must_use]
pub fn compute_progress(course: &Course, completed: &BTreeSet<ResourceId>) -> Progress {
    let total = course.milestone_count();
    let done = course
        .milestones()
        .filter(|m| completed.contains(m.id()))
        .count();
    percentage(done, total)
}

/// Before/after pair produced when a learner's completion set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressChange {
    pub before: Progress,
    pub after: Progress,
}

impl ProgressChange {
    /// True when the learner just reached 100%.
    #[must_use]
    pub fn reached_completion(&self) -> bool {
        !self.before.is_complete() && self.after.is_complete()
    }

    /// True when the learner dropped back below 100%.
    #[must_use]
    pub fn lost_completion(&self) -> bool {
        self.before.is_complete() && !self.after.is_complete()
    }
}
