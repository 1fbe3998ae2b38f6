//! Missing-control and overtime penalties

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::time::time_difference;
use crate::types::{Course, CourseClass, RaceResult};

/// Allowed duration when a class defines no time budget.
pub const UNBOUNDED_DURATION: i64 = i64::MAX;

/// Allowed race duration of a class in seconds.
///
/// An explicit duration wins, then the span from mass start to finish closing, then
/// [`UNBOUNDED_DURATION`].
pub fn duration(class: &CourseClass) -> i64 {
    if let Some(minutes) = class.duration.filter(|&minutes| minutes != 0) {
        return minutes.saturating_mul(60);
    }
    window_duration(class.mass_start_time, class.finish_closing_time).unwrap_or(UNBOUNDED_DURATION)
}

fn window_duration(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<i64> {
    Some(time_difference(start?, end?))
}

/// Minutes charged for course controls the result did not match.
///
/// Zero for rogaining classes, and for classes where neither the class nor any control
/// defines a penalty.
pub fn penalty_from_missing_controls(result: &RaceResult, class: &CourseClass, course: &Course) -> i64 {
    class.policy().missing_control_penalty(result, class, course)
}

/// Sum of per-control (or class) penalties over unmatched control numbers.
pub(crate) fn missing_control_minutes(result: &RaceResult, class: &CourseClass, course: &Course) -> i64 {
    let matched: HashSet<usize> =
        result.parsed_control_times.iter().filter_map(|punch| punch.number).collect();

    course
        .controls
        .iter()
        .enumerate()
        .filter(|(index, _)| !matched.contains(&(index + 1)))
        .map(|(_, control)| match control.penalty.filter(|&minutes| minutes > 0) {
            Some(minutes) => i64::from(minutes),
            None => class.penalty_value(),
        })
        .sum()
}

/// Points deducted from a rogaining score: overtime minutes times the class penalty,
/// plus the result's manual penalty.
pub fn penalty_points(result: &RaceResult, class: &CourseClass) -> i64 {
    class.policy().overtime_penalty_points(result, class) + result.additional_penalty.unwrap_or_default()
}

/// The class-appropriate penalty for a result.
pub fn penalty(result: &RaceResult, class: &CourseClass, course: &Course) -> i64 {
    class.policy().penalty(result, class, course)
}
