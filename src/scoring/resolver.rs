//! Elapsed time and points for a single result

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::matcher::ControlMatcher;
use crate::config::ScoringConfig;
use crate::time::{HmsFormat, format_hms, time_difference, to_positive_or_zero};
use crate::types::{CHECKED_TIME, Control, ControlTime, Course, CourseClass, PointSystem, RaceResult, ResultStatus};

/// Start anchor for elapsed time: mass start, else the result's start, else its register time.
pub fn start_time(result: &RaceResult, class: &CourseClass) -> Option<DateTime<Utc>> {
    class.mass_start_time.or(result.start_time).or(result.register_time)
}

/// Start time shown on start lists, which never falls back to the register time.
pub fn official_start_time(result: &RaceResult, class: &CourseClass) -> Option<DateTime<Utc>> {
    class.mass_start_time.or(result.start_time)
}

/// Final elapsed seconds of a result, penalties included.
///
/// `Dns` and `NoTime` results are always 0. Otherwise the first available source wins:
/// an explicit finish time, the matched finish control (or reader) punch, then the read
/// time. Every source is clamped at zero.
pub fn result_time(result: &RaceResult, class: &CourseClass, course: &Course, config: &ScoringConfig) -> i64 {
    if result.status.is_untimed() {
        return 0;
    }

    let policy = class.policy();
    let start = start_time(result, class);

    let missing_minutes = match result.status {
        ResultStatus::Manual | ResultStatus::Registered => 0,
        _ => policy.missing_control_penalty(result, class, course),
    };
    let penalty = missing_minutes * 60 + policy.additional_time_penalty(result, config.additional_penalty_unit);

    if let (Some(start), Some(finish)) = (start, result.finish_time) {
        return to_positive_or_zero(time_difference(start, finish) + penalty);
    }

    if result.status != ResultStatus::Manual {
        let finish_punch = result
            .parsed_control_times
            .iter()
            .find(|punch| punch.number == Some(course.control_count()))
            .or_else(|| result.parsed_control_times.iter().find(|punch| punch.is_reader()));

        if let Some(elapsed) = finish_punch.map(ControlTime::effective_time).filter(|&time| time > 0) {
            return to_positive_or_zero(elapsed + penalty);
        }
    }

    match (start, result.read_time) {
        (Some(start), Some(read)) => to_positive_or_zero(time_difference(start, read) + penalty),
        _ => 0,
    }
}

/// Clock drift between the punching device and the reader, in seconds.
///
/// The reader punch records device time at read-out; the wall clock says how long the
/// competitor had actually been out. Zero without a reader punch, read time or start.
pub fn time_offset(result: &RaceResult, class: &CourseClass) -> i64 {
    if result.control_times.is_empty() {
        return 0;
    }
    let Some(reader) = result.reader_punch() else {
        return 0;
    };
    match (official_start_time(result, class), result.read_time) {
        (Some(start), Some(read)) => reader.time - time_difference(start, read),
        _ => 0,
    }
}

/// Re-score a result against its class and course.
///
/// Returns an unchanged copy when either is missing. `Manual` results keep their parsed
/// punches as entered.
pub fn parse_result(
    result: &RaceResult,
    class: Option<&CourseClass>,
    course: Option<&Course>,
    config: &ScoringConfig,
) -> RaceResult {
    let (Some(class), Some(course)) = (class, course) else {
        return result.clone();
    };

    let mut parsed = result.clone();
    if !result.control_times.is_empty() && result.status != ResultStatus::Manual {
        let offset = time_offset(result, class);
        parsed.parsed_control_times = ControlMatcher::new(class, course)
            .with_offset(offset)
            .run(&result.control_times)
            .into_iter()
            .filter(|punch| punch.time >= CHECKED_TIME)
            .collect();
    }

    parsed.time = result_time(&parsed, class, course, config);
    if let Some(points) = class.policy().points(&parsed, class, course) {
        parsed.points = Some(points);
    }
    parsed
}

/// Points collected on a rogaining course.
///
/// Every matched control except the finish counts once, valued from its label by
/// `system`.
pub fn rogaining_points(punches: &[ControlTime], controls: &[Control], system: PointSystem) -> i64 {
    if system == PointSystem::NoSystem || punches.is_empty() {
        return 0;
    }
    let finish_number = controls.len();

    let collected: BTreeSet<usize> = punches
        .iter()
        .filter(|punch| !punch.is_reader())
        .filter_map(|punch| punch.number)
        .filter(|&number| number != finish_number)
        .collect();

    collected
        .into_iter()
        .filter_map(|number| controls.get(number - 1))
        .map(|control| control_value(control, system))
        .sum()
}

fn control_value(control: &Control, system: PointSystem) -> i64 {
    let label = control.label_text();
    let digit = |c: Option<char>| c.and_then(|c| c.to_digit(10)).map(i64::from).unwrap_or_default();
    match system {
        PointSystem::FirstCode => digit(label.chars().next()),
        PointSystem::LastCode => digit(label.chars().last()),
        PointSystem::OnePoint => 1,
        PointSystem::NoSystem => 0,
    }
}

/// Result time for display: `-` when there is none.
pub fn format_result_time(status: ResultStatus, time: i64) -> String {
    if status.is_untimed() || time == 0 {
        return "-".to_string();
    }
    format_hms(time, HmsFormat::Short).unwrap_or_else(|| "-".to_string())
}
