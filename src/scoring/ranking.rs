//! Ranking engine: sort orders, class positions and per-control positions

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::resolver::parse_result;
use crate::collection::KeyedCollection;
use crate::config::ScoringConfig;
use crate::events::course_class_courses;
use crate::time::to_positive_or_zero;
use crate::types::{Course, Event, RaceResult, ResultStatus};

/// Finished-result order within a class.
///
/// Lower status weight first; then results without a positive time go last; then more
/// points, then less time. Two results without a time compare equal.
pub fn result_sort(a: &RaceResult, b: &RaceResult) -> Ordering {
    a.status
        .weight()
        .cmp(&b.status.weight())
        .then_with(|| is_untimed(a).cmp(&is_untimed(b)))
        .then_with(|| {
            if is_untimed(a) {
                return Ordering::Equal;
            }
            b.points_value().cmp(&a.points_value()).then_with(|| a.time.cmp(&b.time))
        })
}

fn is_untimed(result: &RaceResult) -> bool {
    result.time <= 0
}

/// Order for live result lists, where many competitors are still out.
///
/// Like [`result_sort`], but results without a time are ordered by how far they have
/// got (furthest control, then who passed it first) and finally by start time.
pub fn smart_result_sort(a: &RaceResult, b: &RaceResult) -> Ordering {
    a.status
        .weight()
        .cmp(&b.status.weight())
        .then_with(|| b.points_value().cmp(&a.points_value()))
        .then_with(|| is_untimed(a).cmp(&is_untimed(b)))
        .then_with(|| if is_untimed(a) { Ordering::Equal } else { a.time.cmp(&b.time) })
        .then_with(|| progress_key(a).cmp(&progress_key(b)))
        .then_with(|| start_key(a).cmp(&start_key(b)))
}

/// Furthest matched control first, earlier passing first, no progress last.
fn progress_key(result: &RaceResult) -> (bool, std::cmp::Reverse<usize>, i64) {
    let furthest = result
        .parsed_control_times
        .iter()
        .filter(|punch| !punch.is_reader())
        .filter_map(|punch| punch.number.map(|number| (number, punch.effective_time())))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));
    match furthest {
        Some((number, time)) => (false, std::cmp::Reverse(number), time),
        None => (true, std::cmp::Reverse(0), 0),
    }
}

fn start_key(result: &RaceResult) -> (bool, Option<chrono::DateTime<chrono::Utc>>) {
    let start = result.start_time.or(result.register_time);
    (start.is_none(), start)
}

/// Rank results of one class.
///
/// Results are stably sorted with [`result_sort`]. Results with the same time and points
/// share the position of the first of them, and `difference` is the gap to the leader.
pub fn set_class_positions(results: &[RaceResult]) -> Vec<RaceResult> {
    let mut ranked = results.to_vec();
    ranked.sort_by(result_sort);

    let leader_time = ranked.first().map(|result| result.time).unwrap_or_default();
    let mut first_index: HashMap<(i64, i64), usize> = HashMap::new();
    for (index, result) in ranked.iter_mut().enumerate() {
        let first = *first_index.entry((result.time, result.points_value())).or_insert(index);
        result.position = Some(rank(first));
        result.difference = Some(to_positive_or_zero(result.time - leader_time));
    }
    ranked
}

fn rank(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Rank every `Ok` result at each control of `course`, by elapsed time and by split.
///
/// Checked punches and punches without a positive time are not ranked.
pub fn set_control_positions(results: &[RaceResult], course: &Course) -> Vec<RaceResult> {
    let mut ranked = results.to_vec();

    for number in 1..=course.control_count() {
        let mut leg_times = Vec::new();
        let mut split_times = Vec::new();
        for result in ranked.iter().filter(|result| result.status == ResultStatus::Ok) {
            let punch = result.parsed_control_times.iter().find(|punch| {
                punch.number == Some(number) && !punch.is_checked() && punch.effective_time() > 0
            });
            if let Some(punch) = punch {
                leg_times.push(punch.effective_time());
                split_times.push(punch.split_time());
            }
        }
        if leg_times.is_empty() {
            continue;
        }
        leg_times.sort_unstable();
        split_times.sort_unstable();

        for result in ranked.iter_mut().filter(|result| result.status == ResultStatus::Ok) {
            let Some(punch) = result.parsed_control_times.iter_mut().find(|punch| punch.number == Some(number))
            else {
                continue;
            };
            let elapsed = punch.effective_time();
            if let Some(index) = first_match(&leg_times, elapsed) {
                punch.position = Some(rank(index));
                punch.difference = Some(elapsed - leg_times[0]);
            }
            if let Some(split) = punch.split.as_mut() {
                if let Some(index) = first_match(&split_times, split.time) {
                    split.position = Some(rank(index));
                    split.difference = Some(split.time - split_times[0]);
                }
            }
        }
    }
    ranked
}

fn first_match(sorted: &[i64], value: i64) -> Option<usize> {
    let index = sorted.partition_point(|&candidate| candidate < value);
    (sorted.get(index) == Some(&value)).then_some(index)
}

/// Seconds between `result` and the first result of an already sorted list.
pub fn time_difference(results: &[RaceResult], result: &RaceResult) -> i64 {
    results.first().map(|leader| result.time - leader.time).unwrap_or_default()
}

/// Number of results in `status`.
pub fn count_by_status(results: &[RaceResult], status: ResultStatus) -> usize {
    results.iter().filter(|result| result.status == status).count()
}

/// Position and gap of one result within its class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Placing {
    pub position: Option<u32>,
    pub difference: Option<i64>,
}

/// Where `result` would place among `results`, replacing any entry with the same id.
pub fn result_position_and_difference(result: &RaceResult, results: &[RaceResult]) -> Placing {
    let mut class_results: KeyedCollection<String, RaceResult> = results.iter().cloned().collect();
    class_results.upsert_keyed(result.clone());

    set_class_positions(class_results.as_slice())
        .into_iter()
        .find(|ranked| ranked.id == result.id)
        .map(|ranked| Placing { position: ranked.position, difference: ranked.difference })
        .unwrap_or_default()
}

/// Score and rank every classified result of an event.
///
/// Each class's results are parsed against their course and ranked; `Registered`
/// results are left out of the ranking and appended unchanged when they have a register
/// time. Results whose class is not in the event are dropped.
pub fn results_with_time_and_position(event: &Event, config: &ScoringConfig, control_positions: bool) -> Vec<RaceResult> {
    let mut scored = Vec::with_capacity(event.results.len());

    for class in &event.course_classes {
        let entries: Vec<&RaceResult> = event
            .results
            .iter()
            .filter(|result| result.class_id.as_deref() == Some(class.id.as_str()))
            .filter(|result| result.status != ResultStatus::Registered)
            .collect();
        let mut class_results: KeyedCollection<String, RaceResult> = entries.iter().map(|&r| r.clone()).collect();
        if class_results.len() < entries.len() {
            warn!(
                class = %class.name,
                entries = entries.len(),
                kept = class_results.len(),
                "Results with duplicate ids collapsed; validate the event first"
            );
        }

        for course in course_class_courses(class, &event.courses) {
            let parsed: Vec<RaceResult> = class_results
                .iter()
                .filter(|result| result.course_id.as_deref() == Some(course.id.as_str()))
                .map(|result| parse_result(result, Some(class), Some(course), config))
                .collect();
            let parsed = if control_positions { set_control_positions(&parsed, course) } else { parsed };
            for result in parsed {
                class_results.upsert_keyed(result);
            }
        }

        debug!(class = %class.name, results = class_results.len(), "Ranked class");
        scored.extend(set_class_positions(class_results.as_slice()));
    }

    scored.extend(
        event
            .results
            .iter()
            .filter(|result| result.status == ResultStatus::Registered && result.register_time.is_some())
            .cloned(),
    );
    scored
}
