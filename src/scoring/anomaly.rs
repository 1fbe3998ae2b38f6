//! Anomaly detectors: missing controls, low battery chips, loops and finish times

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::collection::KeyedCollection;
use crate::config::ScoringConfig;
use crate::events::find_course;
use crate::types::{Control, Course, LOW_BATTERY_CODE, RaceResult};

/// A course control the result has no matched punch for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct MissingControl {
    /// 1-based course index
    pub number: usize,
    pub control: Control,
}

/// Controls of the result's course without a matched punch.
///
/// Empty when the result has not been matched yet or its course is unknown.
pub fn missing_controls(result: &RaceResult, courses: &[Course]) -> Vec<MissingControl> {
    if result.parsed_control_times.is_empty() {
        return Vec::new();
    }
    let Some(course) = result.course_id.as_deref().and_then(|id| find_course(id, courses)) else {
        return Vec::new();
    };

    course
        .controls
        .iter()
        .enumerate()
        .map(|(index, control)| (index + 1, control))
        .filter(|(number, _)| !result.parsed_control_times.iter().any(|punch| punch.number == Some(*number)))
        .map(|(number, control)| MissingControl { number, control: control.clone() })
        .collect()
}

/// Low battery signals attributed to one control code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct LowBatteryWarning {
    pub code: u32,
    pub warning_count: usize,
}

/// Count low battery signals per control code across results.
///
/// A chip with a weak battery writes an extra [`LOW_BATTERY_CODE`] punch carrying the
/// same timestamp as the real punch; the warning goes to the real punch's code. Codes
/// appear in the order they were first seen.
pub fn list_low_battery_warnings(results: &[RaceResult]) -> Vec<LowBatteryWarning> {
    let mut warnings: KeyedCollection<u32, LowBatteryWarning> = KeyedCollection::new();

    for result in results {
        for signal in result.control_times.iter().filter(|punch| punch.code == LOW_BATTERY_CODE) {
            let real = result
                .control_times
                .iter()
                .find(|punch| punch.code != LOW_BATTERY_CODE && punch.time == signal.time);
            let Some(real) = real else {
                continue;
            };
            match warnings.get_mut(&real.code) {
                Some(warning) => warning.warning_count += 1,
                None => {
                    warnings.upsert(LowBatteryWarning { code: real.code, warning_count: 1 }, |w| w.code);
                }
            }
        }
    }
    warnings.into_vec()
}

/// Position of a control inside a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum LoopRole {
    Begin,
    End,
}

/// Loop role of the control at `index`, if its code appears more than once.
///
/// Occurrences alternate: the 1st, 3rd, ... open a loop and the 2nd, 4th, ... close it.
pub fn loop_role(index: usize, controls: &[Control]) -> Option<LoopRole> {
    let control = controls.get(index)?;
    let occurrences: Vec<usize> = controls
        .iter()
        .enumerate()
        .filter(|(_, other)| other.code == control.code)
        .map(|(position, _)| position)
        .collect();
    if occurrences.len() < 2 {
        return None;
    }
    let ordinal = occurrences.iter().position(|&position| position == index)?;
    Some(if ordinal % 2 == 0 { LoopRole::Begin } else { LoopRole::End })
}

pub fn is_loop_control(index: usize, controls: &[Control], role: LoopRole) -> bool {
    loop_role(index, controls) == Some(role)
}

/// Finish time rebuilt from the reader: read-out time minus the device time that passed
/// between the last control and the read-out.
pub fn calculate_finish_time_from_reader(result: &RaceResult, course: &Course) -> Option<DateTime<Utc>> {
    let read_time = result.read_time?;
    let reader = result.reader_punch()?;
    let last_control = course.controls.last()?;

    let last_punch = result
        .parsed_control_times
        .iter()
        .find(|punch| punch.number == Some(course.control_count()))
        .or_else(|| result.control_times.iter().rev().find(|punch| last_control.code.matches(punch.code)))?;
    if last_punch.is_checked() {
        return None;
    }

    let elapsed = TimeDelta::try_seconds(reader.time.checked_sub(last_punch.time)?)?;
    read_time.checked_sub_signed(elapsed)
}

/// Whether an entered finish time agrees with the reader.
///
/// A result without a finish time is invalid. When the reader data cannot rebuild a
/// finish time there is nothing to contradict, so the entered one is accepted. The gap is
/// compared at millisecond precision.
pub fn valid_finish_time(result: &RaceResult, course: &Course, config: &ScoringConfig) -> bool {
    let Some(finish_time) = result.finish_time else {
        return false;
    };
    match calculate_finish_time_from_reader(result, course) {
        Some(rebuilt) => {
            (finish_time - rebuilt).num_milliseconds().abs() <= config.finish_time_tolerance_secs.saturating_mul(1000)
        }
        None => true,
    }
}

/// Whether a relay leg result is complete enough to count for its team.
pub fn is_finished_relay_result(result: &RaceResult) -> bool {
    if result.leg.is_none() || result.team_id.is_none() {
        return false;
    }
    (result.read_time.is_some() && result.has_punches()) || result.finish_time.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ControlTime, READER_CODE};
    use chrono::TimeZone;

    fn punches(list: &[(u32, i64)]) -> Vec<ControlTime> {
        list.iter().map(|&(code, time)| ControlTime::new(code, time)).collect()
    }

    fn course() -> Course {
        Course::new("c", vec![Control::new(31), Control::new(32), Control::new(100)])
    }

    #[test]
    fn missing_controls_are_numbered() {
        let result = RaceResult {
            course_id: Some("c".to_string()),
            parsed_control_times: vec![
                ControlTime { number: Some(1), ..ControlTime::new(31, 10) },
                ControlTime { number: Some(3), ..ControlTime::new(100, 30) },
            ],
            ..RaceResult::new("r")
        };
        let missing = missing_controls(&result, &[course()]);
        assert_eq!(missing, vec![MissingControl { number: 2, control: Control::new(32) }]);
    }

    #[test]
    fn missing_controls_need_a_known_course_and_matched_punches() {
        let unmatched = RaceResult { course_id: Some("c".to_string()), ..RaceResult::new("r") };
        assert!(missing_controls(&unmatched, &[course()]).is_empty());

        let unknown = RaceResult {
            course_id: Some("elsewhere".to_string()),
            parsed_control_times: vec![ControlTime { number: Some(1), ..ControlTime::new(31, 10) }],
            ..RaceResult::new("r")
        };
        assert!(missing_controls(&unknown, &[course()]).is_empty());
    }

    #[test]
    fn low_battery_signals_aggregate_by_code() {
        let first = RaceResult {
            control_times: punches(&[(31, 10), (LOW_BATTERY_CODE, 20), (32, 20), (READER_CODE, 40)]),
            ..RaceResult::new("a")
        };
        let second = RaceResult {
            control_times: punches(&[(32, 15), (LOW_BATTERY_CODE, 15), (33, 30)]),
            ..RaceResult::new("b")
        };
        let third = RaceResult {
            control_times: punches(&[(31, 5), (LOW_BATTERY_CODE, 5), (LOW_BATTERY_CODE, 99)]),
            ..RaceResult::new("c")
        };

        let warnings = list_low_battery_warnings(&[first, second, third]);
        assert_eq!(
            warnings,
            vec![
                LowBatteryWarning { code: 32, warning_count: 2 },
                LowBatteryWarning { code: 31, warning_count: 1 },
            ]
        );
    }

    #[test]
    fn loops_alternate_begin_and_end() {
        let controls: Vec<Control> = [31, 50, 32, 50, 33, 50].into_iter().map(Control::new).collect();
        assert_eq!(loop_role(0, &controls), None);
        assert_eq!(loop_role(1, &controls), Some(LoopRole::Begin));
        assert_eq!(loop_role(3, &controls), Some(LoopRole::End));
        assert_eq!(loop_role(5, &controls), Some(LoopRole::Begin));
        assert_eq!(loop_role(9, &controls), None);
        assert!(is_loop_control(3, &controls, LoopRole::End));
        assert!(!is_loop_control(3, &controls, LoopRole::Begin));
    }

    fn finished_result() -> RaceResult {
        RaceResult {
            read_time: Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 30).unwrap()),
            control_times: punches(&[(31, 100), (32, 200), (100, 290), (READER_CODE, 320)]),
            ..RaceResult::new("r")
        }
    }

    #[test]
    fn finish_time_is_rebuilt_from_reader() {
        let rebuilt = calculate_finish_time_from_reader(&finished_result(), &course());
        assert_eq!(rebuilt, Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 0).unwrap()));

        let no_reader = RaceResult { control_times: punches(&[(31, 100), (100, 290)]), ..finished_result() };
        assert_eq!(calculate_finish_time_from_reader(&no_reader, &course()), None);
    }

    #[test]
    fn entered_finish_time_must_match_reader() {
        let config = ScoringConfig::default();
        let mut result = finished_result();
        assert!(!valid_finish_time(&result, &course(), &config));

        result.finish_time = Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 4).unwrap());
        assert!(valid_finish_time(&result, &course(), &config));

        result.finish_time = Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 6).unwrap());
        assert!(!valid_finish_time(&result, &course(), &config));

        let lenient = ScoringConfig { finish_time_tolerance_secs: 10, ..Default::default() };
        assert!(valid_finish_time(&result, &course(), &lenient));

        result.read_time = None;
        assert!(valid_finish_time(&result, &course(), &config));
    }

    #[test]
    fn out_of_range_reader_time_rebuilds_nothing() {
        let corrupt = RaceResult {
            control_times: punches(&[(31, 100), (32, 200), (100, 290), (READER_CODE, i64::MAX)]),
            finish_time: Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 0).unwrap()),
            ..finished_result()
        };
        assert_eq!(calculate_finish_time_from_reader(&corrupt, &course()), None);
        assert!(valid_finish_time(&corrupt, &course(), &ScoringConfig::default()));

        let underflow = RaceResult {
            control_times: punches(&[(31, 100), (32, 200), (100, i64::MIN), (READER_CODE, 320)]),
            ..finished_result()
        };
        assert_eq!(calculate_finish_time_from_reader(&underflow, &course()), None);
    }

    #[test]
    fn finish_tolerance_counts_fractional_seconds() {
        let config = ScoringConfig::default();
        let on_edge = Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 5).unwrap();
        let mut result = RaceResult { finish_time: Some(on_edge), ..finished_result() };
        assert!(valid_finish_time(&result, &course(), &config));

        result.finish_time = Some(on_edge + TimeDelta::milliseconds(500));
        assert!(!valid_finish_time(&result, &course(), &config));

        result.finish_time = Some(Utc.with_ymd_and_hms(2021, 6, 1, 10, 59, 55).unwrap() - TimeDelta::milliseconds(500));
        assert!(!valid_finish_time(&result, &course(), &config));
    }

    #[test]
    fn relay_results_need_team_leg_and_finish() {
        let mut result = RaceResult { team_id: Some("t".to_string()), leg: Some(1), ..finished_result() };
        assert!(is_finished_relay_result(&result));

        result.control_times.clear();
        assert!(!is_finished_relay_result(&result));

        result.finish_time = Some(Utc.with_ymd_and_hms(2021, 6, 1, 11, 0, 0).unwrap());
        assert!(is_finished_relay_result(&result));

        result.leg = None;
        assert!(!is_finished_relay_result(&result));
    }
}
