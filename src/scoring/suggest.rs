//! Course and class suggestion for unassigned results

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use super::matcher::ControlMatcher;
use super::penalty::duration;
use super::resolver::start_time;
use crate::events::{course_class_courses, find_course_class};
use crate::time::time_difference;
use crate::types::{Course, CourseClass, Event, RaceResult};

/// Suggested assignment for a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct CourseClassSuggestion {
    pub class_id: Option<String>,
    pub course_id: Option<String>,
}

impl CourseClassSuggestion {
    fn of(class: &CourseClass, course: Option<&Course>) -> Self {
        Self { class_id: Some(class.id.clone()), course_id: course.map(|course| course.id.clone()) }
    }

    fn is_empty(&self) -> bool {
        self.class_id.is_none() && self.course_id.is_none()
    }
}

#[derive(Debug)]
struct Candidate<'a> {
    class: &'a CourseClass,
    course: &'a Course,
    matched: usize,
    total: usize,
    /// Seconds from the class's start anchor to finish or read-out
    observed: Option<i64>,
}

impl Candidate<'_> {
    fn is_exact(&self) -> bool {
        self.total > 0 && self.matched == self.total
    }

    /// `Greater` when `self` explains the punches better than `other`.
    fn compare(&self, other: &Self) -> Ordering {
        self.is_exact()
            .cmp(&other.is_exact())
            .then_with(|| (self.matched * other.total).cmp(&(other.matched * self.total)))
            .then_with(|| self.total.cmp(&other.total))
            .then_with(|| {
                if !(self.class.is_rogaining() && other.class.is_rogaining()) {
                    return Ordering::Equal;
                }
                match (self.duration_fit(), other.duration_fit()) {
                    (Some(mine), Some(theirs)) => theirs.cmp(&mine),
                    _ => Ordering::Equal,
                }
            })
    }

    /// Lower is better: budgets that cover the observed time first, tightest first.
    fn duration_fit(&self) -> Option<(bool, i64)> {
        let observed = self.observed?;
        let allowed = duration(self.class);
        Some(if allowed >= observed { (false, allowed - observed) } else { (true, observed - allowed) })
    }
}

fn observed_time(result: &RaceResult, class: &CourseClass) -> Option<i64> {
    let start = start_time(result, class)?;
    let end = result.finish_time.or(result.read_time)?;
    Some(time_difference(start, end)).filter(|&time| time > 0)
}

fn score<'a>(result: &RaceResult, class: &'a CourseClass, course: &'a Course) -> Candidate<'a> {
    let matched = ControlMatcher::new(class, course)
        .run(&result.control_times)
        .iter()
        .filter_map(|punch| punch.number)
        .filter(|&number| course.controls.get(number - 1).is_some_and(|control| !control.disabled))
        .count();
    let total = course.controls.iter().filter(|control| !control.disabled).count();
    Candidate { class, course, matched, total, observed: observed_time(result, class) }
}

/// Suggest the class and course that best explain a result's punches.
///
/// Unless `force_suggest` is set, a result that already has both a class and a course
/// keeps them, and a result with only a class is matched within that class. A result
/// without punches takes its class's only course. When forcing finds no course matching
/// every control, the original assignment stands; when nothing matches at all, the
/// event's first class and course are used.
pub fn suggest_course_class(result: &RaceResult, event: &Event, force_suggest: bool) -> CourseClassSuggestion {
    let original = CourseClassSuggestion { class_id: result.class_id.clone(), course_id: result.course_id.clone() };
    if !force_suggest && original.class_id.is_some() && original.course_id.is_some() {
        return original;
    }

    let own_class = result.class_id.as_deref().and_then(|id| find_course_class(id, &event.course_classes));

    if !result.has_punches() {
        if let Some(class) = own_class {
            let courses = course_class_courses(class, &event.courses);
            if let [course] = courses.as_slice() {
                return CourseClassSuggestion::of(class, Some(*course));
            }
        }
        return if original.is_empty() { first_assignment(event) } else { original };
    }

    let restrict_to = if force_suggest { None } else { result.class_id.as_deref() };
    let mut best: Option<Candidate<'_>> = None;

    for class in event.course_classes.iter().filter(|class| restrict_to.is_none_or(|id| class.id == id)) {
        for course in course_class_courses(class, &event.courses) {
            let candidate = score(result, class, course);
            if candidate.matched == 0 {
                continue;
            }
            let better = match &best {
                Some(current) => candidate.compare(current) == Ordering::Greater,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    let suggestion = match best {
        Some(best) if best.is_exact() => CourseClassSuggestion::of(best.class, Some(best.course)),
        Some(_) if force_suggest && !original.is_empty() => original,
        Some(best) => CourseClassSuggestion::of(best.class, Some(best.course)),
        None => first_assignment(event),
    };
    debug!(result = %result.id, class = ?suggestion.class_id, course = ?suggestion.course_id, "Suggested course class");
    suggestion
}

fn first_assignment(event: &Event) -> CourseClassSuggestion {
    match event.course_classes.first() {
        Some(class) => {
            let course = course_class_courses(class, &event.courses).into_iter().next().or(event.courses.first());
            CourseClassSuggestion::of(class, course)
        }
        None => CourseClassSuggestion {
            class_id: None,
            course_id: event.courses.first().map(|course| course.id.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Control, ControlTime, CourseClassType, READER_CODE};
    use chrono::{TimeZone, Utc};

    fn class(id: &str, course_ids: &[&str]) -> CourseClass {
        CourseClass {
            name: id.to_string(),
            course_ids: course_ids.iter().map(|id| id.to_string()).collect(),
            ..CourseClass::new(id, CourseClassType::NotSpecified)
        }
    }

    fn rogaining(id: &str, minutes: i64) -> CourseClass {
        CourseClass { class_type: CourseClassType::Rogaining, duration: Some(minutes), ..class(id, &["r"]) }
    }

    fn course(id: &str, codes: &[u32]) -> Course {
        Course::new(id, codes.iter().copied().map(Control::new).collect())
    }

    fn event() -> Event {
        Event {
            id: "e".to_string(),
            name: "Test".to_string(),
            courses: vec![
                course("a", &[31, 32, 33, 100]),
                course("a-short", &[31, 33, 100]),
                course("b", &[41, 42, 100]),
                course("r", &[51, 52, 53, 100]),
            ],
            course_classes: vec![
                class("A", &["a", "a-short"]),
                class("B", &["b"]),
                rogaining("R3", 180),
                rogaining("R6", 360),
            ],
            ..Default::default()
        }
    }

    fn punched(codes: &[u32]) -> RaceResult {
        let mut control_times: Vec<ControlTime> =
            codes.iter().enumerate().map(|(index, &code)| ControlTime::new(code, 60 * (index as i64 + 1))).collect();
        control_times.push(ControlTime::new(READER_CODE, 60 * (codes.len() as i64 + 1)));
        RaceResult { control_times, ..RaceResult::new("r") }
    }

    fn expect(class: &str, course: &str) -> CourseClassSuggestion {
        CourseClassSuggestion { class_id: Some(class.to_string()), course_id: Some(course.to_string()) }
    }

    #[test]
    fn existing_assignment_is_kept() {
        let result = RaceResult {
            class_id: Some("B".to_string()),
            course_id: Some("b".to_string()),
            ..punched(&[31, 32, 33, 100])
        };
        assert_eq!(suggest_course_class(&result, &event(), false), expect("B", "b"));
    }

    #[test]
    fn exact_match_prefers_the_longest_course() {
        let result = punched(&[31, 32, 33, 100]);
        assert_eq!(suggest_course_class(&result, &event(), false), expect("A", "a"));

        let short = punched(&[31, 33, 100]);
        assert_eq!(suggest_course_class(&short, &event(), false), expect("A", "a-short"));
    }

    #[test]
    fn partial_match_uses_best_fraction() {
        let result = punched(&[41, 100]);
        assert_eq!(suggest_course_class(&result, &event(), false), expect("B", "b"));
    }

    #[test]
    fn class_restricts_the_search_unless_forced() {
        let result = RaceResult { class_id: Some("A".to_string()), ..punched(&[41, 42, 100]) };
        assert_eq!(suggest_course_class(&result, &event(), false).class_id.as_deref(), Some("A"));
        assert_eq!(suggest_course_class(&result, &event(), true), expect("B", "b"));
    }

    #[test]
    fn forced_suggestion_without_perfect_match_keeps_original() {
        let result = RaceResult {
            class_id: Some("A".to_string()),
            course_id: Some("a".to_string()),
            ..punched(&[41, 100])
        };
        assert_eq!(suggest_course_class(&result, &event(), true), expect("A", "a"));
    }

    #[test]
    fn nothing_matching_falls_back_to_first_class() {
        let result = punched(&[77, 78]);
        assert_eq!(suggest_course_class(&result, &event(), false), expect("A", "a"));
    }

    #[test]
    fn without_punches_the_only_course_is_used() {
        let result = RaceResult { class_id: Some("B".to_string()), ..RaceResult::new("r") };
        assert_eq!(suggest_course_class(&result, &event(), false), expect("B", "b"));

        let ambiguous = RaceResult { class_id: Some("A".to_string()), ..RaceResult::new("r") };
        let suggestion = suggest_course_class(&ambiguous, &event(), false);
        assert_eq!(suggestion.class_id.as_deref(), Some("A"));
        assert_eq!(suggestion.course_id, None);
    }

    #[test]
    fn rogaining_tie_prefers_the_budget_that_covers_the_time() {
        let start = Utc.with_ymd_and_hms(2021, 6, 1, 10, 0, 0).unwrap();
        let four_hours = RaceResult {
            start_time: Some(start),
            read_time: Some(start + chrono::Duration::hours(4)),
            ..punched(&[53, 51, 52, 100])
        };
        assert_eq!(suggest_course_class(&four_hours, &event(), false), expect("R6", "r"));

        let two_hours = RaceResult { read_time: Some(start + chrono::Duration::hours(2)), ..four_hours };
        assert_eq!(suggest_course_class(&two_hours, &event(), false), expect("R3", "r"));
    }
}
