//! Lookups and display helpers over an event's courses and classes

use crate::types::{Control, Course, CourseClass, Event};

/// Display name, prefixed with the series when there is one.
pub fn event_name(event: &Event) -> String {
    match &event.series {
        Some(series) if !series.name.is_empty() => format!("{}, {}", series.name, event.name),
        _ => event.name.clone(),
    }
}

pub fn find_course<'a>(course_id: &str, courses: &'a [Course]) -> Option<&'a Course> {
    courses.iter().find(|course| course.id == course_id)
}

pub fn find_course_class<'a>(class_id: &str, classes: &'a [CourseClass]) -> Option<&'a CourseClass> {
    classes.iter().find(|class| class.id == class_id)
}

/// Courses raced under `class`, in event order.
pub fn course_class_courses<'a>(class: &CourseClass, courses: &'a [Course]) -> Vec<&'a Course> {
    courses.iter().filter(|course| class.course_ids.contains(&course.id)).collect()
}

/// Longest course distance of a class in meters.
pub fn course_class_distance(courses: &[Course], class: &CourseClass) -> u32 {
    course_class_courses(class, courses).iter().map(|course| course.distance).max().unwrap_or_default()
}

/// Most controls on any course of the class, not counting the finish control.
pub fn course_class_control_amount(courses: &[Course], class: &CourseClass) -> usize {
    course_class_courses(class, courses)
        .iter()
        .map(|course| course.control_count().saturating_sub(1))
        .max()
        .unwrap_or_default()
}

/// Class name with its distance, e.g. `A / 3.7km`.
pub fn course_class_name(courses: &[Course], class: &CourseClass) -> String {
    let kilometers = f64::from(course_class_distance(courses, class)) / 1000.0;
    format!("{} / {}km", class.name, kilometers)
}

/// Meters from the start to the control at `index`, that control's leg included.
pub fn distance_to_control(controls: &[Control], index: usize) -> u32 {
    controls.iter().take(index + 1).map(|control| control.distance).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseClassType, Series};

    fn event() -> Event {
        let controls = |distances: &[u32]| {
            distances
                .iter()
                .enumerate()
                .map(|(index, &distance)| Control { distance, ..Control::new(31 + index as u32) })
                .collect::<Vec<_>>()
        };
        Event {
            id: "e".to_string(),
            name: "Stage 1".to_string(),
            series: Some(Series { id: "s".to_string(), name: "Summer Week".to_string() }),
            courses: vec![
                Course::new("long", controls(&[1200, 1500, 1000])),
                Course::new("short", controls(&[800, 900])),
                Course::new("other", controls(&[100])),
            ],
            course_classes: vec![CourseClass {
                name: "A".to_string(),
                course_ids: vec!["short".to_string(), "long".to_string()],
                ..CourseClass::new("a", CourseClassType::NotSpecified)
            }],
            ..Default::default()
        }
    }

    #[test]
    fn name_includes_series() {
        let mut event = event();
        assert_eq!(event_name(&event), "Summer Week, Stage 1");
        event.series = None;
        assert_eq!(event_name(&event), "Stage 1");
    }

    #[test]
    fn class_courses_and_aggregates() {
        let event = event();
        let class = &event.course_classes[0];
        let ids: Vec<_> = course_class_courses(class, &event.courses).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["long", "short"]);
        assert_eq!(course_class_distance(&event.courses, class), 3700);
        assert_eq!(course_class_control_amount(&event.courses, class), 2);
        assert_eq!(course_class_name(&event.courses, class), "A / 3.7km");
    }

    #[test]
    fn class_without_courses() {
        let class = CourseClass { name: "Empty".to_string(), ..Default::default() };
        assert_eq!(course_class_distance(&event().courses, &class), 0);
        assert_eq!(course_class_control_amount(&event().courses, &class), 0);
        assert_eq!(course_class_name(&event().courses, &class), "Empty / 0km");
    }

    #[test]
    fn lookups() {
        let event = event();
        assert_eq!(find_course("short", &event.courses).map(|c| c.distance), Some(1700));
        assert!(find_course("missing", &event.courses).is_none());
        assert!(find_course_class("a", &event.course_classes).is_some());
        assert!(find_course_class("b", &event.course_classes).is_none());
    }

    #[test]
    fn distance_accumulates_up_to_control() {
        let event = event();
        let controls = &event.courses[0].controls;
        assert_eq!(distance_to_control(controls, 0), 1200);
        assert_eq!(distance_to_control(controls, 1), 2700);
        assert_eq!(distance_to_control(controls, 10), 3700);
    }
}
