//! Per-class-type scoring rules
//!
//! A class type changes three things: which punches the matcher may accept, what a
//! penalty is measured in, and whether points are scored. Each [`ClassPolicy`] carries all
//! three for one [`CourseClassType`](crate::types::CourseClassType), so the rest of the
//! scoring code asks the policy instead of comparing class types.

use std::fmt;

use super::{penalty, resolver};
use crate::config::PenaltyUnit;
use crate::types::{Control, ControlTime, Course, CourseClass, RaceResult};

/// Rules that depend on the class type.
pub trait ClassPolicy: Send + Sync + fmt::Debug {
    /// Whether punches must follow course order.
    fn enforces_order(&self) -> bool;

    /// Whether `punch` may be matched to `control`.
    ///
    /// `earliest_raw` is the raw device time a punch has to exceed to count as coming
    /// after the previously matched control. Checked punches and free-order controls are
    /// exempt from ordering.
    fn admits(&self, punch: &ControlTime, control: &Control, earliest_raw: i64) -> bool {
        !self.enforces_order() || punch.is_checked() || control.free_order || punch.time > earliest_raw
    }

    /// Missing-control penalty in minutes.
    fn missing_control_penalty(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> i64;

    /// The result's manual penalty converted to seconds of elapsed time.
    fn additional_time_penalty(&self, result: &RaceResult, unit: PenaltyUnit) -> i64;

    /// Points lost for finishing after the allowed duration.
    fn overtime_penalty_points(&self, result: &RaceResult, class: &CourseClass) -> i64;

    /// The class-appropriate penalty: minutes for timed classes, points for rogaining.
    fn penalty(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> i64;

    /// Score for a timed result, or `None` when this class type is not scored by points.
    fn points(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> Option<i64>;
}

/// Controls visited in course order, ranked by time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPolicy;

impl ClassPolicy for SequentialPolicy {
    fn enforces_order(&self) -> bool {
        true
    }

    fn missing_control_penalty(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> i64 {
        if class.penalty_value() == 0 && !course.has_control_penalties() {
            return 0;
        }
        penalty::missing_control_minutes(result, class, course)
    }

    fn additional_time_penalty(&self, result: &RaceResult, unit: PenaltyUnit) -> i64 {
        unit.to_seconds(result.additional_penalty.unwrap_or_default())
    }

    fn overtime_penalty_points(&self, _result: &RaceResult, _class: &CourseClass) -> i64 {
        0
    }

    fn penalty(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> i64 {
        self.missing_control_penalty(result, class, course)
    }

    fn points(&self, _result: &RaceResult, _class: &CourseClass, _course: &Course) -> Option<i64> {
        None
    }
}

/// Controls collected in any order within a time budget, ranked by points.
#[derive(Debug, Clone, Copy, Default)]
pub struct RogainingPolicy;

impl ClassPolicy for RogainingPolicy {
    fn enforces_order(&self) -> bool {
        false
    }

    fn missing_control_penalty(&self, _result: &RaceResult, _class: &CourseClass, _course: &Course) -> i64 {
        0
    }

    fn additional_time_penalty(&self, _result: &RaceResult, _unit: PenaltyUnit) -> i64 {
        0
    }

    fn overtime_penalty_points(&self, result: &RaceResult, class: &CourseClass) -> i64 {
        let per_minute = class.penalty_value();
        if per_minute == 0 {
            return 0;
        }
        let allowed = penalty::duration(class);
        if result.time <= allowed {
            return 0;
        }
        let overtime = result.time - allowed;
        let started_minutes = (overtime + 59) / 60;
        started_minutes.saturating_mul(per_minute)
    }

    fn penalty(&self, result: &RaceResult, class: &CourseClass, _course: &Course) -> i64 {
        penalty::penalty_points(result, class)
    }

    fn points(&self, result: &RaceResult, class: &CourseClass, course: &Course) -> Option<i64> {
        if result.time <= 0 {
            return None;
        }
        let collected =
            resolver::rogaining_points(&result.parsed_control_times, &course.controls, class.point_system);
        Some((collected - penalty::penalty_points(result, class)).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseClassType, PointSystem};

    fn sequential_class() -> CourseClass {
        CourseClass::new("a", CourseClassType::NotSpecified)
    }

    #[test]
    fn sequential_admits_only_later_punches() {
        let policy = SequentialPolicy;
        let control = Control::new(31);
        assert!(policy.admits(&ControlTime::new(31, 101), &control, 100));
        assert!(!policy.admits(&ControlTime::new(31, 100), &control, 100));
        assert!(!policy.admits(&ControlTime::new(31, 50), &control, 100));
    }

    #[test]
    fn sequential_admits_checked_and_free_order_punches_out_of_order() {
        let policy = SequentialPolicy;
        assert!(policy.admits(&ControlTime::checked(31), &Control::new(31), 100));
        let free = Control { free_order: true, ..Control::new(31) };
        assert!(policy.admits(&ControlTime::new(31, 50), &free, 100));
    }

    #[test]
    fn rogaining_admits_anything() {
        assert!(RogainingPolicy.admits(&ControlTime::new(31, 1), &Control::new(31), 1000));
    }

    #[test]
    fn additional_penalty_is_time_only_for_sequential_classes() {
        let result = RaceResult { additional_penalty: Some(10), ..RaceResult::new("r") };
        assert_eq!(SequentialPolicy.additional_time_penalty(&result, PenaltyUnit::Minutes), 600);
        assert_eq!(SequentialPolicy.additional_time_penalty(&result, PenaltyUnit::Seconds), 10);
        assert_eq!(RogainingPolicy.additional_time_penalty(&result, PenaltyUnit::Minutes), 0);
    }

    #[test]
    fn overtime_rounds_up_to_started_minutes() {
        let class = CourseClass {
            penalty: Some(10),
            duration: Some(49),
            ..CourseClass::new("r", CourseClassType::Rogaining)
        };
        let result = RaceResult { time: 3000, ..RaceResult::new("r") };
        assert_eq!(RogainingPolicy.overtime_penalty_points(&result, &class), 10);

        let on_time = RaceResult { time: 2940, ..RaceResult::new("r") };
        assert_eq!(RogainingPolicy.overtime_penalty_points(&on_time, &class), 0);

        let long = RaceResult { time: 3001, ..RaceResult::new("r") };
        assert_eq!(RogainingPolicy.overtime_penalty_points(&long, &class), 20);
    }

    #[test]
    fn sequential_classes_have_no_points() {
        let course = Course::new("c", vec![Control::new(31)]);
        let result = RaceResult { time: 100, ..RaceResult::new("r") };
        assert_eq!(SequentialPolicy.points(&result, &sequential_class(), &course), None);
    }

    #[test]
    fn rogaining_points_are_floored_at_zero() {
        let course = Course::new("c", vec![Control::new(31), Control::new(100)]);
        let class = CourseClass {
            point_system: PointSystem::OnePoint,
            ..CourseClass::new("r", CourseClassType::Rogaining)
        };
        let result = RaceResult {
            time: 100,
            additional_penalty: Some(5),
            parsed_control_times: vec![ControlTime { number: Some(1), ..ControlTime::new(31, 50) }],
            ..RaceResult::new("r")
        };
        assert_eq!(RogainingPolicy.points(&result, &class, &course), Some(0));

        let untimed = RaceResult { time: 0, ..result };
        assert_eq!(RogainingPolicy.points(&untimed, &class, &course), None);
    }
}
