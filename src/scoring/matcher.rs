//! Control matcher: assigns raw punches to course controls
//!
//! The matcher walks the course in order and, for each control, picks the first punch
//! that carries an accepted code, has not been used yet and is admitted by the class
//! policy. Matched punches get their 1-based course `number`, an `offset_time` corrected
//! for device clock drift and skipped legs, and a `split` from the previous anchoring
//! control.
//!
//! ```rust
//! use punchcard::scoring::ControlMatcher;
//! use punchcard::types::{Control, ControlTime, Course, CourseClass, CourseClassType};
//!
//! let course = Course::new("c", vec![Control::new(31), Control::new(32), Control::new(100)]);
//! let class = CourseClass::new("k", CourseClassType::NotSpecified);
//! let punches = vec![ControlTime::new(31, 60), ControlTime::new(32, 150), ControlTime::new(100, 200)];
//!
//! let matched = ControlMatcher::new(&class, &course).run(&punches);
//! assert_eq!(matched[1].number, Some(2));
//! assert_eq!(matched[1].split_time(), 90);
//! ```

use tracing::trace;

use crate::time::to_positive_or_zero;
use crate::types::{ControlCode, ControlTime, ControlTimeStatus, Course, CourseClass, Split};

/// Matches punches against one course under one class's rules.
#[derive(Debug, Clone, Copy)]
pub struct ControlMatcher<'a> {
    class: &'a CourseClass,
    course: &'a Course,
    offset: i64,
    force_update: bool,
}

impl<'a> ControlMatcher<'a> {
    /// Matcher with no clock offset that always recomputes annotations.
    pub fn new(class: &'a CourseClass, course: &'a Course) -> Self {
        Self { class, course, offset: 0, force_update: true }
    }

    /// Seconds subtracted from raw device times.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// When disabled, punches that already carry numbers are returned untouched.
    pub fn force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    /// Produce an annotated copy of `punches`.
    pub fn run(&self, punches: &[ControlTime]) -> Vec<ControlTime> {
        if !self.force_update && punches.iter().any(|punch| punch.number.is_some()) {
            trace!(course = %self.course.id, "Punches already matched");
            return punches.to_vec();
        }

        let policy = self.class.policy();
        let mut matched: Vec<ControlTime> = punches
            .iter()
            .cloned()
            .map(|mut punch| {
                punch.clear_annotations();
                punch
            })
            .collect();

        let mut last_punch_time = 0i64;
        let mut skip_time = 0i64;

        for (index, control) in self.course.controls.iter().enumerate() {
            let earliest_raw = last_punch_time + skip_time + self.offset;
            let candidate = matched.iter().position(|punch| {
                punch.number.is_none()
                    && !punch.is_reader()
                    && control.code.matches(punch.code)
                    && policy.admits(punch, control, earliest_raw)
            });

            let Some(slot) = candidate else {
                if control.disabled {
                    matched.push(ControlTime {
                        offset_time: Some(0),
                        number: Some(index + 1),
                        status: Some(ControlTimeStatus::Checked),
                        split: Some(Split::new(0)),
                        ..ControlTime::new(control.code.primary(), 0)
                    });
                } else {
                    trace!(number = index + 1, code = %control.code, "No punch for control");
                }
                continue;
            };

            let punch = &mut matched[slot];
            let checked = punch.is_checked();
            let offset_time = if checked { punch.time } else { punch.time - self.offset - skip_time };
            let split = to_positive_or_zero(offset_time - last_punch_time);

            punch.number = Some(index + 1);
            punch.offset_time = Some(offset_time);

            if control.skip {
                if !control.free_order {
                    skip_time += split;
                }
                punch.split = Some(Split::new(0));
            } else {
                punch.split = Some(Split::new(split));
                if !control.free_order && !checked {
                    last_punch_time = offset_time;
                }
            }
        }

        if let Some(reader) = matched.iter_mut().find(|punch| punch.is_reader()) {
            reader.offset_time = Some(reader.time - self.offset - skip_time);
        }

        matched
    }
}

/// Annotate `punches` against `course`.
///
/// With `force_update == false`, an already annotated list is returned as is, which makes
/// repeated calls idempotent.
pub fn validate_control_times(
    punches: &[ControlTime],
    class: &CourseClass,
    course: &Course,
    offset: i64,
    force_update: bool,
) -> Vec<ControlTime> {
    ControlMatcher::new(class, course).with_offset(offset).force_update(force_update).run(punches)
}

/// Whether a punched code satisfies a control code.
pub fn check_control_code(punch_code: u32, code: &ControlCode) -> bool {
    code.matches(punch_code)
}

/// Whether `punch` is the finish reader punch.
pub fn is_reader_control(punch: &ControlTime) -> bool {
    punch.is_reader()
}
