//! Core types for the orienteering result model.
//!
//! This module provides the data structures the scoring engine consumes and annotates:
//! - [`Control`] and [`ControlCode`] describe one checkpoint of a [`Course`]
//! - [`ControlTime`] is a punch, and after matching, a numbered course control
//! - [`RaceResult`] is one competitor's record with raw and parsed punches
//! - [`CourseClass`] carries the scoring rules a result is judged by
//! - [`Event`] bundles courses, classes and results for batch scoring
//!
//! ## Wire Format
//!
//! All types deserialize from the camelCase JSON shape of the results API, and from the
//! same shape written as YAML for fixtures. Timestamps are RFC 3339 strings.
//!
//! ## Usage Example
//!
//! ```rust
//! use punchcard::types::{Control, ControlTime, Course};
//!
//! let course = Course::new("short", vec![Control::new(31), Control::new(32), Control::new(100)]);
//! let punch = ControlTime::new(31, 95);
//!
//! assert_eq!(course.control_count(), 3);
//! assert!(course.controls[0].code.matches(punch.code));
//! assert!(!punch.is_reader());
//! ```

mod control;
mod control_time;
mod course;
mod course_class;
mod event;
mod result;

pub use control::{Control, ControlCode, LOW_BATTERY_CODE, READER_CODE};
pub use control_time::{CHECKED_TIME, ControlTime, ControlTimeStatus, Split};
pub use course::Course;
pub use course_class::{CourseClass, CourseClassType, PointSystem};
pub use event::{Event, Series};
pub use result::{RaceResult, ResultStatus};
