//! Scoring engine.
//!
//! Results flow through the engine in a fixed order:
//!
//! 1. [`matcher`] assigns raw punches to course controls
//! 2. [`penalty`] and [`resolver`] turn matched punches into elapsed time and points
//! 3. [`ranking`] orders a class and assigns positions
//! 4. [`formula`] optionally replaces points from a configured expression
//!
//! [`anomaly`] and [`suggest`] read the same inputs independently. Class-type specific
//! behavior lives behind [`ClassPolicy`].
//!
//! Every function takes its inputs by reference and returns new values.

pub mod anomaly;
pub mod formula;
pub mod matcher;
pub mod penalty;
pub mod policy;
pub mod ranking;
pub mod resolver;
pub mod suggest;

pub use anomaly::{
    LoopRole, LowBatteryWarning, MissingControl, calculate_finish_time_from_reader, is_finished_relay_result,
    is_loop_control, list_low_battery_warnings, loop_role, missing_controls, valid_finish_time,
};
pub use formula::{PointsFormula, calculate_points};
pub use matcher::{ControlMatcher, check_control_code, is_reader_control, validate_control_times};
pub use penalty::{UNBOUNDED_DURATION, duration, penalty, penalty_from_missing_controls, penalty_points};
pub use policy::{ClassPolicy, RogainingPolicy, SequentialPolicy};
pub use ranking::{
    Placing, count_by_status, result_position_and_difference, result_sort, results_with_time_and_position,
    set_class_positions, set_control_positions, smart_result_sort,
};
pub use resolver::{
    format_result_time, official_start_time, parse_result, result_time, rogaining_points, start_time, time_offset,
};
pub use suggest::{CourseClassSuggestion, suggest_course_class};
