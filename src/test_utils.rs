//! Test utilities for fixture resolution and synthetic events
//!
//! Fixture events live under `test-data/events/`. The builders below produce events of
//! any size for unit tests and benchmarks without touching the filesystem.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::types::{
    Control, ControlTime, Course, CourseClass, CourseClassType, Event, PointSystem, READER_CODE, RaceResult,
    ResultStatus,
};

/// Guidance shown when event fixtures are missing from the checkout.
pub const FIXTURE_GUIDANCE: &str = "Event fixtures are stored under test-data/events/ as YAML or JSON documents.";

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl FixtureError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// Require that a specific fixture exists on disk.
pub fn require_fixture<P: AsRef<Path>>(path: P) -> Result<PathBuf, FixtureError> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        Ok(path_ref.to_path_buf())
    } else {
        Err(FixtureError::new(format!("Missing fixture: {}. {}", path_ref.display(), FIXTURE_GUIDANCE)))
    }
}

/// The `test-data` directory of this crate, independent of the working directory.
pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// All event fixtures, sorted by file name.
pub fn event_fixtures() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(test_data_dir().join("events")) else {
        return vec![];
    };

    let mut fixtures: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| matches!(path.extension().and_then(|ext| ext.to_str()), Some("yml" | "yaml" | "json")))
        .collect();
    fixtures.sort();
    fixtures
}

/// Require a named event fixture within `test-data/events`.
pub fn require_event_fixture(file_name: &str) -> Result<PathBuf, FixtureError> {
    require_fixture(test_data_dir().join("events").join(file_name))
}

/// Load a named event fixture.
pub fn load_event_fixture(file_name: &str) -> anyhow::Result<Event> {
    let path = require_event_fixture(file_name)?;
    Event::from_path(path)
}

/// Course over `codes`, each leg `leg_length` meters long.
pub fn sample_course(id: &str, codes: &[u32], leg_length: u32) -> Course {
    let controls = codes.iter().map(|&code| Control { distance: leg_length, ..Control::new(code) }).collect();
    Course::new(id, controls)
}

/// A result that punched every control of `course` in order, `pace` seconds apart,
/// followed by the reader.
pub fn punched_result(id: &str, class: &CourseClass, course: &Course, pace: i64) -> RaceResult {
    let mut control_times: Vec<ControlTime> = course
        .controls
        .iter()
        .enumerate()
        .map(|(index, control)| ControlTime::new(control.code.primary(), pace * (index as i64 + 1)))
        .collect();
    control_times.push(ControlTime::new(READER_CODE, pace * (course.control_count() as i64 + 1)));

    RaceResult {
        name: format!("Runner {id}"),
        class_id: Some(class.id.clone()),
        course_id: Some(course.id.clone()),
        status: ResultStatus::Ok,
        control_times,
        ..RaceResult::new(id)
    }
}

/// Small event: one sequential class with three finishers and one `Dnf` that skipped a
/// control, plus a rogaining class with two results.
pub fn sample_event() -> Event {
    let long = sample_course("long", &[31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 100], 250);
    let score = Course::new(
        "score",
        [31, 42, 53, 64, 100]
            .into_iter()
            .map(|code| Control { free_order: true, ..Control::new(code) })
            .collect(),
    );

    let h21 = CourseClass {
        name: "H21".to_string(),
        course_ids: vec![long.id.clone()],
        ..CourseClass::new("h21", CourseClassType::NotSpecified)
    };
    let rogaining = CourseClass {
        name: "Score 60".to_string(),
        point_system: PointSystem::LastCode,
        penalty: Some(2),
        duration: Some(60),
        course_ids: vec![score.id.clone()],
        ..CourseClass::new("score60", CourseClassType::Rogaining)
    };

    let mut dnf = punched_result("h21-dnf", &h21, &long, 55);
    dnf.control_times.retain(|punch| punch.code != 35);
    dnf.status = ResultStatus::Dnf;

    let mut partial = punched_result("score-partial", &rogaining, &score, 300);
    partial.control_times.retain(|punch| punch.code != 42);

    let results = vec![
        punched_result("h21-second", &h21, &long, 75),
        punched_result("h21-first", &h21, &long, 60),
        dnf,
        punched_result("h21-third", &h21, &long, 90),
        punched_result("score-full", &rogaining, &score, 600),
        partial,
    ];

    Event {
        id: "sample".to_string(),
        name: "Sample Event".to_string(),
        courses: vec![long, score],
        course_classes: vec![h21, rogaining],
        results,
        ..Default::default()
    }
}

/// Event with `classes` sequential classes of `per_class` results each, for benchmarks.
pub fn large_event(classes: usize, per_class: usize) -> Event {
    let mut event = Event { id: "large".to_string(), name: "Large Event".to_string(), ..Default::default() };

    for class_index in 0..classes {
        let codes: Vec<u32> = (0..20).map(|leg| 31 + (leg + class_index as u32) % 60).chain([100]).collect();
        let course = sample_course(&format!("course-{class_index}"), &codes, 200);
        let class = CourseClass {
            name: format!("Class {class_index}"),
            course_ids: vec![course.id.clone()],
            ..CourseClass::new(format!("class-{class_index}"), CourseClassType::NotSpecified)
        };

        for runner in 0..per_class {
            let pace = 45 + (runner as i64 * 37) % 120;
            event.results.push(punched_result(&format!("{class_index}-{runner}"), &class, &course, pace));
        }
        event.courses.push(course);
        event.course_classes.push(class);
    }
    event
}
