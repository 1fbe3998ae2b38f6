//! Event aggregate: everything the batch scorer needs in one document

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::{Course, CourseClass, RaceResult};
use crate::{Result, ScoringError};

/// Series an event belongs to.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Series {
    pub id: String,
    pub name: String,
}

/// A race with its courses, classes and results.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub series: Option<Series>,
    pub courses: Vec<Course>,
    pub course_classes: Vec<CourseClass>,
    pub results: Vec<RaceResult>,
}

impl Event {
    /// Parse an event from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let event: Event = serde_yaml_ng::from_str(yaml).map_err(|e| ScoringError::Parse {
            context: "Event YAML deserialization".to_string(),
            details: e.to_string(),
        })?;
        event.validate()?;
        Ok(event)
    }

    /// Parse an event from the JSON shape served by the results API.
    pub fn from_json(json: &str) -> Result<Self> {
        let event: Event = serde_json::from_str(json).map_err(|e| ScoringError::Parse {
            context: "Event JSON deserialization".to_string(),
            details: e.to_string(),
        })?;
        event.validate()?;
        Ok(event)
    }

    /// Load an event file, choosing the format from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ScoringError::file_error(path.to_path_buf(), source))?;

        let event = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
        .with_context(|| format!("Loading event from {}", path.display()))?;

        debug!(
            event = %event.name,
            courses = event.courses.len(),
            classes = event.course_classes.len(),
            results = event.results.len(),
            "Loaded event"
        );
        Ok(event)
    }

    /// Reject references that can never be resolved.
    ///
    /// Results pointing at unknown classes are allowed (they are suggested later), but a
    /// class listing a course id that does not exist is a broken fixture. Result ids must
    /// be present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, result) in self.results.iter().enumerate() {
            if result.id.is_empty() {
                return Err(ScoringError::parse(
                    "Event validation",
                    format!("Result #{} ('{}') has no id", index + 1, result.name),
                ));
            }
            if !seen.insert(result.id.as_str()) {
                return Err(ScoringError::parse("Event validation", format!("Duplicate result id '{}'", result.id)));
            }
        }

        for class in &self.course_classes {
            for course_id in &class.course_ids {
                if !self.courses.iter().any(|course| &course.id == course_id) {
                    return Err(ScoringError::Parse {
                        context: "Event validation".to_string(),
                        details: format!("Class '{}' references unknown course '{}'", class.name, course_id),
                    });
                }
            }
        }
        Ok(())
    }
}
