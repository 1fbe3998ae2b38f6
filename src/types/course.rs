//! Courses: ordered control sequences

use serde::{Deserialize, Serialize};

use super::Control;

/// A course offered to one or more classes.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Total length in meters
    pub distance: u32,
    /// Controls in the order they must be visited; the last one is the finish control
    pub controls: Vec<Control>,
}

impl Course {
    pub fn new(id: impl Into<String>, controls: Vec<Control>) -> Self {
        let distance = controls.iter().map(|control| control.distance).sum();
        Self { id: id.into(), name: String::new(), distance, controls }
    }

    /// Number of controls, which is also the `number` of the finish control.
    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    /// Whether any control carries its own missing-control penalty.
    pub fn has_control_penalties(&self) -> bool {
        self.controls.iter().any(|control| control.penalty.unwrap_or_default() > 0)
    }
}
