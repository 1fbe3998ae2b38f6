//! Course control definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Punch code written by the finish reader when a chip is read out.
pub const READER_CODE: u32 = 250;

/// Punch code some chips emit alongside a real punch when their battery runs low.
pub const LOW_BATTERY_CODE: u32 = 99;

/// Code (or set of accepted codes) of a control.
///
/// Shared and loop controls accept several physical units, so the wire model allows
/// either a single integer or a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(untagged)]
pub enum ControlCode {
    Single(u32),
    Any(Vec<u32>),
}

impl ControlCode {
    /// Check whether a punched code satisfies this control.
    pub fn matches(&self, code: u32) -> bool {
        match self {
            ControlCode::Single(expected) => *expected == code,
            ControlCode::Any(codes) => codes.contains(&code),
        }
    }

    /// First accepted code, used when a placeholder punch has to be synthesized.
    pub fn primary(&self) -> u32 {
        match self {
            ControlCode::Single(code) => *code,
            ControlCode::Any(codes) => codes.first().copied().unwrap_or_default(),
        }
    }
}

impl Default for ControlCode {
    fn default() -> Self {
        ControlCode::Single(0)
    }
}

impl From<u32> for ControlCode {
    fn from(code: u32) -> Self {
        ControlCode::Single(code)
    }
}

impl fmt::Display for ControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCode::Single(code) => write!(f, "{code}"),
            ControlCode::Any(codes) => {
                let joined = codes.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
                f.write_str(&joined)
            }
        }
    }
}

/// One checkpoint of a course. Order within the course defines the expected punch order.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Control {
    /// Accepted punch code(s)
    pub code: ControlCode,
    /// Distance from the previous control in meters
    pub distance: u32,
    /// May be punched in any order relative to its neighbours
    pub free_order: bool,
    /// Required, but the leg leading to it is removed from the elapsed time
    pub skip: bool,
    /// Not physically present on the terrain; satisfied automatically
    pub disabled: bool,
    /// Minutes added when this control is missing
    pub penalty: Option<u32>,
    /// Printed label, used instead of the code for rogaining point values
    pub label: Option<String>,
}

impl Control {
    /// Create a plain sequential control.
    pub fn new(code: impl Into<ControlCode>) -> Self {
        Self { code: code.into(), ..Default::default() }
    }

    /// Label if one is set, otherwise the code as text.
    pub fn label_text(&self) -> String {
        match &self.label {
            Some(label) if !label.is_empty() => label.clone(),
            _ => self.code.to_string(),
        }
    }
}
