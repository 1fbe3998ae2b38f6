//! Domain model and scoring engine for orienteering race results.
//!
//! Punchcard turns raw chip punches into ranked result lists. It validates punch
//! sequences against course definitions, computes elapsed time with penalties, scores
//! rogaining points, ranks classes and flags anomalies such as low chip batteries or
//! finish times that disagree with the reader.
//!
//! # Features
//!
//! - **Pure scoring**: every operation takes references and returns new values
//! - **Class policies**: sequential and rogaining rules behind one trait
//! - **Safe formulas**: points formulas run in a small arithmetic evaluator
//! - **Fail soft**: missing data yields neutral values instead of errors
//!
//! # Quick Start
//!
//! ```rust
//! use punchcard::{Event, Scorer, ScoringConfig};
//!
//! let event = Event::from_yaml(r#"
//! id: sprint
//! name: Sprint
//! courses:
//!   - id: short
//!     controls: [{ code: 31 }, { code: 32 }, { code: 100 }]
//! courseClasses:
//!   - id: h21
//!     name: H21
//!     courseIds: [short]
//! results:
//!   - id: runner
//!     classId: h21
//!     courseId: short
//!     status: Ok
//!     controlTimes:
//!       - { code: 31, time: 95 }
//!       - { code: 32, time: 180 }
//!       - { code: 100, time: 240 }
//!       - { code: 250, time: 250 }
//! "#)?;
//!
//! let scorer = Scorer::new(ScoringConfig::default())?;
//! let ranked = scorer.score_event(&event);
//! assert_eq!(ranked[0].time, 240);
//! assert_eq!(ranked[0].position, Some(1));
//! # Ok::<(), punchcard::ScoringError>(())
//! ```

pub mod collection;
pub mod config;
mod error;
pub mod events;
pub mod scoring;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod time;
pub mod types;

pub use collection::{Keyed, KeyedCollection};
pub use config::{PenaltyUnit, ScoringConfig};
pub use error::*;
pub use types::*;

use tracing::debug;

use crate::events::{find_course, find_course_class};
use crate::scoring::{calculate_points, parse_result, results_with_time_and_position};

/// Batch entry point holding the scoring configuration.
///
/// # Examples
///
/// ```rust
/// use punchcard::{PenaltyUnit, Scorer, ScoringConfig};
///
/// let config = ScoringConfig { additional_penalty_unit: PenaltyUnit::Seconds, ..Default::default() };
/// let scorer = Scorer::new(config)?;
/// assert_eq!(scorer.config().additional_penalty_unit, PenaltyUnit::Seconds);
/// # Ok::<(), punchcard::ScoringError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    /// Create a scorer, rejecting configurations that cannot be used.
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Re-score one result against its class and course in `event`.
    ///
    /// Results whose class or course is not in the event come back unchanged.
    pub fn score_result(&self, result: &RaceResult, event: &Event) -> RaceResult {
        let class = result.class_id.as_deref().and_then(|id| find_course_class(id, &event.course_classes));
        let course = result.course_id.as_deref().and_then(|id| find_course(id, &event.courses));
        parse_result(result, class, course, &self.config)
    }

    /// Score and rank every class of an event.
    pub fn score_event(&self, event: &Event) -> Vec<RaceResult> {
        self.score(event, false)
    }

    /// Like [`Scorer::score_event`], additionally ranking every control and split.
    pub fn score_event_with_control_positions(&self, event: &Event) -> Vec<RaceResult> {
        self.score(event, true)
    }

    fn score(&self, event: &Event, control_positions: bool) -> Vec<RaceResult> {
        let scored = results_with_time_and_position(event, &self.config, control_positions);
        debug!(event = %event.name, results = scored.len(), control_positions, "Scored event");
        self.apply_points_formula(scored)
    }

    /// Replace points class by class when a formula is configured.
    fn apply_points_formula(&self, scored: Vec<RaceResult>) -> Vec<RaceResult> {
        let Some(formula) = &self.config.points_formula else {
            return scored;
        };

        let (ranked, registered): (Vec<_>, Vec<_>) =
            scored.into_iter().partition(|result| result.status != ResultStatus::Registered);

        let mut classes: KeyedCollection<Option<String>, Vec<RaceResult>> = KeyedCollection::new();
        for result in ranked {
            match classes.get_mut(&result.class_id) {
                Some(group) => group.push(result),
                None => {
                    let key = result.class_id.clone();
                    classes.upsert(vec![result], |_| key.clone());
                }
            }
        }

        classes.into_iter().flat_map(|group| calculate_points(&group, formula)).chain(registered).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PointsFormula;
    use crate::test_utils::sample_event;

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScoringConfig { finish_time_tolerance_secs: -1, ..Default::default() };
        assert!(matches!(Scorer::new(config), Err(ScoringError::Config { .. })));
    }

    #[test]
    fn score_result_looks_up_class_and_course() {
        let event = sample_event();
        let scorer = Scorer::default();
        let scored = scorer.score_result(&event.results[0], &event);
        assert!(scored.time > 0);
        assert!(!scored.parsed_control_times.is_empty());

        let orphan = RaceResult { class_id: Some("nowhere".to_string()), ..event.results[0].clone() };
        assert_eq!(scorer.score_result(&orphan, &event), orphan);
    }

    #[test]
    fn formula_points_are_assigned_per_class() {
        let _ = tracing_subscriber::fmt::try_init();
        let event = sample_event();
        let config = ScoringConfig {
            points_formula: Some(PointsFormula::new("1000 - [RESULT].difference").with_not_ok("0")),
            ..Default::default()
        };
        let scored = Scorer::new(config).unwrap().score_event(&event);

        let leader = scored.iter().find(|r| r.position == Some(1) && r.status == ResultStatus::Ok).unwrap();
        assert_eq!(leader.points, Some(1000));
        assert!(scored.iter().filter(|r| r.status == ResultStatus::Dnf).all(|r| r.points == Some(0)));
    }

    #[test]
    fn without_formula_points_are_untouched() {
        let event = sample_event();
        let scored = Scorer::default().score_event(&event);
        assert_eq!(scored.len(), event.results.len());
        assert!(scored.iter().filter(|r| r.class_id.as_deref() == Some("h21")).all(|r| r.points.is_none()));

        let full = scored.iter().find(|r| r.id == "score-full").unwrap();
        assert_eq!(full.points, Some(10));
        assert_eq!(full.position, Some(1));
    }
}
