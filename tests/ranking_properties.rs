//! Property tests for batch ranking through the public API.

use proptest::prelude::*;
use punchcard::{
    Control, ControlTime, Course, CourseClass, CourseClassType, Event, READER_CODE, RaceResult, ResultStatus, Scorer,
};

const CODES: [u32; 6] = [31, 32, 33, 34, 35, 100];

fn status_strategy() -> impl Strategy<Value = ResultStatus> {
    prop_oneof![
        6 => Just(ResultStatus::Ok),
        1 => Just(ResultStatus::Dnf),
        1 => Just(ResultStatus::Dsq),
        1 => Just(ResultStatus::Dns),
    ]
}

prop_compose! {
    fn arb_runner()(pace in 30i64..600, status in status_strategy()) -> (i64, ResultStatus) {
        (pace, status)
    }
}

fn event(runners: &[(i64, ResultStatus)]) -> Event {
    let course = Course::new("c", CODES.iter().copied().map(Control::new).collect());
    let class = CourseClass {
        name: "H21".to_string(),
        course_ids: vec!["c".to_string()],
        ..CourseClass::new("h21", CourseClassType::NotSpecified)
    };

    let results = runners
        .iter()
        .enumerate()
        .map(|(index, &(pace, status))| {
            let mut control_times: Vec<ControlTime> =
                CODES.iter().zip(1..).map(|(&code, leg)| ControlTime::new(code, pace * leg)).collect();
            control_times.push(ControlTime::new(READER_CODE, pace * 7));
            RaceResult {
                class_id: Some("h21".to_string()),
                course_id: Some("c".to_string()),
                status,
                control_times,
                ..RaceResult::new(format!("runner-{index}"))
            }
        })
        .collect();

    Event { id: "e".to_string(), name: "Props".to_string(), courses: vec![course], course_classes: vec![class], results, ..Default::default() }
}

proptest! {
    #[test]
    fn prop_every_result_is_ranked_once(runners in prop::collection::vec(arb_runner(), 1..40)) {
        let scored = Scorer::default().score_event(&event(&runners));
        prop_assert_eq!(scored.len(), runners.len());

        let mut ids: Vec<&str> = scored.iter().map(|result| result.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), runners.len());
    }

    #[test]
    fn prop_status_weight_orders_the_list(runners in prop::collection::vec(arb_runner(), 1..40)) {
        let scored = Scorer::default().score_event(&event(&runners));

        prop_assert_eq!(scored[0].position, Some(1));
        prop_assert_eq!(scored[0].difference, Some(0));
        for pair in scored.windows(2) {
            prop_assert!(pair[0].status.weight() <= pair[1].status.weight());
        }
        for (index, result) in scored.iter().enumerate() {
            let position = result.position.unwrap_or_default() as usize;
            prop_assert!(position >= 1 && position <= index + 1);
        }
    }

    #[test]
    fn prop_ok_results_are_ordered_by_time(runners in prop::collection::vec(arb_runner(), 1..40)) {
        let scored = Scorer::default().score_event(&event(&runners));
        let finishers: Vec<&RaceResult> = scored.iter().filter(|result| result.status == ResultStatus::Ok).collect();

        for pair in finishers.windows(2) {
            prop_assert!(pair[0].time <= pair[1].time);
            if pair[0].time == pair[1].time {
                prop_assert_eq!(pair[0].position, pair[1].position);
            }
        }
        for result in &finishers {
            prop_assert!(result.time > 0);
        }
    }
}
