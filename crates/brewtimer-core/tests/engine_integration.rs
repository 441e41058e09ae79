//! Integration tests for the brew timer engine.

use std::collections::BTreeSet;

use brewtimer_core::{BrewPhase, BrewTimerEngine, Event, Recipe, RecipeStep};
use proptest::prelude::*;

fn engine(durations: &[u64]) -> BrewTimerEngine {
    let steps = durations
        .iter()
        .enumerate()
        .map(|(i, d)| RecipeStep::new(format!("Step {}", i + 1), *d))
        .collect();
    BrewTimerEngine::from_recipe(&Recipe::new("scenario", "Scenario", steps)).unwrap()
}

fn ticks(engine: &mut BrewTimerEngine, n: usize) -> Vec<Event> {
    (0..n).flat_map(|_| engine.tick()).collect()
}

fn set(items: &[usize]) -> BTreeSet<usize> {
    items.iter().copied().collect()
}

#[test]
fn test_three_step_brew_scenario() {
    let mut e = engine(&[5, 10, 5]);
    e.start();
    assert!(e.has_started());
    assert_eq!(e.time_left(), 5);

    ticks(&mut e, 5);
    assert_eq!(e.current_step_index(), 1);
    assert_eq!(e.time_left(), 10);
    assert_eq!(e.completed_steps(), &set(&[0]));

    // Ten ticks finish step 1, five more run out step 2 into overtime.
    ticks(&mut e, 10);
    assert_eq!(e.current_step_index(), 2);
    assert_eq!(e.time_left(), 5);
    assert_eq!(e.completed_steps(), &set(&[0, 1]));

    ticks(&mut e, 5);
    assert!(e.is_overtime());
    assert_eq!(e.completed_steps(), &set(&[0, 1, 2]));
    assert_eq!(e.overtime_seconds(), 0);

    e.tick();
    e.pause();
    e.tick();
    e.resume();
    e.tick();
    assert_eq!(e.overtime_seconds(), 2);

    let events = e.finish();
    let summary = match &events[..] {
        [Event::BrewFinished { summary, .. }] => summary.clone(),
        other => panic!("expected a single BrewFinished, got {other:?}"),
    };
    assert_eq!(summary.completed_steps, vec![0, 1, 2]);
    assert_eq!(summary.overtime_secs, 2);
    assert_eq!(summary.elapsed_secs, 22);
    assert!(!summary.finished_early);

    let terminal = e.snapshot();
    assert_eq!(terminal.phase, BrewPhase::Finished);
    assert_eq!(terminal.completed_steps, set(&[0, 1, 2]));
    assert_eq!(terminal.overtime_seconds, 2);

    assert!(e.finish().is_empty());
    assert_eq!(e.snapshot(), terminal);
}

#[test]
fn test_event_stream_for_full_brew() {
    let mut e = engine(&[2, 1]);
    let mut events = e.start();
    events.extend(ticks(&mut e, 4));
    events.extend(e.finish());

    let kinds: Vec<&str> = events.iter().map(Event::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "BrewStarted",
            "StepStarted",
            "StepCompleted",
            "StepStarted",
            "StepCompleted",
            "OvertimeEntered",
            "BrewFinished",
        ]
    );
}

#[test]
fn test_skip_then_natural_completion_asymmetry() {
    let mut e = engine(&[5, 2]);
    e.start();
    e.advance_step();
    ticks(&mut e, 2);
    // The skipped step never counts as done; the naturally finished last one does.
    assert_eq!(e.completed_steps(), &set(&[1]));
    assert!(e.is_overtime());
}

#[test]
fn test_empty_recipe_never_builds_an_engine() {
    let recipe = Recipe::new("empty", "Empty", Vec::new());
    let err = BrewTimerEngine::from_recipe(&recipe).unwrap_err();
    assert!(err.to_string().contains("no steps"));
}

#[derive(Debug, Clone)]
enum Op {
    Tick,
    TogglePause,
    Skip,
    Jump(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => Just(Op::Tick),
        1 => Just(Op::TogglePause),
        1 => Just(Op::Skip),
        1 => (0usize..6).prop_map(Op::Jump),
    ]
}

proptest! {
    #[test]
    fn prop_start_loads_first_duration(durations in prop::collection::vec(1u64..30, 1..6)) {
        let mut e = engine(&durations);
        e.start();
        prop_assert!(e.has_started());
        prop_assert_eq!(e.time_left(), durations[0]);
        prop_assert!(e.start().is_empty());
        prop_assert_eq!(e.time_left(), durations[0]);
    }

    #[test]
    fn prop_each_tick_decrements_by_one_or_crosses_a_boundary(
        durations in prop::collection::vec(1u64..8, 1..5),
        n in 0usize..60,
    ) {
        let mut e = engine(&durations);
        e.start();
        for _ in 0..n {
            let before = e.snapshot();
            e.tick();
            let after = e.snapshot();
            if before.is_overtime {
                prop_assert_eq!(after.overtime_seconds, before.overtime_seconds + 1);
                prop_assert_eq!(after.time_left, 0);
            } else if before.time_left > 1 {
                prop_assert_eq!(after.time_left, before.time_left - 1);
                prop_assert_eq!(after.current_step_index, before.current_step_index);
            } else if before.is_last_step() {
                prop_assert!(after.is_overtime);
                prop_assert_eq!(after.time_left, 0);
            } else {
                prop_assert_eq!(after.current_step_index, before.current_step_index + 1);
                prop_assert_eq!(after.time_left, durations[after.current_step_index]);
                prop_assert!(after.completed_steps.contains(&before.current_step_index));
            }
        }
    }

    #[test]
    fn prop_invariants_hold_under_any_command_sequence(
        durations in prop::collection::vec(1u64..6, 1..5),
        ops in prop::collection::vec(op(), 0..80),
    ) {
        let mut e = engine(&durations);
        e.start();
        let mut completed = 0;
        for op in ops {
            let before = e.snapshot();
            match op {
                Op::Tick => {
                    e.tick();
                    if before.is_paused {
                        prop_assert_eq!(e.time_left(), before.time_left);
                        prop_assert_eq!(e.overtime_seconds(), before.overtime_seconds);
                    }
                }
                Op::TogglePause => { e.toggle_pause(); }
                Op::Skip => {
                    let events = e.advance_step();
                    if before.is_last_step() || before.current_step_completed() {
                        prop_assert!(events.is_empty());
                    }
                    prop_assert_eq!(e.completed_steps().len(), before.completed_steps.len());
                }
                Op::Jump(target) => {
                    e.jump_to_step(target);
                    prop_assert_eq!(e.completed_steps(), &before.completed_steps);
                }
            }
            let after = e.snapshot();
            prop_assert!(after.current_step_index < durations.len());
            prop_assert!(after.completed_steps.len() >= completed);
            completed = after.completed_steps.len();
            if !after.is_overtime {
                prop_assert_eq!(after.overtime_seconds, 0);
                prop_assert!(after.time_left >= 1);
            }
        }

        e.finish();
        let terminal = e.snapshot();
        e.finish();
        prop_assert_eq!(e.snapshot(), terminal);
    }
}
