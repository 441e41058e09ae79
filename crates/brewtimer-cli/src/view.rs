//! Text rendering for the terminal surfaces.
//!
//! The main panel and the focus line are two views of the same
//! [`TimerSnapshot`]; neither keeps any timer state of its own.

use brewtimer_core::{format_clock, BrewMode, BrewPhase, BrewSummary, Control, Recipe};
use brewtimer_core::{StepTable, TimerSnapshot};

fn phase_label(phase: BrewPhase) -> &'static str {
    match phase {
        BrewPhase::Idle => "ready",
        BrewPhase::Running => "brewing",
        BrewPhase::Paused => "paused",
        BrewPhase::Overtime => "overtime",
        BrewPhase::Finished => "finished",
    }
}

fn clock(snapshot: &TimerSnapshot) -> String {
    if snapshot.is_overtime {
        format!("+{}", format_clock(snapshot.overtime_seconds))
    } else {
        format_clock(snapshot.time_left)
    }
}

/// One-line compact view for the focus surface.
pub fn focus_line(snapshot: &TimerSnapshot) -> String {
    let water = snapshot
        .target_water
        .map(|w| format!("  -> {w:.0} g"))
        .unwrap_or_default();
    format!(
        "[{}] {}  {}/{} {}{}",
        phase_label(snapshot.phase),
        clock(snapshot),
        snapshot.current_step_index + 1,
        snapshot.total_steps,
        snapshot.step_name,
        water
    )
}

/// Full panel: step list with progress marks, the current clock and the
/// controls the active mode offers.
pub fn panel(
    snapshot: &TimerSnapshot,
    steps: &StepTable,
    mode: BrewMode,
    controls: &[Control],
) -> String {
    let mut out = format!(
        "{} ({}) - {} mode\n",
        steps.recipe_name(),
        steps.recipe_id(),
        mode
    );
    for (i, step) in steps.iter().enumerate() {
        let mark = if snapshot.completed_steps.contains(&i) {
            "x"
        } else if i == snapshot.current_step_index && snapshot.has_started {
            ">"
        } else {
            " "
        };
        let water = steps
            .cumulative_water(i)
            .filter(|_| step.water_amount.is_some())
            .map(|w| format!("  {w:.0} g"))
            .unwrap_or_default();
        out.push_str(&format!(
            " [{mark}] {}. {:<16} {}{}\n",
            i + 1,
            step.name,
            format_clock(step.duration_secs),
            water
        ));
    }
    out.push_str(&format!(
        "{}  elapsed {}  {:.0}%\n",
        focus_line(snapshot),
        format_clock(snapshot.elapsed_seconds),
        snapshot.progress_pct
    ));
    out.push_str(&controls_line(controls));
    out
}

pub fn controls_line(controls: &[Control]) -> String {
    if controls.is_empty() {
        return "controls: (none)".to_string();
    }
    let labels: Vec<&str> = controls.iter().map(Control::label).collect();
    format!("controls: {}", labels.join(", "))
}

pub fn summary(summary: &BrewSummary) -> String {
    let early = if summary.finished_early {
        " (finished early)"
    } else {
        ""
    };
    format!(
        "Brewed {}: {}/{} steps in {}, {} overtime{}",
        summary.recipe_name,
        summary.completed_steps.len(),
        summary.total_steps,
        format_clock(summary.elapsed_secs),
        format_clock(summary.overtime_secs),
        early
    )
}

pub fn recipe_detail(recipe: &Recipe) -> String {
    let mut out = format!("{} ({})\n", recipe.name, recipe.id);
    if !recipe.method.is_empty() {
        out.push_str(&format!("method: {}\n", recipe.method));
    }
    if let (Some(coffee), Some(water)) = (recipe.coffee_grams, recipe.water_grams) {
        out.push_str(&format!("dose: {coffee:.0} g coffee / {water:.0} g water"));
        if let Some(ratio) = recipe.ratio() {
            out.push_str(&format!(" (1:{ratio:.1})"));
        }
        out.push('\n');
    }
    if let Some(temp) = recipe.temperature_c {
        out.push_str(&format!("temperature: {temp:.0} C\n"));
    }
    if let Some(grind) = &recipe.grind {
        out.push_str(&format!("grind: {grind}\n"));
    }
    for (i, step) in recipe.steps.iter().enumerate() {
        let water = step
            .water_amount
            .map(|w| format!("  +{w:.0} g"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {}. {:<16} {}{}\n",
            i + 1,
            step.name,
            format_clock(step.duration_secs),
            water
        ));
        if !step.description.is_empty() {
            out.push_str(&format!("     {}\n", step.description));
        }
    }
    out.push_str(&format!(
        "total: {}",
        format_clock(recipe.total_duration_secs())
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewtimer_core::BrewTimerEngine;

    #[test]
    fn focus_line_shows_clock_and_target() {
        let mut engine = BrewTimerEngine::from_recipe(&Recipe::v60()).unwrap();
        engine.start();
        engine.tick();
        assert_eq!(
            focus_line(&engine.snapshot()),
            "[brewing] 00:44  1/4 Bloom  -> 50 g"
        );
    }

    #[test]
    fn focus_line_counts_up_in_overtime() {
        let recipe = Recipe::new("t", "T", vec![brewtimer_core::RecipeStep::new("Only", 1)]);
        let mut engine = BrewTimerEngine::from_recipe(&recipe).unwrap();
        engine.start();
        engine.tick();
        engine.tick();
        engine.tick();
        assert_eq!(focus_line(&engine.snapshot()), "[overtime] +00:02  1/1 Only");
    }

    #[test]
    fn panel_marks_completed_and_current_steps() {
        let mut engine = BrewTimerEngine::from_recipe(&Recipe::v60()).unwrap();
        engine.start();
        for _ in 0..45 {
            engine.tick();
        }
        let snap = engine.snapshot();
        let text = panel(
            &snap,
            engine.steps(),
            BrewMode::Manual,
            &BrewMode::Manual.controls(&snap),
        );
        assert!(text.starts_with("Hario V60 (v60) - manual mode\n"));
        assert!(text.contains(" [x] 1. Bloom"));
        assert!(text.contains(" [>] 2. First Pour"));
        assert!(text.contains("150 g"));
        assert!(text.ends_with("controls: Pause, Skip step"));
    }

    #[test]
    fn empty_controls_are_spelled_out() {
        assert_eq!(controls_line(&[]), "controls: (none)");
    }

    #[test]
    fn recipe_detail_lists_steps() {
        let text = recipe_detail(&Recipe::french_press());
        assert!(text.starts_with("French Press (french-press)\n"));
        assert!(text.contains("1. Pour"));
        assert!(text.ends_with("total: 04:20"));
    }
}
