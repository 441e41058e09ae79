//! Interactive brew session.
//!
//! Reads one command per line from stdin while the timer ticks. The panel
//! and the focus line are both views attached to the same shared timer.

use std::sync::Arc;

use brewtimer_core::{
    BrewMode, BrewTimerEngine, BrewingModeController, Command, Config, Database, Event,
    LogNotifier, RecipeStore, SharedTimer, SqliteHistory, StepTable, TimerView,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::view;

const HELP: &str = "\
commands:
  start              begin the first step
  pause | resume | p toggle the countdown
  skip | s           move on without completing the step
  jump <n>           go to step n (expert mode)
  mode <m>           switch to auto, manual or expert
  finish | f         end the brew and save it
  controls           show what is available right now
  status             redraw the panel
  quit | q           leave without saving";

#[derive(Args)]
pub struct BrewArgs {
    /// Recipe id or path to a recipe TOML file (defaults to brewing.default_recipe)
    #[arg(long)]
    recipe: Option<String>,
    /// Brewing mode (defaults to brewing.default_mode)
    #[arg(long)]
    mode: Option<BrewMode>,
    /// Do not write the finished brew to history
    #[arg(long)]
    no_save: bool,
}

/// One parsed stdin line.
#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Pause,
    Resume,
    Mode(BrewMode),
    Controls,
    Status,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let input = match (word.to_ascii_lowercase().as_str(), arg) {
        ("start", None) => Input::Command(Command::Start),
        ("pause", None) => Input::Pause,
        ("resume", None) => Input::Resume,
        ("p", None) => Input::Command(Command::TogglePause),
        ("skip" | "s", None) => Input::Command(Command::Skip),
        ("jump", Some(n)) => {
            let step: usize = n
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("not a step number: {n}"))?;
            Input::Command(Command::JumpTo(step - 1))
        }
        ("mode", Some(m)) => Input::Mode(m.parse().map_err(|e| format!("{e}"))?),
        ("finish" | "f", None) => Input::Command(Command::Finish),
        ("controls", None) => Input::Controls,
        ("status", None) => Input::Status,
        ("help" | "?", None) => Input::Help,
        ("quit" | "q" | "exit", None) => Input::Quit,
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(Some(input))
}

pub fn run(args: BrewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let reference = args
        .recipe
        .clone()
        .unwrap_or_else(|| config.brewing.default_recipe.clone());
    let recipe = RecipeStore::open()?.resolve(&reference)?;
    let steps = StepTable::from_recipe(&recipe)?;
    let mode = args.mode.unwrap_or(config.brewing.default_mode);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(brew(steps, mode, &config, args.no_save))
}

async fn brew(
    steps: StepTable,
    mode: BrewMode,
    config: &Config,
    no_save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = SharedTimer::builder(BrewTimerEngine::new(steps));
    if config.notifications.enabled {
        builder = builder.notifier(Arc::new(LogNotifier::new(config.notifications.clone())));
    }
    if config.history.enabled && !no_save {
        builder = builder.history(Arc::new(SqliteHistory::new(Database::open()?)));
    } else {
        debug!("History disabled for this brew");
    }
    let timer = builder.build()?;

    let mut controller = BrewingModeController::new(mode, timer.clone());
    let mut panel = timer.attach("panel");
    let mut focus = timer.attach("focus");
    let mut events = timer.events();

    info!("Brewing {} in {} mode", timer.with_steps(|s| s.recipe_name().to_string()), mode);
    print_panel(&mut panel, &controller);
    if config.brewing.auto_start {
        controller.perform(Command::Start);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(input)) => handle(input, &mut controller, &mut panel),
                    Err(message) => eprintln!("{message} (type 'help')"),
                }
            }
            changed = focus.changed() => {
                let Some(snapshot) = changed else { break };
                if !snapshot.is_finished {
                    println!("{}", view::focus_line(&snapshot));
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            if let Event::BrewFinished { summary, .. } = event {
                println!("{}", view::summary(&summary));
            }
        }
        if timer.snapshot().is_finished {
            break;
        }
    }

    timer.shutdown();
    Ok(())
}

fn handle(input: Input, controller: &mut BrewingModeController, panel: &mut TimerView) {
    let command = match input {
        Input::Command(command) => command,
        Input::Pause | Input::Resume => {
            let paused = controller.timer().snapshot().is_paused;
            if paused == (input == Input::Pause) {
                eprintln!("already {}", if paused { "paused" } else { "running" });
                return;
            }
            Command::TogglePause
        }
        Input::Mode(mode) => {
            controller.set_mode(mode);
            print_panel(panel, controller);
            return;
        }
        Input::Controls => {
            println!("{}", view::controls_line(&controller.controls()));
            return;
        }
        Input::Status => {
            print_panel(panel, controller);
            return;
        }
        Input::Help => {
            println!("{HELP}");
            return;
        }
        Input::Quit => return,
    };

    if let Command::JumpTo(target) = command {
        let checked = controller
            .timer()
            .with_steps(|steps| steps.step(target).map(|_| ()));
        if let Err(e) = checked {
            eprintln!("{e}");
            return;
        }
    }

    if controller.perform(command).is_empty() {
        eprintln!(
            "not available right now in {} mode; {}",
            controller.mode(),
            view::controls_line(&controller.controls())
        );
    } else if !matches!(command, Command::Finish) {
        print_panel(panel, controller);
    }
}

fn print_panel(panel: &mut TimerView, controller: &BrewingModeController) {
    let snapshot = panel.current();
    let controls = controller.mode().controls(&snapshot);
    let text = panel
        .timer()
        .with_steps(|steps| view::panel(&snapshot, steps, controller.mode(), &controls));
    println!("{text}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timer_commands() {
        assert_eq!(
            parse_line("start").unwrap(),
            Some(Input::Command(Command::Start))
        );
        assert_eq!(
            parse_line("  P ").unwrap(),
            Some(Input::Command(Command::TogglePause))
        );
        assert_eq!(parse_line("pause").unwrap(), Some(Input::Pause));
        assert_eq!(
            parse_line("jump 3").unwrap(),
            Some(Input::Command(Command::JumpTo(2)))
        );
        assert_eq!(
            parse_line("f").unwrap(),
            Some(Input::Command(Command::Finish))
        );
    }

    #[test]
    fn parses_mode_switch() {
        assert_eq!(
            parse_line("mode expert").unwrap(),
            Some(Input::Mode(BrewMode::Expert))
        );
        assert!(parse_line("mode turbo").is_err());
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_line("jump").is_err());
        assert!(parse_line("jump 0").is_err());
        assert!(parse_line("jump two").is_err());
        assert!(parse_line("start now").is_err());
        assert!(parse_line("brew").is_err());
    }
}
