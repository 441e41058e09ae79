use brewtimer_core::{format_clock, Config, Database};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Most recent finished brews
    List {
        /// Maximum number of brews (defaults to history.list_limit)
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals over all finished brews
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit, json } => {
            let limit = match limit {
                Some(limit) => limit,
                None => Config::load()?.history.list_limit as usize,
            };
            let brews = db.list_brews(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&brews)?);
                return Ok(());
            }
            if brews.is_empty() {
                println!("No brews yet.");
                return Ok(());
            }
            for brew in &brews {
                let s = &brew.summary;
                let early = if s.finished_early { "  early" } else { "" };
                println!(
                    "{}  {:<16} {}/{} steps  {}  +{}{}",
                    s.finished_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                    s.recipe_id,
                    s.completed_steps.len(),
                    s.total_steps,
                    format_clock(s.elapsed_secs),
                    format_clock(s.overtime_secs),
                    early
                );
            }
        }
        HistoryAction::Stats { json } => {
            let stats = db.brew_stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!("brews:          {}", stats.total_brews);
            println!("today:          {}", stats.today_brews);
            println!("finished early: {}", stats.finished_early);
            println!("brewing time:   {}", format_clock(stats.total_brew_secs));
            println!("overtime:       {}", format_clock(stats.total_overtime_secs));
            if let Some(recipe) = stats.favourite_recipe {
                println!("favourite:      {recipe}");
            }
        }
    }
    Ok(())
}
