use clap::Subcommand;

use crate::app::App;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List received postcards
    List {
        #[arg(long)]
        json: bool,
    },
    /// Forget every postcard so days regenerate on next open
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let calendar = app.calendar(None)?;
    match action {
        HistoryAction::List { json } => {
            let history = calendar.cache().snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("no postcards yet");
            } else {
                for (day, card) in history.iter() {
                    println!("{day:>2}  {}  ({}, {})", card.quote_original, card.source, card.work_title);
                }
            }
        }
        HistoryAction::Clear => {
            calendar.cache().clear()?;
            println!("history cleared");
        }
    }
    Ok(())
}
