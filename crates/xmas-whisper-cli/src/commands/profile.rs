use clap::Subcommand;
use xmas_whisper_core::{notify, Permission};

use crate::app::App;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Complete onboarding with a short description of yourself
    Set { description: String },
    /// Show the stored description
    Show,
    /// Clear the description (postcards are kept)
    Reset,
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let calendar = app.calendar(None)?;
    match action {
        ProfileAction::Set { description } => {
            calendar.complete_onboarding(&description)?;
            println!("profile saved");
            let notifier = app.notifier();
            if app.state.permission() == Permission::Default {
                notify::request_permission(&notifier);
            }
        }
        ProfileAction::Show => {
            let profile = calendar.profile();
            if profile.is_onboarded() {
                println!("{}", profile.description);
            } else {
                println!("(not set)");
            }
        }
        ProfileAction::Reset => {
            calendar.reset_profile()?;
            println!("profile reset (postcards kept)");
        }
    }
    Ok(())
}
