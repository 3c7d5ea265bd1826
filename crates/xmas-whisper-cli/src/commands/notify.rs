use clap::Subcommand;
use std::time::Duration;
use xmas_whisper_core::notify::{self, local_now, run_periodic};

use crate::app::{runtime, App};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Allow daily reminders
    Enable,
    /// Deny daily reminders
    Disable,
    /// Show permission and last delivery date
    Status,
    /// Run the gate once now
    Check,
    /// Keep checking until interrupted
    Watch,
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let notifier = app.notifier();
    match action {
        NotifyAction::Enable => {
            let permission = notify::request_permission(&notifier);
            println!("permission: {}", permission.as_str());
        }
        NotifyAction::Disable => {
            notifier.revoke()?;
            println!("permission: denied");
        }
        NotifyAction::Status => {
            println!("permission: {}", app.state.permission().as_str());
            println!(
                "delivery: {:02}:{:02}",
                app.config.notifications.hour, app.config.notifications.minute
            );
            println!(
                "last notified: {}",
                app.state.last_notified().unwrap_or_else(|| "never".into())
            );
        }
        NotifyAction::Check => {
            let outcome = app.gate().check(local_now(), &notifier);
            println!("{outcome:?}");
        }
        NotifyAction::Watch => {
            let gate = app.gate();
            let every = Duration::from_secs(app.config.notifications.check_interval_secs);
            runtime()?.block_on(run_periodic(&gate, &notifier, every, local_now, async {
                let _ = tokio::signal::ctrl_c().await;
            }));
        }
    }
    Ok(())
}
