use clap::Subcommand;
use std::io::Write;
use xmas_whisper_core::Request;

use crate::app::{runtime, App};

#[derive(Subcommand)]
pub enum OfflineAction {
    /// Cache the app shell and drop caches from older versions
    Install,
    /// Drop caches from older versions only
    Activate,
    /// Fetch a URL through the interceptor
    Fetch {
        url: String,
        /// Treat as a page navigation (network-first)
        #[arg(long)]
        navigate: bool,
        /// Write the body to stdout instead of a summary
        #[arg(long)]
        raw: bool,
    },
}

pub fn run(action: OfflineAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let worker = app.offline_worker()?;
    match action {
        OfflineAction::Install => {
            let deleted = runtime()?.block_on(worker.start())?;
            println!("installed {} ({} entries)", worker.cache_name(), worker.shell().len());
            for name in deleted {
                println!("deleted stale cache {name}");
            }
        }
        OfflineAction::Activate => {
            for name in worker.activate()? {
                println!("deleted stale cache {name}");
            }
            println!("active cache: {}", worker.cache_name());
        }
        OfflineAction::Fetch { url, navigate, raw } => {
            let request = if navigate {
                Request::navigate(url)
            } else {
                Request::asset(url)
            };
            let resp = runtime()?.block_on(worker.handle_fetch(&request))?;
            if raw {
                std::io::stdout().write_all(&resp.body)?;
            } else {
                println!(
                    "HTTP {} {} ({} bytes)",
                    resp.status,
                    resp.content_type.as_deref().unwrap_or("-"),
                    resp.body.len()
                );
            }
        }
    }
    Ok(())
}
