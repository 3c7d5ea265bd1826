use clap::Subcommand;
use xmas_whisper_core::content::generator::credentials;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the Gemini API key in the OS keyring
    SetKey { key: String },
    /// Remove the stored key
    ClearKey,
    /// Report whether a key is available
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::SetKey { key } => {
            credentials::set(key.trim())?;
            println!("Gemini API key stored");
        }
        AuthAction::ClearKey => {
            credentials::delete()?;
            println!("Gemini API key removed");
        }
        AuthAction::Status => {
            let status = if credentials::resolve().is_some() {
                "configured"
            } else {
                "not configured (postcards will use the fallback)"
            };
            println!("{status}");
        }
    }
    Ok(())
}
