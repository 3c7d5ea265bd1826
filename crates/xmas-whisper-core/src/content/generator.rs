//! Postcard generation through the Gemini REST API.
//!
//! Two calls per postcard: a curated quote (structured JSON output) and an
//! illustration rendered from the image prompt returned by the first call.

use async_trait::async_trait;
use base64::Engine;
use indoc::{formatdoc, indoc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::CardContent;
use crate::error::GenerationError;
use crate::storage::GeneratorConfig;

/// Used when the image call succeeds but returns no usable image part.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/600/800";

const STYLE_SUFFIX: &str = "Japanese photography style, airy aesthetic, soft lighting, film grain, \
    Hasselblad, overexposed highlights, emotional atmosphere, high quality, 8k, \
    photorealistic but artistic";

/// The external collaborator that produces one day's postcard.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, day: u32, user_description: &str)
        -> Result<CardContent, GenerationError>;
}

/// Thin wrapper around the OS keyring for the API key.
pub mod credentials {
    const SERVICE: &str = "xmas-whisper";
    const API_KEY: &str = "gemini_api_key";

    pub fn get() -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, API_KEY)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(value: &str) -> Result<(), keyring::Error> {
        keyring::Entry::new(SERVICE, API_KEY)?.set_password(value)
    }

    pub fn delete() -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, API_KEY)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Environment first (`GEMINI_API_KEY`, then `API_KEY`), keyring second.
    pub fn resolve() -> Option<String> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .or_else(|| get().ok().flatten())
    }
}

pub struct GeminiGenerator {
    client: Client,
    config: GeneratorConfig,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

/// Structured output of the text call.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CuratedQuote {
    quote_jp: String,
    quote_zh: String,
    source: String,
    work_title: String,
    image_prompt: String,
}

impl GeminiGenerator {
    pub fn new(config: GeneratorConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Build with the API key from the environment or keyring.
    pub fn from_env(config: GeneratorConfig) -> Result<Self, GenerationError> {
        Self::new(config, credentials::resolve())
    }

    async fn call(&self, model: &str, body: &Value) -> Result<GenerateResponse, GenerationError> {
        let key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        );
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn curate_quote(&self, day: u32, user_description: &str) -> Result<CuratedQuote, GenerationError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": curator_instruction(day, user_description) }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("Find a real quote for Day {day} of the advent calendar.") }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": card_schema(),
                "temperature": self.config.temperature,
            }
        });

        let model = &self.config.text_model;
        let resp = self.call(model, &body).await?;
        let text = first_text(&resp).ok_or_else(|| GenerationError::EmptyResponse {
            model: model.clone(),
        })?;
        let quote: CuratedQuote = serde_json::from_str(text)?;
        if quote.image_prompt.trim().is_empty() {
            return Err(GenerationError::MissingField("imagePrompt"));
        }
        Ok(quote)
    }

    async fn render_image(&self, image_prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": format!("{image_prompt}, {STYLE_SUFFIX}") }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": self.config.aspect_ratio }
            }
        });
        let resp = self.call(&self.config.image_model, &body).await?;
        Ok(first_image_uri(&resp).unwrap_or_else(|| {
            debug!("image response had no inline image, using placeholder");
            PLACEHOLDER_IMAGE_URL.to_string()
        }))
    }
}

#[async_trait]
impl CardGenerator for GeminiGenerator {
    async fn generate(&self, day: u32, user_description: &str) -> Result<CardContent, GenerationError> {
        let quote = self.curate_quote(day, user_description).await?;
        let image_url = self.render_image(&quote.image_prompt).await?;

        let content = CardContent {
            image_url,
            quote_original: quote.quote_jp,
            quote_translated: quote.quote_zh,
            source: quote.source,
            work_title: quote.work_title,
        };
        content.validate()?;
        Ok(content)
    }
}

fn first_parts(resp: &GenerateResponse) -> impl Iterator<Item = &Part> {
    resp.candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .into_iter()
        .flat_map(|c| c.parts.iter())
}

fn first_text(resp: &GenerateResponse) -> Option<&str> {
    first_parts(resp)
        .filter_map(|p| p.text.as_deref())
        .find(|t| !t.trim().is_empty())
}

/// First inline image as a `data:` URI, skipping parts that aren't valid base64.
fn first_image_uri(resp: &GenerateResponse) -> Option<String> {
    first_parts(resp)
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| {
            !d.data.is_empty() && base64::engine::general_purpose::STANDARD.decode(&d.data).is_ok()
        })
        .map(|d| {
            let mime = d.mime_type.as_deref().unwrap_or("image/png");
            format!("data:{mime};base64,{}", d.data)
        })
}

fn card_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "quoteJp": { "type": "STRING", "description": "The EXACT, verbatim quote in Japanese from the source material." },
            "quoteZh": { "type": "STRING", "description": "A professional translation of the quote into Traditional Chinese." },
            "source": { "type": "STRING", "description": "The author, character or person who said this." },
            "workTitle": { "type": "STRING", "description": "The title of the anime, book, drama or song." },
            "imagePrompt": { "type": "STRING", "description": "A description for an image generator: a Japanese air-style photo related to the quote and Christmas." }
        },
        "required": ["quoteJp", "quoteZh", "source", "workTitle", "imagePrompt"]
    })
}

fn curator_instruction(day: u32, user_description: &str) -> String {
    let christmas = if day == 25 {
        "Today is Christmas Day: choose a quote that closes the season warmly.\n"
    } else {
        ""
    };
    let rules = indoc! {"
        RULES:
        1. NO FAKE QUOTES. Select an existing quote from reality; never invent one.
        2. SOURCES, in order of preference: \"Frieren: Beyond Journey's End\"; classic Japanese
           literature (Murakami, Soseki, Yoshimoto); Japanese dramas; global classics
           (The Little Prince, Moomins); renowned public figures.
        3. THEME: acknowledge the user's effort, offer gentle comfort or a hopeful direction.
        4. LANGUAGE: original Japanese verbatim plus a Traditional Chinese translation.

        IMAGE STYLE: Japanese photography magazine, overexposed, soft focus, natural light,
        film grain, a single subtle Christmas element combined with the emotion of the quote.
    "};
    formatdoc! {"
        You are a strict literary curator for a Christmas advent calendar.
        Select a REAL, EXISTING quote that encourages this user.
        User profile: \"{user_description}\"
        {christmas}
        {rules}"}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn picks_first_valid_inline_image() {
        let resp = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/png", "data": "%%%not-base64" } },
                { "inlineData": { "mimeType": "image/jpeg", "data": "aGVsbG8=" } }
            ]}}]
        }));
        assert_eq!(
            first_image_uri(&resp).as_deref(),
            Some("data:image/jpeg;base64,aGVsbG8=")
        );
    }

    #[test]
    fn no_candidates_means_no_text() {
        let resp = response(json!({}));
        assert!(first_text(&resp).is_none());
        assert!(first_image_uri(&resp).is_none());
    }

    #[test]
    fn instruction_embeds_profile_and_christmas_note() {
        let text = curator_instruction(25, "graduate student");
        assert!(text.contains("\"graduate student\""));
        assert!(text.contains("Christmas Day"));
        assert!(!curator_instruction(3, "x").contains("Christmas Day"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let generator = GeminiGenerator::new(GeneratorConfig::default(), None).unwrap();
        let err = generator.generate(1, "anyone").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
