//! Postcards and the day -> postcard cache.

mod cache;
pub mod generator;

pub use cache::ContentCache;
pub use generator::{CardGenerator, GeminiGenerator};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GenerationError;

pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1482638202371-aa1c17ffb50b?q=80&w=600&auto=format&fit=crop";

/// One day's postcard. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardContent {
    /// Remote URL or `data:` URI of the illustration.
    pub image_url: String,
    /// The quote verbatim in its original language.
    #[serde(alias = "quoteJp")]
    pub quote_original: String,
    #[serde(alias = "quoteZh")]
    pub quote_translated: String,
    /// Author, character or speaker.
    pub source: String,
    /// Book, series or song the quote comes from.
    pub work_title: String,
}

impl CardContent {
    /// The known-good postcard shown whenever generation fails.
    pub fn fallback() -> Self {
        Self {
            image_url: FALLBACK_IMAGE_URL.to_string(),
            quote_original: "一番大切なものは、目に見えない。".to_string(),
            quote_translated: "真正重要的東西，是用眼睛看不見的。".to_string(),
            source: "Saint-Exupéry".to_string(),
            work_title: "The Little Prince".to_string(),
        }
    }

    /// Rejects records with any blank field; a partial postcard is a failure.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let fields = [
            ("imageUrl", &self.image_url),
            ("quoteOriginal", &self.quote_original),
            ("quoteTranslated", &self.quote_translated),
            ("source", &self.source),
            ("workTitle", &self.work_title),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(GenerationError::MissingField(name));
            }
        }
        Ok(())
    }
}

/// Every postcard generated so far, keyed by day.
///
/// Serialized as a JSON object keyed by the decimal day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardHistory(BTreeMap<u32, CardContent>);

impl CardHistory {
    pub fn get(&self, day: u32) -> Option<&CardContent> {
        self.0.get(&day)
    }

    pub fn contains(&self, day: u32) -> bool {
        self.0.contains_key(&day)
    }

    /// Inserts unless the day already has a postcard; returns whether it did.
    pub fn insert(&mut self, day: u32, content: CardContent) -> bool {
        match self.0.entry(day) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(content);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &CardContent)> {
        self.0.iter().map(|(day, content)| (*day, content))
    }
}
