//! Wiring of the core components from the on-disk configuration.

use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::OnceCell;

use xmas_whisper_core::offline::{HttpFetcher, SqliteCacheStorage};
use xmas_whisper_core::storage::GeneratorConfig;
use xmas_whisper_core::{
    AdventCalendar, CardContent, CardGenerator, Config, ContentCache, Database, GeminiGenerator,
    GenerationError, NotificationGate, OfflineWorker, StateStore,
};

use crate::notifier::ConsoleNotifier;

pub struct App {
    pub config: Config,
    pub db: Arc<Database>,
    pub state: StateStore,
}

impl App {
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let db = Arc::new(Database::open()?);
        let state = StateStore::new(db.clone());
        Ok(Self { config, db, state })
    }

    /// `debug_day` from the command line wins over the configured override.
    pub fn calendar(&self, debug_day: Option<i64>) -> Result<AdventCalendar, Box<dyn Error>> {
        let generator = Arc::new(LazyGemini::new(self.config.generator.clone()));
        let cache = ContentCache::load(self.state.clone(), generator);
        let calendar = AdventCalendar::new(self.state.clone(), cache, &self.config.calendar);
        if debug_day.is_some() {
            calendar.set_debug_day(debug_day);
        }
        Ok(calendar)
    }

    pub fn notifier(&self) -> ConsoleNotifier {
        ConsoleNotifier::new(self.state.clone(), self.config.notifications.enabled)
    }

    pub fn gate(&self) -> NotificationGate {
        NotificationGate::new(self.state.clone(), &self.config.notifications)
    }

    pub fn offline_worker(&self) -> Result<OfflineWorker, Box<dyn Error>> {
        let storage = Arc::new(SqliteCacheStorage::new(self.db.clone()));
        Ok(OfflineWorker::new(
            &self.config.offline,
            storage,
            Arc::new(HttpFetcher::default()),
        )?)
    }
}

/// Resolves the API key and builds the HTTP client on the first generation,
/// so commands that never open a day never touch the keyring.
pub struct LazyGemini {
    config: GeneratorConfig,
    inner: OnceCell<GeminiGenerator>,
}

impl LazyGemini {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }
}

#[async_trait]
impl CardGenerator for LazyGemini {
    async fn generate(&self, day: u32, user_description: &str) -> Result<CardContent, GenerationError> {
        let generator = self
            .inner
            .get_or_try_init(|| async { GeminiGenerator::from_env(self.config.clone()) })
            .await?;
        generator.generate(day, user_description).await
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Runtime::new()?)
}
