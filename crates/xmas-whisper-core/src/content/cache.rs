//! Lazy day -> postcard cache.
//!
//! A day is generated at most once: the first open spawns the generation,
//! later opens of the same pending day wait on the same outcome, and every
//! open after that is served from memory. Failures resolve to the fallback
//! postcard, which is cached like any other result.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{CardContent, CardGenerator, CardHistory};
use crate::error::GenerationError;
use crate::storage::{StateStore, UserProfile};

type Pending = watch::Receiver<Option<CardContent>>;

/// Shared, cloneable handle to the postcard cache.
#[derive(Clone)]
pub struct ContentCache {
    inner: Arc<Inner>,
}

struct Inner {
    state: StateStore,
    generator: Arc<dyn CardGenerator>,
    history: Mutex<CardHistory>,
    in_flight: Mutex<HashMap<u32, Pending>>,
}

impl ContentCache {
    /// Build the cache, reloading the persisted history.
    pub fn load(state: StateStore, generator: Arc<dyn CardGenerator>) -> Self {
        let history = state.load_history();
        info!(cards = history.len(), "card history loaded");
        Self {
            inner: Arc::new(Inner {
                state,
                generator,
                history: Mutex::new(history),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Return the postcard for `day`, generating it on first request.
    ///
    /// Never fails: generator errors resolve to [`CardContent::fallback`].
    /// Dropping the returned future does not cancel a generation already
    /// started; its result still lands in the cache.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn get_or_create(&self, day: u32, profile: &UserProfile) -> CardContent {
        let mut pending = {
            // Holding the in-flight lock while consulting the history closes
            // the window between a finished task's insert and its removal.
            let mut in_flight = self.inner.in_flight.lock();
            if let Some(content) = self.inner.history.lock().get(day) {
                return content.clone();
            }
            match in_flight.get(&day) {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(day, rx.clone());
                    self.spawn_generation(day, profile.description.clone(), tx);
                    rx
                }
            }
        };

        let outcome = match pending.wait_for(Option::is_some).await {
            Ok(content) => Ok(content.clone()),
            Err(_) => Err(GenerationError::Aborted { day }),
        };
        match outcome {
            Ok(content) => content.unwrap_or_else(CardContent::fallback),
            Err(e) => {
                error!(day, error = %e, "generation task dropped without a result");
                self.inner.in_flight.lock().remove(&day);
                self.peek(day).unwrap_or_else(CardContent::fallback)
            }
        }
    }

    fn spawn_generation(&self, day: u32, description: String, tx: watch::Sender<Option<CardContent>>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            info!(day, "generating postcard");
            let content = match inner.generator.generate(day, &description).await {
                Ok(content) => match content.validate() {
                    Ok(()) => content,
                    Err(e) => {
                        warn!(day, error = %e, "generator returned incomplete postcard, using fallback");
                        CardContent::fallback()
                    }
                },
                Err(e) => {
                    warn!(day, error = %e, "postcard generation failed, using fallback");
                    CardContent::fallback()
                }
            };

            let stored = inner.insert(day, content);
            inner.in_flight.lock().remove(&day);
            let _ = tx.send(Some(stored));
        });
    }

    /// Cached postcard for `day`, without generating.
    pub fn peek(&self, day: u32) -> Option<CardContent> {
        self.inner.history.lock().get(day).cloned()
    }

    pub fn contains(&self, day: u32) -> bool {
        self.inner.history.lock().contains(day)
    }

    /// True while a generation for `day` is in flight.
    pub fn is_pending(&self, day: u32) -> bool {
        self.inner.in_flight.lock().contains_key(&day)
    }

    pub fn len(&self) -> usize {
        self.inner.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.history.lock().is_empty()
    }

    pub fn snapshot(&self) -> CardHistory {
        self.inner.history.lock().clone()
    }

    /// Forget every postcard, in memory and in storage.
    ///
    /// This is the only way to replace a fallback postcard with a fresh one.
    pub fn clear(&self) -> Result<(), crate::error::StorageError> {
        let mut history = self.inner.history.lock();
        self.inner.state.clear_history()?;
        *history = CardHistory::default();
        info!("card history cleared");
        Ok(())
    }
}

impl Inner {
    /// Insert and persist; returns the postcard now cached for the day.
    fn insert(&self, day: u32, content: CardContent) -> CardContent {
        let mut history = self.history.lock();
        if !history.insert(day, content.clone()) {
            return history.get(day).cloned().unwrap_or(content);
        }
        if let Err(e) = self.state.save_history(&history) {
            error!(day, error = %e, "failed to persist card history");
        }
        content
    }
}
