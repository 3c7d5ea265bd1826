//! View-facing calendar facade.
//!
//! Ties the clock policy, the content cache and the user profile together
//! the way the calendar screen consumes them: a 25-tile grid, gated opens,
//! onboarding and profile reset.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::clock::{self, ADVENT_DAYS};
use crate::content::{CardContent, ContentCache};
use crate::error::{CalendarError, StorageError};
use crate::storage::{CalendarConfig, StateStore, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayStatus {
    Locked,
    /// Unlocked, postcard not generated yet.
    Open,
    /// Unlocked and already has a postcard.
    Opened,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTile {
    pub day: u32,
    pub status: DayStatus,
    pub is_today: bool,
    pub pending: bool,
}

pub struct AdventCalendar {
    state: StateStore,
    cache: ContentCache,
    demo_day: i64,
    debug_day: Mutex<Option<i64>>,
}

impl AdventCalendar {
    pub fn new(state: StateStore, cache: ContentCache, config: &CalendarConfig) -> Self {
        Self {
            state,
            cache,
            demo_day: config.demo_day,
            debug_day: Mutex::new(config.debug_day),
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Debug control: any integer, `None` to follow the calendar again.
    pub fn set_debug_day(&self, day: Option<i64>) {
        *self.debug_day.lock() = day;
    }

    pub fn unlocked_day_on(&self, today: NaiveDate) -> i64 {
        clock::current_unlocked_day_with_demo(today, *self.debug_day.lock(), self.demo_day)
    }

    pub fn unlocked_day(&self) -> i64 {
        self.unlocked_day_on(Local::now().date_naive())
    }

    pub fn progress_on(&self, today: NaiveDate) -> f64 {
        clock::workshop_progress(self.unlocked_day_on(today))
    }

    pub fn tiles_on(&self, today: NaiveDate) -> Vec<DayTile> {
        let unlocked = self.unlocked_day_on(today);
        (1..=ADVENT_DAYS)
            .map(|day| {
                let status = if !clock::is_openable(i64::from(day), unlocked) {
                    DayStatus::Locked
                } else if self.cache.contains(day) {
                    DayStatus::Opened
                } else {
                    DayStatus::Open
                };
                DayTile {
                    day,
                    status,
                    is_today: i64::from(day) == unlocked,
                    pending: self.cache.is_pending(day),
                }
            })
            .collect()
    }

    pub fn tiles(&self) -> Vec<DayTile> {
        self.tiles_on(Local::now().date_naive())
    }

    /// Gate check only; no side effects.
    pub fn check_openable(&self, day: i64, today: NaiveDate) -> Result<u32, CalendarError> {
        let day_u32 = u32::try_from(day)
            .ok()
            .filter(|d| (1..=ADVENT_DAYS).contains(d))
            .ok_or(CalendarError::InvalidDay(day))?;
        let unlocked = self.unlocked_day_on(today);
        if !clock::is_openable(day, unlocked) {
            return Err(CalendarError::Locked {
                day: day_u32,
                unlocked,
            });
        }
        Ok(day_u32)
    }

    /// Open a day's postcard, generating it on first open.
    ///
    /// Locked or out-of-range days are rejected before the cache is touched.
    pub async fn open_day_on(&self, day: i64, today: NaiveDate) -> Result<CardContent, CalendarError> {
        let day = self.check_openable(day, today)?;
        let profile = self.state.load_profile();
        Ok(self.cache.get_or_create(day, &profile).await)
    }

    pub async fn open_day(&self, day: i64) -> Result<CardContent, CalendarError> {
        self.open_day_on(day, Local::now().date_naive()).await
    }

    pub fn profile(&self) -> UserProfile {
        self.state.load_profile()
    }

    pub fn complete_onboarding(&self, description: &str) -> Result<UserProfile, crate::error::CoreError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(CalendarError::MissingProfile.into());
        }
        let profile = UserProfile::new(description);
        self.state.save_profile(&profile)?;
        info!("onboarding complete");
        Ok(profile)
    }

    /// Clears the profile; postcards already received are kept.
    pub fn reset_profile(&self) -> Result<(), StorageError> {
        self.state.clear_profile()?;
        info!("profile reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CardGenerator;
    use crate::error::GenerationError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl CardGenerator for Counting {
        async fn generate(&self, _day: u32, _desc: &str) -> Result<CardContent, GenerationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::MissingApiKey)
        }
    }

    fn calendar() -> (AdventCalendar, Arc<Counting>) {
        let state = StateStore::new(Arc::new(MemoryStore::new()));
        let generator = Arc::new(Counting(AtomicUsize::new(0)));
        let cache = ContentCache::load(state.clone(), generator.clone());
        (
            AdventCalendar::new(state, cache, &CalendarConfig::default()),
            generator,
        )
    }

    fn dec(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[test]
    fn grid_reflects_unlocked_day() {
        let (cal, _) = calendar();
        let tiles = cal.tiles_on(dec(3));
        assert_eq!(tiles.len(), 25);
        assert_eq!(tiles[0].status, DayStatus::Open);
        assert!(tiles[2].is_today);
        assert_eq!(tiles[3].status, DayStatus::Locked);
    }

    #[tokio::test]
    async fn locked_day_is_rejected_without_side_effects() {
        let (cal, generator) = calendar();
        let err = cal.open_day_on(10, dec(5)).await.unwrap_err();
        assert_eq!(err, CalendarError::Locked { day: 10, unlocked: 5 });
        assert!(cal.cache().is_empty());
        assert_eq!(generator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn out_of_range_days_are_invalid() {
        let (cal, _) = calendar();
        cal.set_debug_day(Some(99));
        assert_eq!(cal.open_day_on(0, dec(5)).await.unwrap_err(), CalendarError::InvalidDay(0));
        assert_eq!(cal.open_day_on(26, dec(5)).await.unwrap_err(), CalendarError::InvalidDay(26));
    }

    #[tokio::test]
    async fn opened_tile_after_generation() {
        let (cal, _) = calendar();
        let card = cal.open_day_on(1, dec(5)).await.unwrap();
        assert_eq!(card, CardContent::fallback());
        assert_eq!(cal.tiles_on(dec(5))[0].status, DayStatus::Opened);
    }

    #[test]
    fn debug_day_overrides_calendar() {
        let (cal, _) = calendar();
        cal.set_debug_day(Some(-1));
        assert!(cal.tiles_on(dec(20)).iter().all(|t| t.status == DayStatus::Locked));
        cal.set_debug_day(None);
        assert_eq!(cal.unlocked_day_on(dec(20)), 20);
        assert_eq!(cal.progress_on(dec(20)), 80.0);
    }

    #[test]
    fn onboarding_and_reset() {
        let (cal, _) = calendar();
        assert!(cal.complete_onboarding("  ").is_err());
        cal.complete_onboarding(" product designer ").unwrap();
        assert_eq!(cal.profile().description, "product designer");
        cal.reset_profile().unwrap();
        assert!(!cal.profile().is_onboarded());
    }
}
