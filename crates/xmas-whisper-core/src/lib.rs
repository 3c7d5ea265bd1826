//! # Xmas Whisper Core Library
//!
//! Business logic for the Xmas Whisper advent calendar: 25 days, each
//! revealing one curated postcard (a real quote, its translation and a
//! generated image) once the calendar date unlocks it.
//!
//! ## Architecture
//!
//! - **Clock Policy**: derives the currently unlocked day from the local date,
//!   with a demo fallback outside December and a debug override
//! - **Content Cache**: day -> postcard mapping, filled lazily through the
//!   generator, persisted after every insertion, one generation per day
//! - **Notification Gate**: at most one morning reminder per calendar date
//! - **Offline Strategy**: install/activate/fetch lifecycle of the app-shell
//!   request interceptor (network-first navigation, cache-first assets)
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! ## Key Components
//!
//! - [`AdventCalendar`]: view-facing facade over clock, cache and profile
//! - [`ContentCache`]: lazy postcard cache with duplicate-request suppression
//! - [`NotificationGate`]: once-per-day reminder policy
//! - [`OfflineWorker`]: request interceptor over [`CacheStorage`] and [`Fetcher`]
//! - [`StateStore`]: typed access to the persisted records

pub mod calendar;
pub mod clock;
pub mod content;
pub mod error;
pub mod notify;
pub mod offline;
pub mod storage;

pub use calendar::{AdventCalendar, DayStatus, DayTile};
pub use clock::{current_unlocked_day, is_openable, workshop_progress, ADVENT_DAYS};
pub use content::{CardContent, CardGenerator, CardHistory, ContentCache, GeminiGenerator};
pub use error::{
    CalendarError, ConfigError, CoreError, GenerationError, OfflineError, StorageError,
};
pub use notify::{Capability, GateOutcome, Notification, NotificationGate, Notifier, Permission};
pub use offline::{CacheStorage, Fetcher, OfflineWorker, Request, RequestMode, Response};
pub use storage::{Config, Database, KvStore, MemoryStore, StateStore, UserProfile};
