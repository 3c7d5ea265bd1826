//! Notification gate over durable storage, across restarts.

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::Arc;
use xmas_whisper_core::notify::{request_permission, MESSAGES};
use xmas_whisper_core::storage::NotificationsConfig;
use xmas_whisper_core::{
    Capability, Database, GateOutcome, Notification, NotificationGate, Notifier, Permission,
    StateStore,
};

/// Notifier whose permission lives in the state store, like the CLI's.
struct StoredNotifier {
    state: StateStore,
    capability: Capability,
    sent: Mutex<Vec<Notification>>,
}

impl Notifier for StoredNotifier {
    fn capability(&self) -> Capability {
        self.capability
    }
    fn permission(&self) -> Permission {
        self.state.permission()
    }
    fn request_permission(&self) -> Permission {
        let _ = self.state.set_permission(Permission::Granted);
        Permission::Granted
    }
    fn notify(&self, notification: &Notification) {
        self.sent.lock().push(notification.clone());
    }
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 12, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn setup(path: &std::path::Path, capability: Capability) -> (NotificationGate, StoredNotifier) {
    let state = StateStore::new(Arc::new(Database::open_at(path).unwrap()));
    let gate = NotificationGate::new(state.clone(), &NotificationsConfig::default());
    let notifier = StoredNotifier {
        state,
        capability,
        sent: Mutex::new(Vec::new()),
    };
    (gate, notifier)
}

#[test]
fn at_most_once_per_day_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xmas-whisper.db");

    let (gate, notifier) = setup(&path, Capability::Supported);
    assert!(matches!(
        gate.check(at(1, 8, 0), &notifier),
        GateOutcome::NotPermitted(Permission::Default)
    ));
    assert_eq!(request_permission(&notifier), Permission::Granted);
    assert_eq!(notifier.sent.lock().len(), 1);

    assert_eq!(
        gate.check(at(1, 8, 0), &notifier),
        GateOutcome::Fired {
            message: MESSAGES[1].to_string()
        }
    );
    drop((gate, notifier));

    let (gate, notifier) = setup(&path, Capability::Supported);
    for minute in 0..60 {
        assert_eq!(gate.check(at(1, 9, minute), &notifier), GateOutcome::AlreadyNotified);
    }
    assert!(notifier.sent.lock().is_empty());
    assert!(matches!(gate.check(at(2, 7, 30), &notifier), GateOutcome::Fired { .. }));
}

#[test]
fn unsupported_environment_disables_gate() {
    let dir = tempfile::tempdir().unwrap();
    let (gate, notifier) = setup(&dir.path().join("db"), Capability::Unsupported);
    assert_eq!(request_permission(&notifier), Permission::Default);
    assert_eq!(gate.check(at(5, 12, 0), &notifier), GateOutcome::Unsupported);
    assert!(notifier.sent.lock().is_empty());
}
