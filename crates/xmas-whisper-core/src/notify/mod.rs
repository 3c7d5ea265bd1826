//! Local notifications: the delivery port and the once-per-day gate.

mod gate;

pub use gate::{
    date_key, is_after_threshold, local_now, run_periodic, select_message, GateOutcome, NotificationGate,
    MESSAGES,
};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// Notification permission as reported by the host environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet decided by the user.
    #[default]
    Default,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Default => "default",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            "default" => Ok(Permission::Default),
            other => Err(format!("unknown permission: {other}")),
        }
    }
}

/// Whether the host can show notifications at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Supported,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Notification {
    /// Sent once, right after the user grants permission.
    pub fn confirmation() -> Self {
        Self {
            title: "🎄 Xmas Whisper".into(),
            body: "通知設定が完了しました。毎朝7:30にお届けします。".into(),
            icon: "/favicon.ico".into(),
        }
    }
}

/// Host notification primitive. Delivery is fire-and-forget.
pub trait Notifier: Send + Sync {
    fn capability(&self) -> Capability;
    fn permission(&self) -> Permission;
    /// Ask the user; only ever called from an explicit user action.
    fn request_permission(&self) -> Permission;
    fn notify(&self, notification: &Notification);
}

/// User-triggered permission request, with the confirmation notification on grant.
pub fn request_permission(notifier: &dyn Notifier) -> Permission {
    if notifier.capability() == Capability::Unsupported {
        info!("notifications are not supported in this environment");
        return Permission::Default;
    }
    let result = notifier.request_permission();
    if result == Permission::Granted {
        notifier.notify(&Notification::confirmation());
    }
    info!(permission = result.as_str(), "notification permission requested");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FakeNotifier {
        capability: Capability,
        answer: Permission,
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for FakeNotifier {
        fn capability(&self) -> Capability {
            self.capability
        }
        fn permission(&self) -> Permission {
            Permission::Default
        }
        fn request_permission(&self) -> Permission {
            self.answer
        }
        fn notify(&self, notification: &Notification) {
            self.sent.lock().push(notification.clone());
        }
    }

    fn fake(capability: Capability, answer: Permission) -> FakeNotifier {
        FakeNotifier {
            capability,
            answer,
            sent: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn grant_sends_confirmation() {
        let n = fake(Capability::Supported, Permission::Granted);
        assert_eq!(request_permission(&n), Permission::Granted);
        assert_eq!(n.sent.lock().as_slice(), &[Notification::confirmation()]);
    }

    #[test]
    fn denial_sends_nothing() {
        let n = fake(Capability::Supported, Permission::Denied);
        assert_eq!(request_permission(&n), Permission::Denied);
        assert!(n.sent.lock().is_empty());
    }

    #[test]
    fn unsupported_never_asks() {
        let n = fake(Capability::Unsupported, Permission::Granted);
        assert_eq!(request_permission(&n), Permission::Default);
        assert!(n.sent.lock().is_empty());
    }

    #[test]
    fn permission_parses() {
        assert_eq!("granted".parse::<Permission>().unwrap(), Permission::Granted);
        assert!("yes".parse::<Permission>().is_err());
        assert_eq!(Permission::Denied.as_str(), "denied");
    }
}
