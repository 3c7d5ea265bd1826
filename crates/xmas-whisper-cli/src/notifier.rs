use xmas_whisper_core::{Capability, Notification, Notifier, Permission, StateStore};

/// Prints reminders to stdout. Permission is remembered in the state store,
/// standing in for the browser's per-site setting.
pub struct ConsoleNotifier {
    state: StateStore,
    enabled: bool,
}

impl ConsoleNotifier {
    pub fn new(state: StateStore, enabled: bool) -> Self {
        Self { state, enabled }
    }

    pub fn revoke(&self) -> Result<(), xmas_whisper_core::StorageError> {
        self.state.set_permission(Permission::Denied)
    }
}

impl Notifier for ConsoleNotifier {
    fn capability(&self) -> Capability {
        if self.enabled {
            Capability::Supported
        } else {
            Capability::Unsupported
        }
    }

    fn permission(&self) -> Permission {
        self.state.permission()
    }

    fn request_permission(&self) -> Permission {
        match self.state.set_permission(Permission::Granted) {
            Ok(()) => Permission::Granted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to store notification permission");
                self.state.permission()
            }
        }
    }

    fn notify(&self, notification: &Notification) {
        println!("🔔 {}: {}", notification.title, notification.body);
    }
}
