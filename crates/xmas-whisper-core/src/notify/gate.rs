//! Morning reminder gate.
//!
//! Fires at most once per local calendar date, on the first check at or
//! after the delivery time (07:30 by default). There is no upper bound: a
//! check at 23:59 on a day that has not been notified yet still fires.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::{Capability, Notification, Notifier, Permission};
use crate::storage::{NotificationsConfig, StateStore};

/// Candidate reminder bodies, picked by `day_of_month % MESSAGES.len()`.
pub const MESSAGES: [&str; 10] = [
    "🎄✨ おはようございます。今日の素敵な言葉が届いていますよ。",
    "🎅🎁 サンタさんの準備が進んでいます。あなたのカードも到着しました。",
    "❄️☃️ 寒い朝ですね。心温まるメッセージを読んでみませんか？",
    "🕯️🌟 7時30分のお知らせです。新しい扉を開く時間ですよ。",
    "🦌🔔 リンリン！トナカイが今日のカードを運んできました。",
    "🍪🥛 クリスマスの足音が聞こえてきます。今日の一枚をどうぞ。",
    "🎁🧣 あなたへの特別なメッセージがポストに入っています。",
    "⭐👼 聖なる季節の輝きを、今日のカードから感じてください。",
    "🎼🎹 静かな朝に、あなたへの励ましの言葉を贈ります。",
    "🎄🕯️ 今日も一日頑張るあなたへ。サンタからの応援メッセージです。",
];

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Fired { message: String },
    AlreadyNotified,
    TooEarly,
    NotPermitted(Permission),
    Unsupported,
    /// Due, but the date could not be recorded; nothing was sent.
    NotRecorded,
}

/// Calendar-date identifier stored as the last notification date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `time` is at or after `hour:minute`.
pub fn is_after_threshold(time: NaiveTime, hour: u32, minute: u32) -> bool {
    time.hour() > hour || (time.hour() == hour && time.minute() >= minute)
}

pub fn select_message<'a>(day_of_month: u32, messages: &[&'a str]) -> Option<&'a str> {
    if messages.is_empty() {
        return None;
    }
    Some(messages[day_of_month as usize % messages.len()])
}

pub struct NotificationGate {
    state: StateStore,
    hour: u32,
    minute: u32,
    title: String,
    icon: String,
}

impl NotificationGate {
    pub fn new(state: StateStore, config: &NotificationsConfig) -> Self {
        Self {
            state,
            hour: config.hour,
            minute: config.minute,
            title: config.title.clone(),
            icon: config.icon.clone(),
        }
    }

    /// Evaluate the gate at local time `now`, notifying through `notifier` when due.
    pub fn check(&self, now: NaiveDateTime, notifier: &dyn Notifier) -> GateOutcome {
        if notifier.capability() == Capability::Unsupported {
            return GateOutcome::Unsupported;
        }
        let permission = notifier.permission();
        if permission != Permission::Granted {
            return GateOutcome::NotPermitted(permission);
        }

        let today = date_key(now.date());
        if self.state.last_notified().as_deref() == Some(today.as_str()) {
            return GateOutcome::AlreadyNotified;
        }
        if !is_after_threshold(now.time(), self.hour, self.minute) {
            return GateOutcome::TooEarly;
        }

        // Record before sending so a storage failure can never repeat the reminder.
        if let Err(e) = self.state.set_last_notified(&today) {
            error!(date = %today, error = %e, "failed to record notification date, skipping");
            return GateOutcome::NotRecorded;
        }
        let message = select_message(now.day(), &MESSAGES).unwrap_or_default().to_string();
        notifier.notify(&Notification {
            title: self.title.clone(),
            body: message.clone(),
            icon: self.icon.clone(),
        });
        info!(date = %today, "daily notification sent");
        GateOutcome::Fired { message }
    }
}

/// Check immediately, then every `every`, until `shutdown` resolves.
pub async fn run_periodic<F>(
    gate: &NotificationGate,
    notifier: &dyn Notifier,
    every: Duration,
    clock: impl Fn() -> NaiveDateTime,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    if notifier.capability() == Capability::Unsupported {
        debug!("notifications unsupported, reminder loop disabled");
        return;
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let outcome = gate.check(clock(), notifier);
                debug!(?outcome, "notification check");
            }
        }
    }
}

/// Local wall clock, for [`run_periodic`].
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
