//! Reminder trigger computation.
//!
//! # Responsibility
//! - Derive notification trigger instants from the current expiring set.
//! - Hand a complete batch to an external delivery collaborator.
//!
//! # Invariants
//! - Every call re-derives the full batch; previous batches are void.
//! - `trigger_at = expiry instant - reminder_days * 86_400_000 ms`.
//! - Triggers already in the past are still emitted; whether they fire
//!   immediately or are dropped is the sink's decision.
//! - `reschedule` cancels pending notifications before scheduling any new
//!   one, and schedules nothing if cancelling fails.

use crate::expiry::{expiry_instant, parse_expiry, MILLIS_PER_DAY};
use crate::model::item::Item;
use crate::repo::item_repo::ItemRepository;
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};

/// Default look-ahead used when scheduling reminders.
pub const DEFAULT_LEAD_WINDOW_DAYS: u32 = 7;

/// One computed reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTrigger {
    pub item: Item,
    pub trigger_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl ReminderTrigger {
    /// Builds the trigger for one item; `None` when its expiry is unparsable.
    pub fn for_item(item: Item) -> Option<Self> {
        let expiry = parse_expiry(&item.expiry_date)?;
        let lead = Duration::milliseconds(i64::from(item.reminder_days) * MILLIS_PER_DAY);
        Some(Self {
            trigger_at: expiry_instant(expiry) - lead,
            title: format!("{} expiring soon!", item.name),
            body: format!("Expires on {}", item.expiry_date),
            item,
        })
    }

    /// Whether the trigger instant lies strictly before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.trigger_at < now
    }
}

/// External notification delivery collaborator.
pub trait NotificationSink {
    fn cancel_all_pending(&mut self) -> Result<(), String>;
    fn schedule_at(&mut self, title: &str, body: &str, at: DateTime<Utc>) -> Result<(), String>;
}

/// Outcome of applying a batch to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RescheduleReport {
    pub cancelled: bool,
    pub scheduled: usize,
    pub failed: usize,
}

pub struct ReminderScheduler {
    repo: ItemRepository,
}

impl ReminderScheduler {
    pub fn new(repo: ItemRepository) -> Self {
        Self { repo }
    }

    pub fn compute_triggers(&self, lead_window_days: u32) -> Vec<ReminderTrigger> {
        self.compute_triggers_at(lead_window_days, Utc::now())
    }

    pub fn compute_triggers_at(
        &self,
        lead_window_days: u32,
        now: DateTime<Utc>,
    ) -> Vec<ReminderTrigger> {
        self.repo
            .get_expiring_at(lead_window_days, now)
            .into_iter()
            .filter_map(ReminderTrigger::for_item)
            .collect()
    }

    /// Replaces every pending notification with a freshly derived batch.
    pub fn reschedule(
        &self,
        sink: &mut dyn NotificationSink,
        lead_window_days: u32,
    ) -> RescheduleReport {
        self.reschedule_at(sink, lead_window_days, Utc::now())
    }

    pub fn reschedule_at(
        &self,
        sink: &mut dyn NotificationSink,
        lead_window_days: u32,
        now: DateTime<Utc>,
    ) -> RescheduleReport {
        if let Err(err) = sink.cancel_all_pending() {
            error!(
                "event=reminder_reschedule module=service status=error error_code=cancel_failed error={}",
                err
            );
            return RescheduleReport::default();
        }

        let mut report = RescheduleReport {
            cancelled: true,
            ..RescheduleReport::default()
        };
        for trigger in self.compute_triggers_at(lead_window_days, now) {
            match sink.schedule_at(&trigger.title, &trigger.body, trigger.trigger_at) {
                Ok(()) => report.scheduled += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        "event=reminder_schedule module=service status=error item_id={} error={}",
                        trigger.item.id, err
                    );
                }
            }
        }

        info!(
            "event=reminder_reschedule module=service status=ok lead_days={} scheduled={} failed={}",
            lead_window_days, report.scheduled, report.failed
        );
        report
    }
}
