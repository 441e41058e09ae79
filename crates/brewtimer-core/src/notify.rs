//! Notification dispatch for step transitions.
//!
//! Delivery is fire-and-forget: a sink gets every event of the session in
//! order, after the snapshot for that change has been published, and nothing
//! it does feeds back into the timer.

use tracing::info;

use crate::events::Event;
use crate::storage::NotificationsConfig;
use crate::timer::format_clock;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Writes notification events to the `tracing` log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    config: NotificationsConfig,
}

impl LogNotifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    /// Human-readable notification text, or `None` if this event is
    /// filtered out by the config.
    pub fn message_for(&self, event: &Event) -> Option<String> {
        if !self.config.enabled || !event.is_notification() {
            return None;
        }
        match event {
            Event::StepStarted {
                step_index,
                step_name,
                duration_secs,
                target_water,
                ..
            } if self.config.step_started => {
                let water = target_water
                    .map(|w| format!(", pour to {w:.0} g"))
                    .unwrap_or_default();
                Some(format!(
                    "Step {}: {} ({}{})",
                    step_index + 1,
                    step_name,
                    format_clock(*duration_secs),
                    water
                ))
            }
            Event::StepCompleted {
                step_index,
                step_name,
                ..
            } if self.config.step_completed => {
                Some(format!("Step {} done: {}", step_index + 1, step_name))
            }
            Event::OvertimeEntered { .. } if self.config.overtime => {
                Some("All steps done. Finish when your brew is ready.".to_string())
            }
            _ => None,
        }
    }
}

impl NotificationSink for LogNotifier {
    fn notify(&self, event: &Event) {
        if let Some(message) = self.message_for(event) {
            info!(event = event.kind(), "{}", message);
        }
    }
}
