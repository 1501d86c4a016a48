//! Outcome events for whatever layer renders feedback to the user.

use std::{fmt, sync::Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    ValidationError,
    ImbalanceError,
    NotFound,
    StorageError,
}

impl NotificationKind {
    pub fn is_error(self) -> bool {
        self != NotificationKind::Success
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::ValidationError => "validation error",
            NotificationKind::ImbalanceError => "imbalance error",
            NotificationKind::NotFound => "not found",
            NotificationKind::StorageError => "storage error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }
}

impl From<&CoreError> for Notification {
    fn from(err: &CoreError) -> Self {
        let kind = match err {
            CoreError::Validation(_) | CoreError::AlreadyPosted(_) => {
                NotificationKind::ValidationError
            }
            CoreError::Imbalance { .. } => NotificationKind::ImbalanceError,
            CoreError::NotFound { .. } => NotificationKind::NotFound,
            CoreError::Storage(_) | CoreError::Serde(_) | CoreError::Io(_) => {
                NotificationKind::StorageError
            }
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Receives discrete outcome events. Implementations decide how to render them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        if notification.kind.is_error() {
            warn!(kind = %notification.kind, "{}", notification.message);
        } else {
            info!(kind = %notification.kind, "{}", notification.message);
        }
    }
}

/// Buffers notifications until the host drains them.
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.received.lock() {
            Ok(mut received) => std::mem::take(&mut *received),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.received.lock().map(|received| received.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        match self.received.lock() {
            Ok(mut received) => received.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;
    use rust_decimal::Decimal;

    #[test]
    fn errors_map_to_notification_kinds() {
        let imbalance = CoreError::Imbalance {
            total_debits: Decimal::ONE,
            total_credits: Decimal::ZERO,
        };
        assert_eq!(
            Notification::from(&imbalance).kind,
            NotificationKind::ImbalanceError
        );
        let missing = CoreError::not_found(EntityKind::Category, "abc");
        let notification = Notification::from(&missing);
        assert_eq!(notification.kind, NotificationKind::NotFound);
        assert_eq!(notification.message, "Category not found: abc");
    }

    #[test]
    fn memory_sink_drains_in_order() {
        let sink = MemorySink::new();
        sink.notify(Notification::success("one"));
        sink.notify(Notification::success("two"));
        assert_eq!(sink.len(), 2);

        let drained = sink.drain();
        assert_eq!(drained[0].message, "one");
        assert_eq!(drained[1].message, "two");
        assert!(sink.is_empty());
    }
}
