//! Transient user notifications ("toasts").

use strum_macros::Display;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
}

impl Toast {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            description: Some(description.into()),
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            title: title.into(),
            description: None,
        }
    }
}

/// Sink for toasts. Implemented by whatever surface shows them.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Logs every toast and fans it out to subscribers.
#[derive(Debug, Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<Toast>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }
}

impl Notifier for NotificationService {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => warn!(
                title = %toast.title,
                description = toast.description.as_deref().unwrap_or_default(),
                "error notification"
            ),
            kind => info!(%kind, title = %toast.title, "notification"),
        }
        let _ = self.sender.send(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_toasts_in_order() {
        let service = NotificationService::new();
        let mut rx = service.subscribe();

        service.notify(Toast::success("Fixed cost created"));
        service.notify(Toast::error("Could not delete lead", "Lead not found"));

        assert_eq!(rx.recv().await.unwrap().title, "Fixed cost created");
        let err = rx.recv().await.unwrap();
        assert_eq!(err.kind, ToastKind::Error);
        assert_eq!(err.description.as_deref(), Some("Lead not found"));
    }

    #[test]
    fn test_notify_without_subscribers_is_harmless() {
        NotificationService::new().notify(Toast::info("Saved"));
    }
}
