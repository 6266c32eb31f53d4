use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);
pub const ERROR_TOAST_LIFETIME: Duration = Duration::from_secs(5);
pub const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    fn lifetime(self) -> Duration {
        match self {
            ToastKind::Error => ERROR_TOAST_LIFETIME,
            ToastKind::Success | ToastKind::Info | ToastKind::Warning => TOAST_LIFETIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    expires_at: Instant,
}

/// Transient notifications, newest first.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!(?kind, message = %message, "toast");
        self.items.push_front(Toast {
            kind,
            message,
            expires_at: now + kind.lifetime(),
        });
        self.items.truncate(MAX_TOASTS);
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Success, message, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Error, message, now);
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Info, message, now);
    }

    pub fn warning(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Warning, message, now);
    }

    pub fn dismiss_newest(&mut self) -> bool {
        self.items.pop_front().is_some()
    }

    /// Drops expired toasts; returns whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|toast| toast.expires_at > now);
        before != self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
