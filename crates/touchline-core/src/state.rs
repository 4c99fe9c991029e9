//! Shared client-facing state types.

use crate::error::Error;

/// How long a notice stays visible.
pub const NOTICE_TTL_MS: i64 = 3_000;

/// Sync status published by the sync engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pulling,
    Pushing,
    Synced,
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Short-lived, auto-dismissing message shown after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at_ms: i64,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>, now_ms: i64) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at_ms: now_ms.saturating_add(NOTICE_TTL_MS),
        }
    }

    pub fn success(message: impl Into<String>, now_ms: i64) -> Self {
        Self::new(NoticeLevel::Success, message, now_ms)
    }

    /// Transient failures (busy, network) are warnings, the rest errors.
    pub fn from_error(error: &Error, now_ms: i64) -> Self {
        let level = if error.is_transient() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        Self::new(level, error.to_string(), now_ms)
    }

    pub const fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_ttl() {
        let notice = Notice::success("Data received!", 1_000);
        assert!(!notice.is_expired(3_999));
        assert!(notice.is_expired(4_000));
    }

    #[test]
    fn notice_level_follows_error_kind() {
        assert_eq!(
            Notice::from_error(&Error::SyncBusy, 0).level,
            NoticeLevel::Warning
        );
        assert_eq!(
            Notice::from_error(&Error::Parse("bad".into()), 0).level,
            NoticeLevel::Error
        );
    }
}
