//! Non-fatal user notices (rejected files, failed or cancelled uploads).

use std::collections::VecDeque;

/// Display time for ordinary notices, in milliseconds.
const DEFAULT_DURATION_MS: u64 = 4000;

/// Errors stay longer on screen.
const ERROR_DURATION_MS: u64 = 6000;

/// Severity of a notice. Cancellations are `Info`, never `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// FIFO of pending notices with monotonic ids.
///
/// Auto-dismissal timers belong to the host UI; the queue only stores.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
    next_id: u64,
}

impl NoticeQueue {
    /// Queues a notice and returns its id.
    pub fn push(
        &mut self,
        level: NoticeLevel,
        title: impl Into<String>,
        message: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push_back(Notice {
            id,
            level,
            title: title.into(),
            message,
            duration_ms: level.duration_ms(),
        });
        id
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Removes and returns every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}
