//! Transient user-facing messages that dismiss themselves after a TTL.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
}

struct Entry {
    notification: Notification,
    // Dropping this wakes the expiry timer.
    _cancel: Option<Sender<()>>,
}

type Entries = Arc<Mutex<Vec<Entry>>>;

/// Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct NotificationCenter {
    entries: Entries,
    ttl: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NotificationCenter {
    /// A zero `ttl` keeps notifications until they are dismissed.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) -> Uuid {
        self.notify_for(level, message, self.ttl)
    }

    pub fn notify_for(&self, level: Level, message: impl Into<String>, ttl: Duration) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        };
        let id = notification.id;

        match level {
            Level::Error => log::error!("{}", notification.message),
            Level::Warning => log::warn!("{}", notification.message),
            Level::Info | Level::Success => log::info!("{}", notification.message),
        }

        if ttl.is_zero() {
            lock(&self.entries).push(Entry {
                notification,
                _cancel: None,
            });
            return id;
        }

        let (tx, rx) = mpsc::channel::<()>();
        lock(&self.entries).push(Entry {
            notification,
            _cancel: Some(tx),
        });
        let entries = Arc::downgrade(&self.entries);
        thread::spawn(move || expire_after(entries, id, rx, ttl));
        id
    }

    /// Remove a notification early. Returns false if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        remove(&self.entries, id)
    }

    /// Currently visible notifications, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        lock(&self.entries)
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

fn expire_after(entries: Weak<Mutex<Vec<Entry>>>, id: Uuid, cancel: mpsc::Receiver<()>, ttl: Duration) {
    // Anything other than a timeout means the entry was dismissed or cleared.
    if let Err(RecvTimeoutError::Timeout) = cancel.recv_timeout(ttl) {
        if let Some(entries) = entries.upgrade() {
            remove(&entries, id);
        }
    }
}

fn remove(entries: &Entries, id: Uuid) -> bool {
    let mut guard = lock(entries);
    let before = guard.len();
    guard.retain(|e| e.notification.id != id);
    guard.len() != before
}

fn lock(entries: &Entries) -> MutexGuard<'_, Vec<Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
