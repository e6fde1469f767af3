//! Injected host capabilities.
//!
//! The debugging host supplies file dialogs, transient notifications, and
//! a persistence slot for the inspector's own view state. Each is a small
//! trait the embedder implements; filesystem-backed versions live in
//! [`fs`] for tests and standalone embedding.

mod fs;

pub use fs::{FsFileExchange, JsonSessionStore};

use crate::error::Result;
use parking_lot::RwLock;
use std::path::PathBuf;

/// A file picked by the user, with its raw contents.
#[derive(Clone, Debug)]
pub struct ImportedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// File save/open capability.
pub trait FileExchange {
    /// Save `contents` under a host-chosen location seeded with
    /// `default_name`. Returns the written path.
    fn export_file(&self, default_name: &str, contents: &str) -> Result<PathBuf>;

    /// Let the user pick a file to read. `None` when the pick was
    /// cancelled.
    fn import_file(&self) -> Result<Option<ImportedFile>>;
}

/// Transient user-visible notifications.
pub trait Notifier {
    /// Surface an error notification. Fire-and-forget, no acknowledgement.
    fn notify_error(&self, message: &str, description: &str);
}

/// Persistence slot for the inspector's serialized view state.
pub trait SessionStore {
    /// Persist the serialized session, replacing any prior one.
    fn save(&self, serialized: &str) -> Result<()>;

    /// Load the previously saved session, if any.
    fn load(&self) -> Result<Option<String>>;
}

/// Notifier that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_error(&self, _message: &str, _description: &str) {}
}

/// A captured notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub description: String,
}

/// Notifier that records notifications for later inspection.
#[derive(Default)]
pub struct MemoryNotifier {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.write())
    }
}

impl Notifier for MemoryNotifier {
    fn notify_error(&self, message: &str, description: &str) {
        self.notifications.write().push(Notification {
            message: message.to_string(),
            description: description.to_string(),
        });
    }
}

/// Session store holding the serialized session in memory.
#[derive(Default)]
pub struct MemorySessionStore {
    saved: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, serialized: &str) -> Result<()> {
        *self.saved.write() = Some(serialized.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.saved.read().clone())
    }
}
