//! Scripted click source for tests and the demo binary.
//!
//! Allows callers to inject synthetic [`ClickEvent`]s without a UI toolkit.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{ClickEvent, ClickSource, SourceError};

/// A [`ClickSource`] whose clicks are injected by hand.
#[derive(Clone, Default)]
pub struct ScriptedClickSource {
    sender: Arc<Mutex<Option<UnboundedSender<ClickEvent>>>>,
}

impl ScriptedClickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a click, as if delivered by the host.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotRunning`] before `start()`, after `stop()`,
    /// or once the receiver has been dropped.
    pub fn inject(&self, event: ClickEvent) -> Result<(), SourceError> {
        let guard = self.sender.lock().map_err(|_| SourceError::NotRunning)?;
        let sender = guard.as_ref().ok_or(SourceError::NotRunning)?;
        sender.send(event).map_err(|_| SourceError::NotRunning)
    }
}

impl ClickSource for ScriptedClickSource {
    fn start(&self) -> Result<UnboundedReceiver<ClickEvent>, SourceError> {
        let mut guard = self.sender.lock().map_err(|_| SourceError::NotRunning)?;
        if guard.is_some() {
            return Err(SourceError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        if let Ok(mut guard) = self.sender.lock() {
            *guard = None;
        }
    }
}
