//! Click event sources: where the host's click deliveries come from.
//!
//! A real host (a widget toolkit's event loop) turns pointer input into
//! "handler H was clicked on view V" deliveries.  This module abstracts that
//! behind the [`ClickSource`] trait: a source hands out a channel of
//! [`ClickEvent`]s, and [`run_dispatch_loop`] drains it into a
//! [`ClickDispatcher`], one event at a time, the way a UI thread would.
//!
//! # Testability
//!
//! [`mock::ScriptedClickSource`] lets tests and the demo binary inject
//! synthetic clicks without any UI toolkit.

use std::fmt;
use std::sync::Arc;

use click_guard_core::{HandlerId, View};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::application::dispatch_registry::ClickDispatcher;
use crate::application::intercept_click::{target_arg, ClickArg, Verdict};

pub mod mock;

/// One click delivered by the host.
#[derive(Clone)]
pub struct ClickEvent {
    /// The handler the host resolved for this click.
    pub handler: HandlerId,
    /// Arguments for the handler; by convention the originating view first.
    pub args: Vec<ClickArg>,
}

impl ClickEvent {
    /// A click on `view` aimed at `handler`.
    pub fn on(handler: HandlerId, view: &Arc<View>) -> Self {
        Self {
            handler,
            args: vec![target_arg(view)],
        }
    }

    /// A click with an arbitrary argument list.
    pub fn with_args(handler: HandlerId, args: Vec<ClickArg>) -> Self {
        Self { handler, args }
    }
}

impl fmt::Debug for ClickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickEvent")
            .field("handler", &self.handler)
            .field("args", &self.args.len())
            .finish()
    }
}

/// Error type for click source operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("click source has already been started")]
    AlreadyStarted,
    #[error("click source is not running")]
    NotRunning,
}

/// Trait abstracting click event production.
pub trait ClickSource: Send {
    /// Starts the source and returns a receiver for delivered clicks.
    fn start(&self) -> Result<UnboundedReceiver<ClickEvent>, SourceError>;
    /// Stops the source; the receiver sees the channel close.
    fn stop(&self);
}

/// Totals from one run of [`run_dispatch_loop`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub forwarded: u64,
    pub suppressed: u64,
    pub unknown_handler: u64,
}

/// Drains `rx` into `dispatcher` until the channel closes.
///
/// Events are dispatched strictly one after another, so clicks on one view
/// never race each other through the guard.
pub async fn run_dispatch_loop(
    dispatcher: Arc<ClickDispatcher>,
    mut rx: UnboundedReceiver<ClickEvent>,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    while let Some(event) = rx.recv().await {
        match dispatcher.dispatch(event.handler, event.args) {
            Ok(Verdict::Suppressed) => summary.suppressed += 1,
            Ok(Verdict::Forwarded(reason)) => {
                debug!(handler = %event.handler, ?reason, "click forwarded");
                summary.forwarded += 1;
            }
            Err(e) => {
                warn!("dropping click: {e}");
                summary.unknown_handler += 1;
            }
        }
    }
    summary
}
