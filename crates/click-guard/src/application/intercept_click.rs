//! Dispatch Interceptor: applies the debounce decision in front of a click handler.
//!
//! The interceptor receives every click-style call before the real handler
//! runs.  It resolves the handler's [`HandlerDescriptor`], pulls the target
//! [`View`] out of the first argument, and asks the [`DebounceGuard`] whether
//! the click may go through.
//!
//! # Fail open
//!
//! The interceptor must never be the reason a button stops working.  Every
//! failure along the way (unknown call shape, missing target, clock error,
//! poisoned state, even a panic) ends with the original handler running:
//!
//! ```text
//! resolve descriptor ──err──┐
//!   exempt? ──yes───────────┤
//! extract target ──err──────┤
//! read clock ──err──────────┼──► proceed()
//! guard.should_accept ──err─┤
//!   accept ─────────────────┘
//!   reject ──────────────────► drop (handler not run)
//! ```
//!
//! `proceed()` is called after the decision is complete and outside the
//! panic boundary, so the handler runs at most once per intercepted call.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use click_guard_core::{Clock, ClockError, DebounceGuard, GuardError, HandlerDescriptor, View};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// One argument passed to a click handler.
///
/// Click handlers conventionally receive the originating [`View`] first; any
/// further arguments are opaque to the interceptor.
pub type ClickArg = Arc<dyn Any + Send + Sync>;

/// Wraps a view handle as a click argument without losing its identity.
pub fn target_arg(view: &Arc<View>) -> ClickArg {
    Arc::clone(view) as ClickArg
}

/// Error type for the interception decision.
///
/// None of these ever reach the caller; they are logged and the click is
/// forwarded.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// Handler metadata could not be determined for the call.
    #[error("could not resolve handler metadata: {0}")]
    Resolution(String),

    /// The call carries no usable click target.
    #[error("no click target: {0}")]
    NoTarget(&'static str),

    #[error("clock read failed: {0}")]
    Clock(#[from] ClockError),

    #[error("debounce guard failed: {0}")]
    Guard(#[from] GuardError),

    /// The decision code panicked.
    #[error("interception panicked: {0}")]
    Panicked(String),
}

impl InterceptError {
    /// `true` for call shapes the interceptor does not understand, as opposed
    /// to failures while evaluating a call it does understand.
    pub fn is_unrecognized_call(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::NoTarget(_))
    }
}

/// A click-style invocation captured before the handler body runs.
///
/// Implemented by whatever mechanism installs the interception: the
/// [`ClickDispatcher`](super::dispatch_registry::ClickDispatcher) for
/// registered handlers, or [`ManualCall`] for manual call-site delegation.
pub trait InterceptedCall {
    /// Resolves the metadata of the handler this call is aimed at.
    fn descriptor(&self) -> Result<HandlerDescriptor, InterceptError>;

    /// The arguments the handler will receive.
    fn args(&self) -> &[ClickArg];

    /// Runs the original handler with the original arguments.
    fn proceed(&mut self);
}

/// Why a call was forwarded to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForwardReason {
    /// The guard accepted the click.
    Accepted,
    /// The handler carries the exemption marker.
    Exempt,
    /// Debouncing is switched off.
    Disabled,
    /// The call shape was not recognized (no descriptor or no target).
    Unrecognized,
    /// Evaluating the decision failed.
    FailedOpen,
    /// No middleware wraps the handler; it ran without being intercepted.
    Unwrapped,
}

/// Result of intercepting one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The handler ran.
    Forwarded(ForwardReason),
    /// The click was dropped as a rapid repeat.
    Suppressed,
}

impl Verdict {
    pub fn was_forwarded(self) -> bool {
        matches!(self, Verdict::Forwarded(_))
    }
}

/// Point-in-time copy of the interceptor's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterceptStats {
    pub accepted: u64,
    pub suppressed: u64,
    pub exempt: u64,
    pub disabled: u64,
    pub unrecognized: u64,
    pub failed_open: u64,
}

#[derive(Default)]
struct StatsCounters {
    accepted: AtomicU64,
    suppressed: AtomicU64,
    exempt: AtomicU64,
    disabled: AtomicU64,
    unrecognized: AtomicU64,
    failed_open: AtomicU64,
}

impl StatsCounters {
    fn record(&self, verdict: Verdict) {
        let counter = match verdict {
            Verdict::Suppressed => &self.suppressed,
            Verdict::Forwarded(ForwardReason::Accepted) => &self.accepted,
            Verdict::Forwarded(ForwardReason::Exempt) => &self.exempt,
            Verdict::Forwarded(ForwardReason::Disabled) => &self.disabled,
            Verdict::Forwarded(ForwardReason::Unrecognized) => &self.unrecognized,
            Verdict::Forwarded(ForwardReason::FailedOpen) => &self.failed_open,
            // Produced by the dispatcher, never by the interceptor.
            Verdict::Forwarded(ForwardReason::Unwrapped) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> InterceptStats {
        InterceptStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            exempt: self.exempt.load(Ordering::Relaxed),
            disabled: self.disabled.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            failed_open: self.failed_open.load(Ordering::Relaxed),
        }
    }
}

/// The Dispatch Interceptor.
///
/// Holds the guard and the clock; only ever reads decisions from the guard,
/// never touches its state directly.
pub struct DispatchInterceptor {
    guard: Arc<DebounceGuard>,
    clock: Arc<dyn Clock>,
    enabled: AtomicBool,
    stats: StatsCounters,
}

impl DispatchInterceptor {
    /// Creates an enabled interceptor.
    pub fn new(guard: Arc<DebounceGuard>, clock: Arc<dyn Clock>) -> Self {
        Self {
            guard,
            clock,
            enabled: AtomicBool::new(true),
            stats: StatsCounters::default(),
        }
    }

    /// Returns whether debouncing is currently applied.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Switches debouncing on or off.  While off, every call is forwarded.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// The guard this interceptor consults.
    pub fn guard(&self) -> &Arc<DebounceGuard> {
        &self.guard
    }

    pub fn stats(&self) -> InterceptStats {
        self.stats.snapshot()
    }

    /// Intercepts one call: forwards it to the handler or drops it.
    pub fn intercept(&self, call: &mut dyn InterceptedCall) -> Verdict {
        let decision = panic::catch_unwind(AssertUnwindSafe(|| self.decide(&*call)))
            .unwrap_or_else(|payload| Err(InterceptError::Panicked(panic_message(&*payload))));

        let verdict = match decision {
            Ok(verdict) => verdict,
            Err(e) if e.is_unrecognized_call() => {
                debug!(error = %e, "forwarding unrecognized click call");
                Verdict::Forwarded(ForwardReason::Unrecognized)
            }
            Err(e) => {
                warn!(error = %e, "click interception failed; forwarding");
                Verdict::Forwarded(ForwardReason::FailedOpen)
            }
        };

        self.stats.record(verdict);
        if verdict.was_forwarded() {
            call.proceed();
        }
        verdict
    }

    fn decide(&self, call: &dyn InterceptedCall) -> Result<Verdict, InterceptError> {
        if !self.is_enabled() {
            return Ok(Verdict::Forwarded(ForwardReason::Disabled));
        }

        let descriptor = call.descriptor()?;
        if descriptor.is_exempt() {
            trace!(handler = descriptor.name(), "handler exempt from debounce");
            return Ok(Verdict::Forwarded(ForwardReason::Exempt));
        }

        let target = extract_target(call.args())?;
        let now = self.clock.now_millis()?;

        if self.guard.should_accept(&target, now)? {
            Ok(Verdict::Forwarded(ForwardReason::Accepted))
        } else {
            debug!(
                handler = descriptor.name(),
                target = target.label(),
                now_ms = now,
                "suppressed rapid repeat click"
            );
            Ok(Verdict::Suppressed)
        }
    }
}

/// Pulls the click target out of the first handler argument.
///
/// # Errors
///
/// Returns [`InterceptError::NoTarget`] if there are no arguments or the first
/// one is not a [`View`].
pub fn extract_target(args: &[ClickArg]) -> Result<Arc<View>, InterceptError> {
    let first = args
        .first()
        .ok_or(InterceptError::NoTarget("argument list is empty"))?;
    Arc::clone(first)
        .downcast::<View>()
        .map_err(|_| InterceptError::NoTarget("first argument is not a view"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ── Manual call-site delegation ───────────────────────────────────────────────

/// A call built by hand at the call site, for hosts that cannot register
/// handlers with a dispatcher.
///
/// ```rust
/// use std::sync::Arc;
/// use click_guard::application::intercept_click::{
///     target_arg, ClickArg, DispatchInterceptor, ManualCall,
/// };
/// use click_guard_core::{DebounceGuard, HandlerDescriptor, HandlerId, MonotonicClock, View};
///
/// let interceptor = DispatchInterceptor::new(
///     Arc::new(DebounceGuard::default()),
///     Arc::new(MonotonicClock::new()),
/// );
/// let button = View::new("send");
/// let descriptor = HandlerDescriptor::new(HandlerId::new(), "send_message");
///
/// let mut call = ManualCall::new(Some(descriptor), vec![target_arg(&button)], |_args: &[ClickArg]| {
///     // handler body
/// });
/// assert!(interceptor.intercept(&mut call).was_forwarded());
/// ```
pub struct ManualCall<F>
where
    F: FnOnce(&[ClickArg]),
{
    descriptor: Option<HandlerDescriptor>,
    args: Vec<ClickArg>,
    body: Option<F>,
}

impl<F> ManualCall<F>
where
    F: FnOnce(&[ClickArg]),
{
    /// Captures a call.  A `None` descriptor models a call whose handler
    /// metadata cannot be resolved.
    pub fn new(descriptor: Option<HandlerDescriptor>, args: Vec<ClickArg>, body: F) -> Self {
        Self {
            descriptor,
            args,
            body: Some(body),
        }
    }

    /// Returns `true` once the handler body has run.
    pub fn proceeded(&self) -> bool {
        self.body.is_none()
    }
}

impl<F> InterceptedCall for ManualCall<F>
where
    F: FnOnce(&[ClickArg]),
{
    fn descriptor(&self) -> Result<HandlerDescriptor, InterceptError> {
        self.descriptor
            .clone()
            .ok_or_else(|| InterceptError::Resolution("call carries no handler descriptor".to_string()))
    }

    fn args(&self) -> &[ClickArg] {
        &self.args
    }

    fn proceed(&mut self) {
        if let Some(body) = self.body.take() {
            body(&self.args);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
