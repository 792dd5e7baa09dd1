//! ClickDispatcher: the registration point hosts use to route clicks.
//!
//! The host installs a [`ClickMiddleware`] once at startup (normally the
//! [`DispatchInterceptor`]), then registers its click handlers.  Each handler
//! captures the middleware that was installed when it was registered, so
//! installing affects every handler registered from then on and leaves earlier
//! ones untouched.
//!
//! # Exemption (for beginners)
//!
//! Some handlers must see every click, e.g. a counter that the user is
//! expected to tap quickly.  Such handlers are registered with
//! [`HandlerOptions::exempt`], which stamps the exemption marker into their
//! [`HandlerDescriptor`].  The interceptor checks the marker before it
//! consults the debounce guard.

use std::collections::HashMap;
use std::sync::Arc;

use click_guard_core::{HandlerDescriptor, HandlerId};
use thiserror::Error;
use tracing::{debug, info};

use super::intercept_click::{
    ClickArg, DispatchInterceptor, ForwardReason, InterceptError, InterceptedCall, Verdict,
};

/// A click handler body.
pub type ClickHandlerFn = Arc<dyn Fn(&[ClickArg]) + Send + Sync>;

/// Error type for dispatcher operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered under this id.
    #[error("no click handler registered with id {0}")]
    UnknownHandler(HandlerId),

    /// `install` was called a second time.
    #[error("a click middleware is already installed")]
    MiddlewareAlreadyInstalled,
}

/// Something that wraps a click handler invocation.
pub trait ClickMiddleware: Send + Sync {
    /// Runs around one call; decides whether `call.proceed()` happens.
    fn around(&self, call: &mut dyn InterceptedCall) -> Verdict;
}

impl ClickMiddleware for DispatchInterceptor {
    fn around(&self, call: &mut dyn InterceptedCall) -> Verdict {
        self.intercept(call)
    }
}

/// Declarative flags attached to a handler at registration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    exempt: bool,
}

impl HandlerOptions {
    /// Options for a handler that must never be debounced.
    pub fn exempt() -> Self {
        Self { exempt: true }
    }

    pub fn is_exempt(&self) -> bool {
        self.exempt
    }
}

struct Registration {
    descriptor: HandlerDescriptor,
    handler: ClickHandlerFn,
    middleware: Option<Arc<dyn ClickMiddleware>>,
}

/// The call object handed to middleware for a registered handler.
struct RegisteredCall<'a> {
    descriptor: &'a HandlerDescriptor,
    handler: &'a ClickHandlerFn,
    args: Vec<ClickArg>,
    proceeded: bool,
}

impl InterceptedCall for RegisteredCall<'_> {
    fn descriptor(&self) -> Result<HandlerDescriptor, InterceptError> {
        Ok(self.descriptor.clone())
    }

    fn args(&self) -> &[ClickArg] {
        &self.args
    }

    fn proceed(&mut self) {
        if !self.proceeded {
            self.proceeded = true;
            (self.handler)(&self.args);
        }
    }
}

/// Registry of click handlers plus the installed middleware.
#[derive(Default)]
pub struct ClickDispatcher {
    middleware: Option<Arc<dyn ClickMiddleware>>,
    handlers: HashMap<HandlerId, Registration>,
}

impl ClickDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the middleware that wraps every handler registered afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MiddlewareAlreadyInstalled`] on a second call.
    pub fn install(&mut self, middleware: Arc<dyn ClickMiddleware>) -> Result<(), DispatchError> {
        if self.middleware.is_some() {
            return Err(DispatchError::MiddlewareAlreadyInstalled);
        }
        self.middleware = Some(middleware);
        info!("click middleware installed");
        Ok(())
    }

    /// Returns `true` once a middleware has been installed.
    pub fn is_installed(&self) -> bool {
        self.middleware.is_some()
    }

    /// Registers a click handler and returns its id.
    pub fn register<F>(&mut self, name: &str, options: HandlerOptions, handler: F) -> HandlerId
    where
        F: Fn(&[ClickArg]) + Send + Sync + 'static,
    {
        let id = HandlerId::new();
        let descriptor = if options.is_exempt() {
            HandlerDescriptor::exempt(id, name)
        } else {
            HandlerDescriptor::new(id, name)
        };
        debug!(
            handler = %id,
            name,
            exempt = options.is_exempt(),
            wrapped = self.middleware.is_some(),
            "registered click handler"
        );
        self.handlers.insert(
            id,
            Registration {
                descriptor,
                handler: Arc::new(handler),
                middleware: self.middleware.clone(),
            },
        );
        id
    }

    /// Removes a handler.  Returns `true` if it was registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    /// Returns the descriptor of a registered handler.
    pub fn descriptor(&self, id: HandlerId) -> Option<&HandlerDescriptor> {
        self.handlers.get(&id).map(|r| &r.descriptor)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Delivers one click to the handler registered under `id`.
    ///
    /// The click goes through the handler's middleware if it has one;
    /// otherwise the handler runs directly and the verdict is
    /// `Forwarded(ForwardReason::Unwrapped)`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownHandler`] if `id` is not registered.
    pub fn dispatch(&self, id: HandlerId, args: Vec<ClickArg>) -> Result<Verdict, DispatchError> {
        let registration = self
            .handlers
            .get(&id)
            .ok_or(DispatchError::UnknownHandler(id))?;

        let mut call = RegisteredCall {
            descriptor: &registration.descriptor,
            handler: &registration.handler,
            args,
            proceeded: false,
        };

        let verdict = match &registration.middleware {
            Some(middleware) => middleware.around(&mut call),
            None => {
                call.proceed();
                Verdict::Forwarded(ForwardReason::Unwrapped)
            }
        };
        Ok(verdict)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
