//! Application layer use cases for Click Guard.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules) and the infrastructure (OS/file system/UI host).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "run this
//!   click handler unless the same button was just clicked").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the clock or the host's dispatch mechanism can be swapped freely.
//! - **Contain no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`intercept_click`**   – The Dispatch Interceptor.  Sits in front of a
//!   click handler, asks the `DebounceGuard` for a decision, and runs the
//!   handler only when allowed.  Any internal failure forwards the click.
//!
//! - **`dispatch_registry`** – The registration point the host uses: install
//!   the interceptor once, register handlers, dispatch clicks by handler id.

pub mod dispatch_registry;
pub mod intercept_click;
