//! Overseer's signal handling bridge.
//!
//! This crate intercepts the OS signals a process supervisor cares about
//! and converts them into commands for the supervisor's dispatch loop,
//! without ever doing unsafe work inside signal-handling context.
//!
//! The pieces, in delivery order:
//!
//! - [`SignalBridge`] installs a minimal trampoline as the OS handler for
//!   every signal in [`Signal::OBSERVED`], remembering what was there
//!   before so [`SignalBridge::uninstall`] can put it back.
//! - The trampoline runs in signal context and does exactly one thing:
//!   push the signal id through a signal-safe handoff to the main
//!   context. If it cannot, it writes a fixed diagnostic to stderr and
//!   terminates the process, because a supervisor that cannot observe
//!   its own termination signals must not keep running.
//! - [`worker`] consumes the [`Handoff`] on the main context, resolves
//!   each transferred signal through the per-signal policy
//!   ([`action::Action`]), and emits the resulting command through the
//!   [`dispatch::Dispatch`] collaborator. A failing command handler is
//!   logged and terminates the supervisor with exit status 1.
//!
//! ```no_run
//! use overseer_sighandler::{worker, ClientId, Command, DispatchError, SignalBridge};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> miette::Result<()> {
//! let (mut bridge, handoff) = SignalBridge::install()?;
//! let signals = tokio::spawn(worker(
//!     handoff,
//!     |_source: Option<ClientId>, command: Command| -> Result<(), DispatchError> {
//!         println!("supervisor command: {}", command.name);
//!         Ok(())
//!     },
//! ));
//!
//! // ... run the supervisor's command loop ...
//!
//! bridge.uninstall();
//! signals.await.expect("signal worker panicked")?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that this crate logs through [tracing]; wire up a subscriber in
//! the application to see it.

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]

pub mod action;
pub mod dispatch;
pub mod errors;

mod bridge;
mod handoff;
mod worker;

#[doc(inline)]
pub use crate::{
	bridge::SignalBridge,
	dispatch::{ClientId, Command, Dispatch, DispatchError},
	errors::{CriticalError, HandlerError},
	handoff::Handoff,
	worker::worker,
};

#[doc(no_inline)]
pub use overseer_signals::Signal;
