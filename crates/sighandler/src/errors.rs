//! Error types.

use miette::Diagnostic;
use thiserror::Error;

use overseer_signals::Signal;

use crate::dispatch::DispatchError;

/// Errors which prevent the signal bridge from being set up, or from
/// observing its handoff once running.
///
/// These are configuration errors discovered at supervisor startup; they
/// are not recovered from at runtime.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CriticalError {
	/// A bridge is already installed in this process.
	///
	/// Signal handler registration is process-global; install a single
	/// bridge and uninstall it before installing another.
	#[error("signal handlers are already installed")]
	#[diagnostic(code(overseer::sighandler::already_installed))]
	AlreadyInstalled,

	/// The signal-context to main-context handoff could not be created.
	#[error("io(creating signal handoff): {err}")]
	#[diagnostic(code(overseer::sighandler::handoff_init))]
	HandoffInit {
		/// The underlying error.
		#[source]
		err: std::io::Error,
	},

	/// The handler for a signal could not be replaced.
	#[error("installing handler for {signal}: {err}")]
	#[diagnostic(code(overseer::sighandler::register))]
	Register {
		/// The signal whose handler was being replaced.
		signal: Signal,

		/// The underlying error.
		#[source]
		err: std::io::Error,
	},

	/// A signal could not be marked as restarting interrupted system calls.
	#[error("marking {signal} as restartable: {err}")]
	#[diagnostic(code(overseer::sighandler::restartable))]
	Restartable {
		/// The signal being marked.
		signal: Signal,

		/// The underlying error.
		#[source]
		err: std::io::Error,
	},

	/// The main-context side of the handoff failed.
	#[error("io(reading signal handoff): {err}")]
	#[diagnostic(code(overseer::sighandler::handoff_read))]
	HandoffRead {
		/// The underlying error.
		#[source]
		err: std::io::Error,
	},
}

/// A command handler failed while reacting to a signal on the main
/// context.
///
/// Always fatal: the worker logs it and exits the process, as the
/// supervisor's control state may no longer be consistent.
#[derive(Debug, Diagnostic, Error)]
#[error("command handler for {signal} failed: {err}")]
#[diagnostic(code(overseer::sighandler::handler))]
pub struct HandlerError {
	/// Canonical name of the signal being handled.
	pub signal: &'static str,

	/// The underlying dispatch failure.
	#[source]
	pub err: DispatchError,
}
