//! Main-context side of the bridge: turns transferred signals into
//! supervisor commands.

use std::backtrace::Backtrace;

use tracing::{debug, error, info, trace};

use overseer_signals::{name_of_raw, Signal};

use crate::{
	action::Action,
	dispatch::Dispatch,
	errors::{CriticalError, HandlerError},
	handoff::Handoff,
};

/// Launches the signal dispatch worker.
///
/// This is the main-context consumer of the [`Handoff`]: run exactly one
/// per installed bridge. Each successfully transferred signal is
/// resolved and handled once, in arrival order; the dispatcher may block,
/// which is the supervisor's normal operational model. The worker
/// returns `Ok(())` once the bridge is uninstalled and the handoff has
/// drained.
///
/// If a command handler fails, the failure is logged with its message
/// and a diagnostic trace and the process exits with status 1: an
/// unhandled fault while reacting to a lifecycle signal leaves the
/// supervisor's control state unknown.
pub async fn worker<D: Dispatch>(handoff: Handoff, dispatcher: D) -> Result<(), CriticalError> {
	imp_worker(handoff, dispatcher).await
}

#[cfg(unix)]
async fn imp_worker<D: Dispatch>(handoff: Handoff, dispatcher: D) -> Result<(), CriticalError> {
	use tokio::io::{unix::AsyncFd, Interest};

	debug!("launching signal dispatch worker");

	let pipe = AsyncFd::with_interest(handoff.pipe, Interest::READABLE)
		.map_err(|err| CriticalError::HandoffRead { err })?;

	loop {
		let mut ready = pipe
			.readable()
			.await
			.map_err(|err| CriticalError::HandoffRead { err })?;

		let mut buf = [0_u8; 16];
		match ready.try_io(|inner| read_pipe(inner.get_ref(), &mut buf)) {
			Ok(Ok(0)) => {
				debug!("signal handoff closed, worker finishing");
				return Ok(());
			}
			Ok(Ok(n)) => {
				for raw in &buf[..n] {
					react(i32::from(*raw), &dispatcher).unwrap_or_else(|err| fatal(&err));
				}
			}
			Ok(Err(err)) if err.kind() == std::io::ErrorKind::Interrupted => continue,
			Ok(Err(err)) => return Err(CriticalError::HandoffRead { err }),
			Err(_would_block) => continue,
		}
	}
}

#[cfg(unix)]
fn read_pipe(pipe: &std::os::fd::OwnedFd, buf: &mut [u8]) -> std::io::Result<usize> {
	use std::os::fd::AsRawFd;

	let n = unsafe { libc::read(pipe.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
	if n < 0 {
		Err(std::io::Error::last_os_error())
	} else {
		Ok(n.unsigned_abs())
	}
}

#[cfg(windows)]
async fn imp_worker<D: Dispatch>(handoff: Handoff, dispatcher: D) -> Result<(), CriticalError> {
	use std::time::Duration;

	debug!("launching signal dispatch worker");

	// The pending mask has no wakeup edge; poll it on a short interval.
	let mut tick = tokio::time::interval(Duration::from_millis(50));
	loop {
		tick.tick().await;

		for raw in handoff.drain() {
			react(raw, &dispatcher).unwrap_or_else(|err| fatal(&err));
		}

		if !handoff.is_open() {
			// One final drain for anything set during teardown.
			for raw in handoff.drain() {
				react(raw, &dispatcher).unwrap_or_else(|err| fatal(&err));
			}
			debug!("signal handoff closed, worker finishing");
			return Ok(());
		}
	}
}

/// Handles one transferred signal: registry, policy table, dispatch.
fn react<D: Dispatch>(raw: i32, dispatcher: &D) -> Result<(), HandlerError> {
	// Ids the platform has no name for are dropped, not errors.
	let Some(name) = name_of_raw(raw) else {
		trace!(raw, "transfer for unnamed signal, dropping");
		return Ok(());
	};

	info!(signal = %name, "got signal");

	// Signals observed but without a registered action are expected and
	// silently ignored.
	let Some(action) = Signal::from_raw(raw).and_then(Action::for_signal) else {
		trace!(signal = %name, "no action registered");
		return Ok(());
	};

	let Some(command) = action.command() else {
		trace!(signal = %name, "action is an explicit no-op");
		return Ok(());
	};

	debug!(signal = %name, command = %command.name, "dispatching");
	dispatcher
		.dispatch(None, command)
		.map_err(|err| HandlerError { signal: name, err })
}

fn fatal(err: &HandlerError) -> ! {
	// An unhandled fault while reacting to a lifecycle signal leaves the
	// supervisor's control state unknown.
	error!(
		%err,
		trace = %Backtrace::force_capture(),
		"signal command handler failed, exiting"
	);
	std::process::exit(1);
}
