//! Installs and removes the process-wide signal handlers.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use overseer_signals::Signal;

use crate::{
	errors::CriticalError,
	handoff::{self, Handoff, NotifyGuard},
};

#[cfg(unix)]
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal as NixSignal};

/// Signal handler registration is process-global, so only one bridge may
/// be installed at a time.
static INSTALLED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
type Previous = Vec<(NixSignal, SigAction)>;
#[cfg(windows)]
type Previous = Vec<(libc::c_int, libc::sighandler_t)>;

/// Owns the process-wide signal registration state.
///
/// [`install`](SignalBridge::install) replaces the handler for every
/// signal in [`Signal::OBSERVED`] with the bridge's trampoline, keeping
/// the previous handlers so [`uninstall`](SignalBridge::uninstall) can
/// put them back. Dropping an installed bridge uninstalls it.
pub struct SignalBridge {
	previous: Previous,
	notify: Option<NotifyGuard>,
	installed: bool,
}

impl SignalBridge {
	/// Takes over the observed signals for this process.
	///
	/// Call once during supervisor startup, before entering the command
	/// loop, and hand the returned [`Handoff`] to
	/// [`worker`](crate::worker()). On Unix this also marks `SIGQUIT` and
	/// `SIGUSR1` so system calls interrupted by their delivery are
	/// restarted rather than aborted, keeping concurrent I/O paths from
	/// failing spuriously.
	///
	/// Any failure here is a configuration error to surface at startup:
	/// nothing is recovered at runtime. A second install without an
	/// intervening uninstall returns
	/// [`CriticalError::AlreadyInstalled`].
	pub fn install() -> Result<(Self, Handoff), CriticalError> {
		if INSTALLED.swap(true, Ordering::SeqCst) {
			return Err(CriticalError::AlreadyInstalled);
		}

		info!("registering signal handlers");
		let (notify, handoff) = match handoff::pair() {
			Ok(pair) => pair,
			Err(err) => {
				INSTALLED.store(false, Ordering::SeqCst);
				return Err(err);
			}
		};

		let mut bridge = Self {
			previous: Vec::with_capacity(Signal::OBSERVED.len()),
			notify: Some(notify),
			installed: true,
		};

		// On a partial failure, dropping `bridge` here restores whatever
		// had already been replaced.
		bridge.register_all()?;
		Ok((bridge, handoff))
	}

	/// Best-effort restoration of the handlers recorded at install time.
	///
	/// Individual restorations the OS refuses are logged and skipped;
	/// this never fails. Closing the handoff afterwards lets the worker
	/// drain any already-transferred signals and finish.
	pub fn uninstall(&mut self) {
		if !self.installed {
			return;
		}
		self.installed = false;

		self.restore_all();

		// Handlers are back in place; now tear down the handoff.
		self.notify = None;
		INSTALLED.store(false, Ordering::SeqCst);
		debug!("signal handlers removed");
	}

	#[cfg(unix)]
	fn register_all(&mut self) -> Result<(), CriticalError> {
		let action = SigAction::new(
			SigHandler::Handler(handoff::trampoline),
			SaFlags::empty(),
			SigSet::empty(),
		);

		for sig in Signal::OBSERVED {
			// Observed signals all exist on the platform they are observed on.
			let Some(nix_sig) = sig.to_nix() else { continue };
			trace!(signal = %sig, "installing trampoline");
			let old = unsafe { sigaction(nix_sig, &action) }.map_err(|err| {
				CriticalError::Register {
					signal: *sig,
					err: err.into(),
				}
			})?;
			self.previous.push((nix_sig, old));
		}

		// Keep SIGQUIT and SIGUSR1 deliveries from aborting system calls
		// in flight elsewhere in the supervisor: restart them instead.
		for sig in [Signal::Quit, Signal::User1] {
			mark_restartable(sig)?;
		}

		Ok(())
	}

	#[cfg(windows)]
	fn register_all(&mut self) -> Result<(), CriticalError> {
		for sig in Signal::OBSERVED {
			let Some(raw) = sig.to_raw() else { continue };
			trace!(signal = %sig, "installing trampoline");
			let prev = unsafe {
				libc::signal(raw, handoff::trampoline as *const () as libc::sighandler_t)
			};
			if prev == libc::SIG_ERR {
				return Err(CriticalError::Register {
					signal: *sig,
					err: std::io::Error::last_os_error(),
				});
			}
			self.previous.push((raw, prev));
		}

		Ok(())
	}

	#[cfg(unix)]
	fn restore_all(&mut self) {
		for (sig, old) in self.previous.drain(..) {
			// The OS can refuse an individual restoration; nothing useful
			// can be done about that at teardown.
			if let Err(err) = unsafe { sigaction(sig, &old) } {
				trace!(signal = %sig, %err, "could not restore previous handler");
			}
		}
	}

	#[cfg(windows)]
	fn restore_all(&mut self) {
		for (raw, prev) in self.previous.drain(..) {
			if unsafe { libc::signal(raw, prev) } == libc::SIG_ERR {
				trace!(signal = raw, "could not restore previous handler");
			}
		}
	}
}

// `siginterrupt(3)` is still exported by the system C library but was
// dropped from the `libc` crate's bindings, so declare it here.
#[cfg(unix)]
extern "C" {
	fn siginterrupt(sig: libc::c_int, flag: libc::c_int) -> libc::c_int;
}

#[cfg(unix)]
fn mark_restartable(sig: Signal) -> Result<(), CriticalError> {
	let Some(raw) = sig.to_raw() else { return Ok(()) };
	if unsafe { siginterrupt(raw, 0) } != 0 {
		return Err(CriticalError::Restartable {
			signal: sig,
			err: std::io::Error::last_os_error(),
		});
	}
	Ok(())
}

impl Drop for SignalBridge {
	fn drop(&mut self) {
		self.uninstall();
	}
}

impl fmt::Debug for SignalBridge {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalBridge")
			.field("installed", &self.installed)
			.finish_non_exhaustive()
	}
}
