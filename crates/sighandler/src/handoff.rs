//! The signal-context to main-context handoff.
//!
//! Everything here that runs in signal context is restricted to
//! async-signal-safe operations: atomic loads/stores and raw `write`.
//! The richer half of the bridge (resolution, policy, logging) lives in
//! [`worker`](crate::worker()) on the main context.

#[cfg(unix)]
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
#[cfg(unix)]
use std::sync::atomic::AtomicI32;
#[cfg(windows)]
use std::sync::atomic::{AtomicBool, AtomicU32};
use std::sync::atomic::Ordering;

use crate::errors::CriticalError;

/// Where the trampoline writes transferred signals: the raw fd of the
/// notify pipe's write end, or negative when no bridge is installed.
#[cfg(unix)]
static NOTIFY_FD: AtomicI32 = AtomicI32::new(-1);

/// One bit per pending C runtime signal id, set from signal context and
/// drained by the worker.
#[cfg(windows)]
static PENDING: AtomicU32 = AtomicU32::new(0);

/// Whether a bridge currently owns the pending mask.
#[cfg(windows)]
static OPEN: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
const FAILED_HANDOFF_MSG: &[u8] = b"overseer: cannot hand off signal safely, aborting\n";

/// Consumer half of the handoff, fed by the trampoline and drained by
/// [`worker`](crate::worker()).
///
/// On Unix this owns the read end of the notify pipe; the worker ends
/// once the bridge is uninstalled and the write end closes.
#[cfg(unix)]
#[derive(Debug)]
pub struct Handoff {
	pub(crate) pipe: OwnedFd,
}

/// Consumer half of the handoff, fed by the trampoline and drained by
/// [`worker`](crate::worker()).
///
/// On Windows this reads the pending mask the C runtime handlers set;
/// the worker ends once the bridge is uninstalled.
#[cfg(windows)]
#[derive(Debug)]
pub struct Handoff {
	pub(crate) _priv: (),
}

#[cfg(windows)]
impl Handoff {
	/// Takes and clears the pending set, yielding raw signal ids.
	pub(crate) fn drain(&self) -> impl Iterator<Item = i32> {
		let mask = PENDING.swap(0, Ordering::SeqCst);
		(0..32).filter(move |bit| mask & (1_u32 << bit) != 0)
	}

	pub(crate) fn is_open(&self) -> bool {
		OPEN.load(Ordering::SeqCst)
	}
}

/// Producer registration for the handoff. Held by the bridge; dropping
/// it unregisters the trampoline's target (and on Unix closes the write
/// end, which lets the worker drain out and finish).
#[cfg(unix)]
pub(crate) struct NotifyGuard(#[allow(dead_code)] OwnedFd);

#[cfg(windows)]
pub(crate) struct NotifyGuard(());

#[cfg(unix)]
impl Drop for NotifyGuard {
	fn drop(&mut self) {
		// Clear before the fd closes so the trampoline can never write
		// into a reused fd number.
		NOTIFY_FD.store(-1, Ordering::Release);
	}
}

#[cfg(windows)]
impl Drop for NotifyGuard {
	fn drop(&mut self) {
		OPEN.store(false, Ordering::SeqCst);
	}
}

/// Creates the handoff and points the trampoline at it.
#[cfg(unix)]
pub(crate) fn pair() -> Result<(NotifyGuard, Handoff), CriticalError> {
	let mut fds = [0 as libc::c_int; 2];
	if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
		return Err(CriticalError::HandoffInit {
			err: std::io::Error::last_os_error(),
		});
	}

	// SAFETY: pipe() succeeded, so both fds are fresh and ours.
	let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

	// Nonblocking on the write end keeps the trampoline from ever
	// suspending; on the read end it is what the async worker needs.
	for fd in [&read, &write] {
		set_cloexec_nonblock(fd.as_raw_fd())
			.map_err(|err| CriticalError::HandoffInit { err })?;
	}

	NOTIFY_FD.store(write.as_raw_fd(), Ordering::Release);
	Ok((NotifyGuard(write), Handoff { pipe: read }))
}

/// Creates the handoff and points the trampoline at it.
#[cfg(windows)]
pub(crate) fn pair() -> Result<(NotifyGuard, Handoff), CriticalError> {
	PENDING.store(0, Ordering::SeqCst);
	OPEN.store(true, Ordering::SeqCst);
	Ok((NotifyGuard(()), Handoff { _priv: () }))
}

#[cfg(unix)]
fn set_cloexec_nonblock(fd: libc::c_int) -> std::io::Result<()> {
	unsafe {
		if libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) < 0 {
			return Err(std::io::Error::last_os_error());
		}
		let flags = libc::fcntl(fd, libc::F_GETFL);
		if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
			return Err(std::io::Error::last_os_error());
		}
	}
	Ok(())
}

/// The OS-invoked signal handler.
///
/// Runs in signal context, at an arbitrary point of the interrupted
/// code: one atomic load and one `write` of the signal id, nothing
/// else. No allocation, no locks, no logging.
#[cfg(unix)]
pub(crate) extern "C" fn trampoline(sig: libc::c_int) {
	let fd = NOTIFY_FD.load(Ordering::Acquire);
	if fd < 0 {
		fail_fast();
	}

	let byte = sig as u8;
	// A full pipe (EAGAIN) means the main context stopped consuming long
	// ago; short or failed writes are equally unrecoverable from here.
	let n = unsafe { libc::write(fd, std::ptr::addr_of!(byte).cast(), 1) };
	if n != 1 {
		fail_fast();
	}
}

/// The OS-invoked signal handler.
///
/// The C runtime delivers some of these on other threads and resets the
/// disposition before each call; setting a bit in the pending mask and
/// re-arming are both safe here.
#[cfg(windows)]
pub(crate) extern "C" fn trampoline(sig: libc::c_int) {
	PENDING.fetch_or(1 << (sig as u32 & 31), Ordering::SeqCst);
	unsafe {
		libc::signal(sig, trampoline as *const () as libc::sighandler_t);
	}
}

/// Last resort when the handoff is broken: one fixed message through the
/// raw stderr fd, then immediate termination, bypassing all cleanup.
/// Normal logging is not signal-safe, so none is attempted.
#[cfg(unix)]
fn fail_fast() -> ! {
	unsafe {
		let _ = libc::write(
			2,
			FAILED_HANDOFF_MSG.as_ptr().cast(),
			FAILED_HANDOFF_MSG.len(),
		);
		libc::_exit(1);
	}
}
