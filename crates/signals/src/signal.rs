//! The signals the supervisor reasons about.

use std::fmt;

#[cfg(unix)]
use nix::sys::signal::Signal as NixSignal;

/// A signal the supervisor observes or sends commands about.
///
/// Every variant is defined on every platform so that configuration and
/// serialized forms stay portable; variants a platform does not produce
/// simply never come out of [`Signal::from_raw`] there, and convert to no
/// raw id ([`Signal::to_raw`] returns `None`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Signal {
	/// Received when the controlling terminal is disconnected.
	///
	/// On Unix, this is `SIGHUP`. On Windows, it is not produced.
	///
	/// By long convention supervisors treat this as a request to reload
	/// configuration rather than as a real hangup.
	Hangup,

	/// Received to indicate that the process should stop.
	///
	/// On Unix, this is `SIGINT`. On Windows, this is `Ctrl+C`.
	///
	/// Generally produced by the user at a terminal.
	Interrupt,

	/// Received to make the process stop and dump core.
	///
	/// On Unix, this is `SIGQUIT`. On Windows, it is not produced.
	Quit,

	/// Received to indicate that the process should stop.
	///
	/// On Unix, this is `SIGTERM`. On Windows, this is the C runtime's
	/// `SIGTERM`, which is only ever software-generated.
	Terminate,

	/// Received when the terminal window changes size.
	///
	/// On Unix, this is `SIGWINCH`. On Windows, it is not produced.
	///
	/// Delivered to the supervisor merely because it has a terminal; it
	/// carries no lifecycle meaning.
	WindowChange,

	/// Received for a user or application defined purpose.
	///
	/// On Unix, this is `SIGUSR1`. On Windows, it is not produced.
	User1,

	/// Received when the process executes an illegal instruction.
	///
	/// This is `SIGILL` on both platform families, but only the Windows C
	/// runtime lets a process observe it in a way the supervisor can act
	/// on; Unix deliveries are left at their default disposition.
	Illegal,

	/// Received when the process aborts.
	///
	/// This is `SIGABRT` on both platform families; as with
	/// [`Illegal`](Signal::Illegal), only Windows-family supervisors
	/// subscribe to it.
	Abort,

	/// Received when `Ctrl+Break` is pressed.
	///
	/// On Windows, this is `SIGBREAK`. Unix has no equivalent signal
	/// number at all.
	Break,
}

impl Signal {
	/// The signals the supervisor subscribes to, in registration order.
	#[cfg(unix)]
	pub const OBSERVED: &'static [Self] = &[
		Self::Hangup,
		Self::Quit,
		Self::Interrupt,
		Self::Terminate,
		Self::WindowChange,
	];

	/// The signals the supervisor subscribes to, in registration order.
	#[cfg(not(unix))]
	pub const OBSERVED: &'static [Self] = &[
		Self::Illegal,
		Self::Abort,
		Self::Break,
		Self::Interrupt,
		Self::Terminate,
	];

	/// The canonical lowercase short name, as used in logs and command
	/// handler registration.
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::Hangup => "hup",
			Self::Interrupt => "int",
			Self::Quit => "quit",
			Self::Terminate => "term",
			Self::WindowChange => "winch",
			Self::User1 => "usr1",
			Self::Illegal => "ill",
			Self::Abort => "abrt",
			Self::Break => "break",
		}
	}

	/// Converts to a [`nix::Signal`][NixSignal] if the signal exists on Unix.
	#[cfg(unix)]
	#[must_use]
	pub const fn to_nix(self) -> Option<NixSignal> {
		match self {
			Self::Hangup => Some(NixSignal::SIGHUP),
			Self::Interrupt => Some(NixSignal::SIGINT),
			Self::Quit => Some(NixSignal::SIGQUIT),
			Self::Terminate => Some(NixSignal::SIGTERM),
			Self::WindowChange => Some(NixSignal::SIGWINCH),
			Self::User1 => Some(NixSignal::SIGUSR1),
			Self::Illegal => Some(NixSignal::SIGILL),
			Self::Abort => Some(NixSignal::SIGABRT),
			Self::Break => None,
		}
	}

	/// Converts from a [`nix::Signal`][NixSignal].
	///
	/// Returns `None` for signal kinds the supervisor has no concept of.
	#[cfg(unix)]
	#[must_use]
	pub const fn from_nix(sig: NixSignal) -> Option<Self> {
		match sig {
			NixSignal::SIGHUP => Some(Self::Hangup),
			NixSignal::SIGINT => Some(Self::Interrupt),
			NixSignal::SIGQUIT => Some(Self::Quit),
			NixSignal::SIGTERM => Some(Self::Terminate),
			NixSignal::SIGWINCH => Some(Self::WindowChange),
			NixSignal::SIGUSR1 => Some(Self::User1),
			NixSignal::SIGILL => Some(Self::Illegal),
			NixSignal::SIGABRT => Some(Self::Abort),
			_ => None,
		}
	}

	/// Converts from a raw platform signal id.
	#[cfg(unix)]
	#[must_use]
	pub fn from_raw(raw: i32) -> Option<Self> {
		NixSignal::try_from(raw).ok().and_then(Self::from_nix)
	}

	/// Converts from a raw platform signal id.
	///
	/// Uses the hardcoded C runtime numbers, as there is no signal table
	/// to consult off Unix.
	#[cfg(not(unix))]
	#[must_use]
	pub const fn from_raw(raw: i32) -> Option<Self> {
		match raw {
			2 => Some(Self::Interrupt),
			4 => Some(Self::Illegal),
			15 => Some(Self::Terminate),
			21 => Some(Self::Break),
			22 => Some(Self::Abort),
			_ => None,
		}
	}

	/// Converts to the raw platform signal id, if the platform defines one.
	#[cfg(unix)]
	#[must_use]
	pub fn to_raw(self) -> Option<i32> {
		self.to_nix().map(|sig| sig as i32)
	}

	/// Converts to the raw platform signal id, if the platform defines one.
	#[cfg(not(unix))]
	#[must_use]
	pub const fn to_raw(self) -> Option<i32> {
		match self {
			Self::Interrupt => Some(2),
			Self::Illegal => Some(4),
			Self::Terminate => Some(15),
			Self::Break => Some(21),
			Self::Abort => Some(22),
			_ => None,
		}
	}
}

impl fmt::Display for Signal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::Signal;

	#[test]
	fn canonical_names() {
		assert_eq!(Signal::Hangup.name(), "hup");
		assert_eq!(Signal::Interrupt.name(), "int");
		assert_eq!(Signal::Quit.name(), "quit");
		assert_eq!(Signal::Terminate.name(), "term");
		assert_eq!(Signal::WindowChange.name(), "winch");
		assert_eq!(Signal::User1.name(), "usr1");
		assert_eq!(Signal::Illegal.name(), "ill");
		assert_eq!(Signal::Abort.name(), "abrt");
		assert_eq!(Signal::Break.name(), "break");
	}

	#[test]
	fn display_matches_name() {
		assert_eq!(Signal::Hangup.to_string(), "hup");
		assert_eq!(Signal::Break.to_string(), "break");
	}

	#[cfg(unix)]
	#[test]
	fn observed_set() {
		assert_eq!(
			Signal::OBSERVED,
			&[
				Signal::Hangup,
				Signal::Quit,
				Signal::Interrupt,
				Signal::Terminate,
				Signal::WindowChange,
			]
		);
	}

	#[cfg(unix)]
	#[test]
	fn observed_round_trips_through_raw() {
		for sig in Signal::OBSERVED {
			let raw = sig.to_raw().expect("observed signals all exist on unix");
			assert_eq!(Signal::from_raw(raw), Some(*sig));
		}
	}

	#[cfg(unix)]
	#[test]
	fn break_does_not_exist_on_unix() {
		assert_eq!(Signal::Break.to_raw(), None);
	}

	#[cfg(unix)]
	#[test]
	fn unmodeled_raw_ids_resolve_to_none() {
		use nix::sys::signal::Signal as NixSignal;

		assert_eq!(Signal::from_raw(NixSignal::SIGKILL as i32), None);
		assert_eq!(Signal::from_raw(0), None);
		assert_eq!(Signal::from_raw(-1), None);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serde_kebab_case() {
		assert_eq!(
			serde_json::to_string(&Signal::WindowChange).unwrap(),
			r#""window-change""#
		);
		assert_eq!(
			serde_json::from_str::<Signal>(r#""hangup""#).unwrap(),
			Signal::Hangup
		);
	}
}
