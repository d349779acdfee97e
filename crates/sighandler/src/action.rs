//! Per-signal policy: what the supervisor does about each observed
//! signal.

use overseer_signals::Signal;

use crate::dispatch::Command;

/// The closed set of reactions the bridge can request from the
/// supervisor.
///
/// Every lifecycle intent the bridge emits is one of these; there is no
/// open-ended handler registration. Signals that should do nothing
/// despite being observed get an explicit [`Ignore`](Action::Ignore)
/// entry so the table distinguishes "recognized, no-op" from "no policy
/// at all".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
	/// Ask the supervisor to stop, non-gracefully.
	Quit,

	/// Ask the supervisor to reconfigure without dropping managed work.
	ReloadGraceful,

	/// Recognized and deliberately does nothing.
	Ignore,
}

impl Action {
	/// The policy table: which action is registered for a signal.
	///
	/// Signals without an entry are observed but not acted on, which is
	/// the expected state for anything outside the lifecycle set. The
	/// match is exhaustive on purpose, so a new [`Signal`] variant cannot
	/// be added without deciding its policy here.
	#[must_use]
	pub const fn for_signal(signal: Signal) -> Option<Self> {
		match signal {
			Signal::Interrupt
			| Signal::Terminate
			| Signal::Quit
			| Signal::Illegal
			| Signal::Abort
			| Signal::Break => Some(Self::Quit),
			Signal::Hangup => Some(Self::ReloadGraceful),
			Signal::WindowChange => Some(Self::Ignore),
			Signal::User1 => None,
		}
	}

	/// The command this action sends into the dispatch queue, if any.
	#[must_use]
	pub fn command(self) -> Option<Command> {
		match self {
			Self::Quit => Some(Command::new("quit")),
			Self::ReloadGraceful => Some(Command::new("reload").option("graceful", true)),
			Self::Ignore => None,
		}
	}
}
