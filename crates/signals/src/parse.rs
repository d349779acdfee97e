//! Parsing signals from strings.

use std::str::FromStr;

use thiserror::Error;

use crate::signal::Signal;

/// Error when parsing a signal from a string.
#[derive(Debug, Error)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
#[error("invalid signal `{src}`: {problem}")]
pub struct SignalParseError {
	// The string that was parsed.
	#[cfg_attr(feature = "miette", source_code)]
	src: String,

	// What was wrong with it.
	problem: &'static str,

	// The span of the source which is in error.
	#[cfg_attr(feature = "miette", label = "invalid signal")]
	span: (usize, usize),
}

impl SignalParseError {
	fn new(src: &str, problem: &'static str) -> Self {
		Self {
			src: src.to_owned(),
			problem,
			span: (0, src.len()),
		}
	}
}

impl FromStr for Signal {
	type Err = SignalParseError;

	/// Parses a signal name or number, case-insensitively.
	///
	/// Accepts the short name (`int`, `hup`), the `SIG`-prefixed long form
	/// (`SIGINT`), the spelled-out form used in configuration files
	/// (`window-change`), and raw platform numbers (`15`).
	///
	/// ```
	/// # use std::str::FromStr;
	/// # use overseer_signals::Signal;
	/// assert_eq!(Signal::from_str("hup").unwrap(), Signal::Hangup);
	/// assert_eq!(Signal::from_str("SIGINT").unwrap(), Signal::Interrupt);
	/// assert_eq!(Signal::from_str("window-change").unwrap(), Signal::WindowChange);
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Ok(raw) = i32::from_str(s) {
			return Self::from_raw(raw)
				.ok_or_else(|| SignalParseError::new(s, "unknown signal number"));
		}

		let upper = s.to_ascii_uppercase();
		let name = upper.strip_prefix("SIG").unwrap_or(&upper);
		match name {
			"HUP" | "HANGUP" => Ok(Self::Hangup),
			"INT" | "INTERRUPT" => Ok(Self::Interrupt),
			"QUIT" => Ok(Self::Quit),
			"TERM" | "TERMINATE" => Ok(Self::Terminate),
			"WINCH" | "WINDOW-CHANGE" => Ok(Self::WindowChange),
			"USR1" | "USER1" => Ok(Self::User1),
			"ILL" | "ILLEGAL" => Ok(Self::Illegal),
			"ABRT" | "ABORT" => Ok(Self::Abort),
			"BREAK" => Ok(Self::Break),
			_ => Err(SignalParseError::new(s, "unknown signal name")),
		}
	}
}
