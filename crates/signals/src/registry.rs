//! Canonical lowercase names for raw signal ids.

#[cfg(unix)]
use std::collections::HashMap;

#[cfg(unix)]
use nix::sys::signal::Signal as NixSignal;
#[cfg(unix)]
use once_cell::sync::Lazy;

/// Name table built once from the platform's signal namespace: `SIGHUP`
/// becomes `"hup"`, `SIGKILL` becomes `"kill"`, and so on for every
/// signal the platform defines.
#[cfg(unix)]
static NAMES: Lazy<HashMap<i32, String>> = Lazy::new(|| {
	NixSignal::iterator()
		.map(|sig| {
			(
				sig as i32,
				sig.as_str().trim_start_matches("SIG").to_ascii_lowercase(),
			)
		})
		.collect()
});

/// Looks up the canonical lowercase name for a raw signal id.
///
/// Ids the platform does not define resolve to `None`; callers treat
/// those as unknown signals, not as errors.
#[cfg(unix)]
#[must_use]
pub fn name_of_raw(raw: i32) -> Option<&'static str> {
	NAMES.get(&raw).map(String::as_str)
}

/// Looks up the canonical lowercase name for a raw signal id.
///
/// The C runtime defines a fixed handful of signals, so the table is
/// hardcoded rather than built from a platform namespace.
#[cfg(not(unix))]
#[must_use]
pub const fn name_of_raw(raw: i32) -> Option<&'static str> {
	match raw {
		2 => Some("int"),
		4 => Some("ill"),
		8 => Some("fpe"),
		11 => Some("segv"),
		15 => Some("term"),
		21 => Some("break"),
		22 => Some("abrt"),
		_ => None,
	}
}
