//! Signal types for Overseer.
//!
//! There are two views of the same platform facility:
//! - [`Signal`] is the closed set of signals the supervisor reasons about.
//! - [`name_of_raw`] is the process-wide registry of canonical lowercase
//!   names (`"int"`, `"term"`, `"hup"`) for every signal id the platform
//!   defines, whether or not [`Signal`] models it.
//!
//! ## Features
//!
//! - `fromstr`: Enables parsing of signals from strings.
//! - `miette`: Enables [`miette`][miette] support for [`SignalParseError`][SignalParseError].
//! - `serde`: Enables serde support.

#[doc(inline)]
pub use registry::name_of_raw;

#[doc(inline)]
pub use signal::Signal;

#[cfg(feature = "fromstr")]
#[doc(inline)]
pub use parse::SignalParseError;

mod registry;
mod signal;

#[cfg(feature = "fromstr")]
mod parse;
