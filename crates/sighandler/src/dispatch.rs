//! The dispatch seam into the supervisor's command loop.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Convenience alias for the opaque errors a [`Dispatch`] impl may return.
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies the remote client a command originated from.
///
/// Signal-originated commands have no client; the bridge always
/// dispatches with `None` as the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// An instruction for the supervisor's command loop: a name plus
/// keyword-style options.
///
/// The bridge treats commands as opaque; it only ever constructs `quit`
/// and `reload` (the latter with `graceful: true`). The shape matches
/// the supervisor's JSON command wire, so a `Command` serializes
/// directly into a client request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
	/// Name of the command, e.g. `quit`.
	pub name: String,

	/// Keyword options interpreted by the command's implementation.
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub options: Map<String, Value>,
}

impl Command {
	/// A command with no options.
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			options: Map::new(),
		}
	}

	/// Adds a keyword option.
	#[must_use]
	pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.options.insert(key.into(), value.into());
		self
	}
}

/// The supervisor's command dispatch collaborator.
///
/// `dispatch` is invoked on the main execution context and may block;
/// that is the supervisor's normal operational model. It must never be
/// called from signal context.
pub trait Dispatch {
	/// Hands a command to the supervisor's command loop.
	fn dispatch(&self, source: Option<ClientId>, command: Command) -> Result<(), DispatchError>;
}

impl<F> Dispatch for F
where
	F: Fn(Option<ClientId>, Command) -> Result<(), DispatchError> + Send + Sync,
{
	fn dispatch(&self, source: Option<ClientId>, command: Command) -> Result<(), DispatchError> {
		(self)(source, command)
	}
}

impl Dispatch for std::sync::mpsc::Sender<(Option<ClientId>, Command)> {
	fn dispatch(&self, source: Option<ClientId>, command: Command) -> Result<(), DispatchError> {
		self.send((source, command))
			.map_err(|err| Box::new(err) as DispatchError)
	}
}

impl Dispatch for tokio::sync::mpsc::UnboundedSender<(Option<ClientId>, Command)> {
	fn dispatch(&self, source: Option<ClientId>, command: Command) -> Result<(), DispatchError> {
		self.send((source, command))
			.map_err(|err| Box::new(err) as DispatchError)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::Command;

	#[test]
	fn options_are_keyword_style() {
		let command = Command::new("reload").option("graceful", true);
		assert_eq!(command.name, "reload");
		assert_eq!(command.options.get("graceful"), Some(&json!(true)));
	}

	#[test]
	fn serializes_to_the_wire_shape() {
		let command = Command::new("reload").option("graceful", true);
		assert_eq!(
			serde_json::to_value(&command).unwrap(),
			json!({"name": "reload", "options": {"graceful": true}})
		);
	}

	#[test]
	fn empty_options_are_omitted() {
		let command = Command::new("quit");
		assert_eq!(
			serde_json::to_value(&command).unwrap(),
			json!({"name": "quit"})
		);
	}

	#[test]
	fn round_trips() {
		let command = Command::new("reload").option("graceful", true);
		let json = serde_json::to_string(&command).unwrap();
		assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), command);
	}

	#[test]
	fn a_channel_is_a_dispatcher() {
		use super::{ClientId, Dispatch};

		let (tx, rx) = std::sync::mpsc::channel::<(Option<ClientId>, Command)>();
		tx.dispatch(None, Command::new("quit")).unwrap();

		let (source, command) = rx.recv().unwrap();
		assert_eq!(source, None);
		assert_eq!(command.name, "quit");
	}
}
