//! End-to-end tests for the bridge: real handlers, real signals.
//!
//! Signal registration is process-global, so every test takes the
//! `serial` lock and uninstalls before releasing it.

#![cfg(unix)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::json;

use overseer_sighandler::{
	worker, ClientId, Command, CriticalError, DispatchError, Signal, SignalBridge,
};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
	SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.try_init();
}

type Log = Arc<Mutex<Vec<(Option<ClientId>, Command)>>>;

fn recorder() -> (
	Log,
	impl Fn(Option<ClientId>, Command) -> Result<(), DispatchError> + Send + Sync,
) {
	let log = Log::default();
	let writer = log.clone();
	(log, move |source: Option<ClientId>, command: Command| {
		writer.lock().expect("log poisoned").push((source, command));
		Ok(())
	})
}

fn current_handler(raw: i32) -> libc::sighandler_t {
	let mut old = std::mem::MaybeUninit::<libc::sigaction>::zeroed();
	let rc = unsafe { libc::sigaction(raw, std::ptr::null(), old.as_mut_ptr()) };
	assert_eq!(rc, 0, "reading disposition of signal {raw}");
	unsafe { old.assume_init() }.sa_sigaction
}

async fn wait_for(log: &Log, count: usize) {
	for _ in 0..200 {
		if log.lock().expect("log poisoned").len() >= count {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("timed out waiting for {count} dispatches");
}

#[test]
fn install_replaces_and_uninstall_restores() {
	init_tracing();
	let _serial = serial();

	let observed: Vec<i32> = Signal::OBSERVED
		.iter()
		.filter_map(|sig| sig.to_raw())
		.collect();
	let before: Vec<_> = observed.iter().map(|raw| current_handler(*raw)).collect();

	let (mut bridge, handoff) = SignalBridge::install().expect("install");

	for (raw, prev) in observed.iter().zip(&before) {
		assert_ne!(
			current_handler(*raw),
			*prev,
			"handler for signal {raw} was not replaced"
		);
	}

	// Every observed signal goes through the one trampoline.
	let handlers: std::collections::HashSet<_> =
		observed.iter().map(|raw| current_handler(*raw)).collect();
	assert_eq!(handlers.len(), 1);

	bridge.uninstall();

	for (raw, prev) in observed.iter().zip(&before) {
		assert_eq!(
			current_handler(*raw),
			*prev,
			"handler for signal {raw} was not restored"
		);
	}

	drop(handoff);
}

#[test]
fn double_install_is_rejected() {
	init_tracing();
	let _serial = serial();

	let (mut bridge, _handoff) = SignalBridge::install().expect("install");
	assert!(matches!(
		SignalBridge::install(),
		Err(CriticalError::AlreadyInstalled)
	));

	bridge.uninstall();
}

#[tokio::test]
async fn observed_signals_dispatch_commands() {
	init_tracing();
	let _serial = serial();

	let (log, dispatcher) = recorder();
	let (mut bridge, handoff) = SignalBridge::install().expect("install");
	let signals = tokio::spawn(worker(handoff, dispatcher));

	unsafe {
		libc::raise(libc::SIGHUP);
		libc::raise(libc::SIGWINCH);
		libc::raise(libc::SIGINT);
		libc::raise(libc::SIGTERM);
	}

	wait_for(&log, 3).await;

	{
		let log = log.lock().expect("log poisoned");
		// The window change is observed but dispatches nothing.
		assert_eq!(log.len(), 3);

		let (source, reload) = &log[0];
		assert_eq!(*source, None);
		assert_eq!(reload.name, "reload");
		assert_eq!(reload.options.get("graceful"), Some(&json!(true)));

		assert_eq!(log[1].1.name, "quit");
		assert!(log[1].1.options.is_empty());
		assert_eq!(log[2].1.name, "quit");
	}

	bridge.uninstall();
	signals
		.await
		.expect("worker panicked")
		.expect("worker errored");
}

#[tokio::test]
async fn each_transfer_dispatches_exactly_once() {
	init_tracing();
	let _serial = serial();

	let (log, dispatcher) = recorder();
	let (mut bridge, handoff) = SignalBridge::install().expect("install");
	let signals = tokio::spawn(worker(handoff, dispatcher));

	unsafe {
		libc::raise(libc::SIGHUP);
		libc::raise(libc::SIGHUP);
	}

	wait_for(&log, 2).await;
	// Give a straggler a chance to show up before asserting the count.
	tokio::time::sleep(Duration::from_millis(50)).await;

	{
		let log = log.lock().expect("log poisoned");
		assert_eq!(log.len(), 2);
		assert!(log
			.iter()
			.all(|(source, command)| source.is_none() && command.name == "reload"));
	}

	bridge.uninstall();
	signals
		.await
		.expect("worker panicked")
		.expect("worker errored");
}

// Re-executed as a child process by `failing_handler_exits_nonzero`; the
// worker's fatal path must terminate this process with status 1.
#[tokio::test]
#[ignore = "helper, only runs when spawned by failing_handler_exits_nonzero"]
async fn failing_handler_child() {
	if std::env::var_os("OVERSEER_FAILING_HANDLER").is_none() {
		return;
	}
	init_tracing();

	let dispatcher = |_source: Option<ClientId>, _command: Command| -> Result<(), DispatchError> {
		Err("no dispatch queue".into())
	};

	let (_bridge, handoff) = SignalBridge::install().expect("install");
	let signals = tokio::spawn(worker(handoff, dispatcher));

	unsafe {
		libc::raise(libc::SIGTERM);
	}

	// The worker exits the process before this resolves; a timeout here
	// means the fatal path did not fire.
	let _ = tokio::time::timeout(Duration::from_secs(5), signals).await;
	panic!("process survived a failing command handler");
}

#[test]
fn failing_handler_exits_nonzero() {
	let out = std::process::Command::new(std::env::current_exe().expect("test binary path"))
		.args(["failing_handler_child", "--exact", "--ignored", "--nocapture"])
		.env("OVERSEER_FAILING_HANDLER", "1")
		.env("RUST_LOG", "error")
		.output()
		.expect("spawning child test");

	assert_eq!(out.status.code(), Some(1));
	let stdout = String::from_utf8_lossy(&out.stdout);
	assert!(
		stdout.contains("signal command handler failed"),
		"stdout was: {stdout}"
	);
	assert!(stdout.contains("no dispatch queue"), "stdout was: {stdout}");
}

#[tokio::test]
async fn worker_drains_and_finishes_after_uninstall() {
	init_tracing();
	let _serial = serial();

	let (log, dispatcher) = recorder();
	let (mut bridge, handoff) = SignalBridge::install().expect("install");

	// Transfer before the worker even starts: it must still be delivered.
	unsafe {
		libc::raise(libc::SIGTERM);
	}
	bridge.uninstall();

	let signals = tokio::spawn(worker(handoff, dispatcher));
	signals
		.await
		.expect("worker panicked")
		.expect("worker errored");

	let log = log.lock().expect("log poisoned");
	assert_eq!(log.len(), 1);
	assert_eq!(log[0].1.name, "quit");
}
