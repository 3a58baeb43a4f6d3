//! Console loop tests

mod common;

use common::{MockDriver, ScriptedIo};
use serial_console::config::SessionConfig;
use serial_console::dispatch::{Context, DispatchResult};
use serial_console::editor::{BasicEditor, LineEditor};
use serial_console::history::{MemoryStore, NoHistory};
use serial_console::registry::Command;
use serial_console::repl::report::{BANNER, DUMB_NOTICE};
use serial_console::repl::{Console, Phase, Repl, RootDir, WorkingDirectory};
use serial_console::transport::{self, IoError};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn fail(_ctx: &mut Context<'_>) -> i32 {
    7
}

struct Fixed(&'static str);

impl WorkingDirectory for Fixed {
    fn write_working_dir(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(self.0)
    }
}

fn console(config: &SessionConfig<'_>) -> Console {
    let mut console = Console::new(config).unwrap();
    console.register_core_commands().unwrap();
    console.register(Command::new("fail", "Always fails", fail)).unwrap();
    console
}

fn start(
    config: &SessionConfig<'_>,
    io: ScriptedIo,
) -> (Repl<ScriptedIo, BasicEditor, NoHistory, RootDir>, Arc<AtomicBool>) {
    let cancel = io.cancel_flag();
    let repl = console(config).begin(io, BasicEditor::new(), NoHistory, RootDir);
    (repl, cancel)
}

#[test]
fn test_session_dispatches_and_reports() {
    let (mut repl, cancel) = start(
        &SessionConfig::default(),
        ScriptedIo::smart("echo hi\nbogus\nfail\n"),
    );

    assert_eq!(repl.run(&cancel), Ok(()));

    let output = repl.io().output();
    assert!(output.starts_with(BANNER));
    assert!(output.contains("hi\n"));
    assert!(output.contains("Unrecognized command\n"));
    assert!(output.contains("Command returned non-zero error code: 0x7 (UNKNOWN ERROR)\n"));
    assert!(!output.contains(DUMB_NOTICE));

    let state = repl.state();
    assert_eq!(state.phase, Phase::Stopped);
    assert_eq!(state.dispatched, 3);
    assert_eq!(state.last_result, Some(DispatchResult::HandlerFailure(7)));
}

#[test]
fn test_empty_line_prints_nothing() {
    let (mut repl, cancel) = start(&SessionConfig::default(), ScriptedIo::dumb("\n"));
    repl.run(&cancel).unwrap();

    assert!(repl.io().output().ends_with("ESP32> \nESP32> \n"));
    assert_eq!(repl.state().last_result, Some(DispatchResult::EmptyInput));
    assert!(repl.history().is_empty());
}

#[test]
fn test_dumb_terminal_gets_notice_and_plain_echo() {
    let (mut repl, cancel) = start(&SessionConfig::default(), ScriptedIo::dumb("echo plain\n"));
    repl.run(&cancel).unwrap();

    assert!(repl.editor().is_dumb_mode());
    let output = repl.io().output();
    let notice = output.find(DUMB_NOTICE).unwrap();
    assert!(!output[notice..].contains('\x1b'));
    assert!(output.contains("ESP32> echo plain\nplain\n"));
}

#[test]
fn test_history_saved_after_each_line() {
    let config = SessionConfig::default().with_history_path("/spiffs/history.txt");
    let io = ScriptedIo::smart("help\necho hi\nls /\n");
    let cancel = io.cancel_flag();
    let store: MemoryStore<512> = MemoryStore::new();
    let mut repl = console(&config).begin(io, BasicEditor::new(), store, RootDir);

    repl.run(&cancel).unwrap();

    assert_eq!(repl.store().path(), "/spiffs/history.txt");
    assert_eq!(repl.store().contents(), "help\necho hi\nls /\n");
}

#[test]
fn test_history_loaded_at_startup_and_recalled() {
    let config = SessionConfig::default().with_history_path("/h");
    let store: MemoryStore<64> = MemoryStore::with_contents("/h", "echo one\necho two\n").unwrap();
    let io = ScriptedIo::smart("\x1b[A\x1b[A\n");
    let cancel = io.cancel_flag();
    let mut repl = console(&config).begin(io, BasicEditor::new(), store, RootDir);
    assert_eq!(repl.history().len(), 2);

    repl.run(&cancel).unwrap();

    assert!(repl.io().output().contains("one\n"));
    assert_eq!(repl.history().newest(), Some("echo one"));
    assert_eq!(repl.store().contents(), "echo one\necho two\necho one\n");
}

#[test]
fn test_history_length_follows_configuration() {
    let config = SessionConfig::default().with_max_history_len(2);
    let (mut repl, cancel) = start(&config, ScriptedIo::smart("echo a\necho b\necho c\n"));
    repl.run(&cancel).unwrap();

    let entries: Vec<&str> = repl.history().iter().collect();
    assert_eq!(entries, ["echo b", "echo c"]);
}

#[test]
fn test_prompt_shows_working_directory() {
    let config = SessionConfig::default().with_prompt("[%pwd%]$ ");
    let io = ScriptedIo::dumb("");
    let cancel = io.cancel_flag();
    let mut repl = console(&config).begin(io, BasicEditor::new(), NoHistory, Fixed("/data"));

    repl.run(&cancel).unwrap();
    assert!(repl.io().output().contains("[/data]$ "));
}

#[test]
fn test_transport_failure_ends_the_loop() {
    let (mut repl, cancel) = start(&SessionConfig::default(), ScriptedIo::smart("echo hi\n").failing());
    assert_eq!(repl.run(&cancel), Err(IoError::Read));
    assert_eq!(repl.state().phase, Phase::Stopped);
    assert_eq!(repl.state().dispatched, 1);
}

#[test]
fn test_cancelled_before_first_line() {
    let (mut repl, _) = start(&SessionConfig::default(), ScriptedIo::smart("echo never\n"));
    let cancel = AtomicBool::new(true);
    assert_eq!(repl.run(&cancel), Ok(()));
    assert_eq!(repl.state().dispatched, 0);
    assert!(repl.io().output().starts_with(BANNER));
}

#[test]
fn test_execute_without_terminal_input() {
    let (mut repl, _) = start(&SessionConfig::default(), ScriptedIo::smart(""));
    assert_eq!(repl.execute("echo direct"), Ok(DispatchResult::Success));
    assert_eq!(repl.execute("nope"), Ok(DispatchResult::CommandNotFound));
    assert_eq!(repl.io().output(), "direct\nUnrecognized command\n");
}

#[test]
fn test_full_stack_over_serial_port() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut driver = MockDriver::new(2).with_input(b"\x1b[0nfail\r");
    driver.on_drained = Some(Arc::clone(&cancel));

    let config = SessionConfig::default();
    let port = transport::configure(driver, &config).unwrap();
    let mut repl = console(&config).begin(port, BasicEditor::new(), NoHistory, RootDir);

    repl.run(&cancel).unwrap();

    let output = repl.io().driver().output();
    assert!(output.contains("Command returned non-zero error code: 0x7 (UNKNOWN ERROR)\r\n"));
    assert!(!output.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_slow_terminal_keeps_full_editing() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut driver = MockDriver::new(1).with_reply_after(250, b"\x1b[0necho slow\r");
    driver.on_drained = Some(Arc::clone(&cancel));

    let config = SessionConfig::default();
    let port = transport::configure(driver, &config).unwrap();
    let mut repl = console(&config).begin(port, BasicEditor::new(), NoHistory, RootDir);

    repl.run(&cancel).unwrap();

    assert!(!repl.editor().is_dumb_mode());
    let output = repl.io().driver().output();
    assert!(!output.contains(DUMB_NOTICE));
    assert!(output.contains("slow\r\n"));
}

#[test]
fn test_multiline_command_switches_editor() {
    let (mut repl, cancel) = start(&SessionConfig::default(), ScriptedIo::smart("multiline on\n"));
    assert!(!repl.editor().is_multiline());

    repl.run(&cancel).unwrap();

    assert!(repl.session().multiline());
    assert!(repl.editor().is_multiline());
    assert_eq!(repl.state().last_result, Some(DispatchResult::Success));
}

#[test]
fn test_declared_variables_outlive_the_line() {
    let (mut repl, _) = start(&SessionConfig::default(), ScriptedIo::smart(""));
    assert_eq!(repl.execute("declare BOARD devkit c3"), Ok(DispatchResult::Success));
    assert_eq!(repl.execute("env"), Ok(DispatchResult::Success));

    assert_eq!(repl.session().var("BOARD").as_deref(), Some("devkit c3"));
    assert!(repl.io().output().ends_with("BOARD=devkit c3\n"));
}

#[test]
fn test_state_carries_prompt_and_history_path() {
    let config = SessionConfig::default()
        .with_prompt("dev> ")
        .with_history_path("/spiffs/h");
    let store: MemoryStore<64> = MemoryStore::new();
    let repl = console(&config).begin(ScriptedIo::smart(""), BasicEditor::new(), store, RootDir);

    let state = repl.state();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.prompt.as_str(), "dev> ");
    assert_eq!(state.history_path.as_deref(), Some("/spiffs/h"));
    assert_eq!(state.last_result, None);
}

#[cfg(feature = "std")]
#[test]
fn test_spawned_console_shuts_down() {
    let io = ScriptedIo::smart("echo threaded\n").endless();
    let repl = console(&SessionConfig::default()).begin(io, BasicEditor::new(), NoHistory, RootDir);

    let handle = repl.spawn().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert!(!handle.is_finished());

    let (repl, result) = handle.shutdown();
    assert_eq!(result, Ok(()));
    assert!(repl.io().output().contains("threaded\n"));
    assert_eq!(repl.state().phase, Phase::Stopped);
}
