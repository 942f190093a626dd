//! One run of the interpreter and its I/O relay threads
#![allow(dead_code)]

use std::io::{BufRead, BufReader, BufWriter, PipeReader, Write};
use std::process::{Child, ChildStdin, ExitStatus};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bridge::interpreter::Executable;
use crate::utils::{Error, Result};

/// How often the reader polls for the exit status once output has closed
const EXIT_POLL: Duration = Duration::from_millis(10);

/// Lifecycle of a session
///
/// Unlike the child's own status, this tracks the relay as a whole: a
/// session is only `Terminated` once output has been drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Terminated,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Running)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process ran and exited. `code` is `None` when it was killed by a
    /// signal or its status could not be read.
    Exited { code: Option<i32> },
    /// The interpreter could not be located, extracted or spawned
    LaunchFailed,
}

impl Termination {
    fn from_status(status: ExitStatus) -> Self {
        Termination::Exited { code: status.code() }
    }
}

/// Writer side, created on first input
struct InputRelay {
    sender: Sender<String>,
    handle: JoinHandle<()>,
}

/// A running (or finished) interpreter invocation
pub struct ProcessSession {
    state: Arc<Mutex<SessionState>>,
    child: Option<Arc<Mutex<Child>>>,
    stdin: Option<ChildStdin>,
    writer: Option<InputRelay>,
    reader: Option<JoinHandle<()>>,
    _executable: Option<Executable>,
}

impl ProcessSession {
    /// A session that never started
    pub fn idle() -> Self {
        Self::with_state(SessionState::Idle)
    }

    pub(crate) fn with_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            child: None,
            stdin: None,
            writer: None,
            reader: None,
            _executable: None,
        }
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *lock(&self.state) = state;
    }

    /// Wire up a freshly spawned child and start relaying its output.
    ///
    /// `output` is the read end of the pipe both stdout and stderr were
    /// connected to.
    pub(crate) fn attach<O, T>(
        &mut self,
        executable: Executable,
        mut child: Child,
        output: PipeReader,
        mut on_output: O,
        on_terminated: T,
    ) where
        O: FnMut(String) + Send + 'static,
        T: FnOnce(Termination) + Send + 'static,
    {
        self.stdin = child.stdin.take();
        let child = Arc::new(Mutex::new(child));
        self.child = Some(Arc::clone(&child));
        self._executable = Some(executable);
        self.set_state(SessionState::Running);

        let state = Arc::clone(&self.state);
        self.reader = Some(thread::spawn(move || {
            for_each_line(output, &mut on_output);
            let termination = wait_for_exit(&child);
            *lock(&state) = SessionState::Terminated;
            log::info!("interpreter finished: {:?}", termination);
            on_terminated(termination);
        }));
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(|child| lock(child).id())
    }

    /// Queue one line for the interpreter's stdin.
    ///
    /// Fails softly with [`Error::NotRunning`] when there is no live
    /// process; the failure is logged and nothing is written. Write errors
    /// inside the relay are logged and otherwise ignored.
    pub fn send_input(&mut self, line: &str) -> Result<()> {
        if !self.is_running() {
            log::warn!("Failed to send input: no program is running");
            return Err(Error::NotRunning);
        }

        if self.writer.is_none() {
            let Some(stdin) = self.stdin.take() else {
                log::warn!("Failed to send input: input already closed");
                return Err(Error::NotRunning);
            };
            self.writer = Some(spawn_writer(stdin));
        }

        let sent = self
            .writer
            .as_ref()
            .map(|relay| relay.sender.send(line.to_string()).is_ok())
            .unwrap_or(false);
        if !sent {
            log::warn!("Failed to send input: input relay stopped");
            return Err(Error::NotRunning);
        }
        Ok(())
    }

    /// Close the interpreter's stdin after any queued lines are written
    pub fn close_input(&mut self) {
        self.stdin = None;
        if let Some(relay) = self.writer.take() {
            drop(relay.sender);
            if relay.handle.join().is_err() {
                log::warn!("input relay panicked");
            }
        }
    }

    /// Kill the interpreter. Termination is still reported through the
    /// normal callback once output has drained.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }
        if let Some(child) = &self.child {
            match lock(child).kill() {
                Ok(()) => log::info!("killed interpreter"),
                // Already exited on its own
                Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Close input and wait for both relay threads. Blocks until the process
    /// exits.
    pub fn join(&mut self) {
        self.close_input();
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                log::warn!("output relay panicked");
            }
        }
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                log::warn!("could not stop interpreter: {}", e);
            }
        }
        self.join();
    }
}

impl std::fmt::Debug for ProcessSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSession")
            .field("state", &self.state())
            .field("id", &self.id())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call `f` with every line of `output`, without the terminator. Invalid
/// UTF-8 is replaced rather than dropped.
pub(crate) fn for_each_line(output: PipeReader, mut f: impl FnMut(String)) {
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                f(String::from_utf8_lossy(&buf).into_owned());
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("reading interpreter output failed: {}", e);
                break;
            }
        }
    }
}

/// Write one line plus terminator and flush
pub(crate) fn write_line(stdin: &mut impl Write, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes())?;
    stdin.write_all(b"\n")?;
    stdin.flush()
}

fn spawn_writer(stdin: ChildStdin) -> InputRelay {
    let (sender, receiver) = mpsc::channel::<String>();
    let handle = thread::spawn(move || {
        let mut stdin = BufWriter::new(stdin);
        for line in receiver {
            if let Err(e) = write_line(&mut stdin, &line) {
                log::warn!("Failed to send input: {}", e);
            }
        }
    });
    InputRelay { sender, handle }
}

/// Output has closed; poll until the process has actually exited. The lock
/// is released between polls so `stop` can still get in.
fn wait_for_exit(child: &Mutex<Child>) -> Termination {
    loop {
        match lock(child).try_wait() {
            Ok(Some(status)) => return Termination::from_status(status),
            Ok(None) => {}
            Err(e) => {
                log::warn!("could not read interpreter exit status: {}", e);
                return Termination::Exited { code: None };
            }
        }
        thread::sleep(EXIT_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_session_rejects_input() {
        let mut session = ProcessSession::idle();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(session.send_input("x"), Err(Error::NotRunning)));
        assert!(matches!(session.stop(), Err(Error::NotRunning)));
    }

    #[test]
    fn test_write_line_terminates_each_line() {
        let mut out = Vec::new();
        write_line(&mut out, "a").unwrap();
        write_line(&mut out, "").unwrap();
        assert_eq!(out, b"a\n\n");
    }

    #[test]
    fn test_for_each_line_strips_terminators() {
        let (reader, mut writer) = std::io::pipe().unwrap();
        writer.write_all(b"one\r\ntwo\n\xffthree").unwrap();
        drop(writer);

        let mut lines = Vec::new();
        for_each_line(reader, |line| lines.push(line));
        assert_eq!(lines, vec!["one", "two", "\u{fffd}three"]);
    }

    #[test]
    fn test_state_activity() {
        assert!(SessionState::Starting.is_active());
        assert!(SessionState::Running.is_active());
        assert!(!SessionState::Terminated.is_active());
    }
}
