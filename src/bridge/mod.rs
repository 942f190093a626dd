//! Interpreter process bridge
//!
//! Runs the external OML interpreter as `<interpreter> <source-file>` with
//! stderr merged into stdout, and relays console lines in both directions:
//! - interactively through a [`ProcessSession`] and two callbacks
//! - in batch through [`ProcessBridge::run_to_completion`]
//!
//! Nothing here fails past the callback boundary. Launch problems become a
//! diagnostic output line followed by termination.

pub mod interpreter;
pub mod replay;
pub mod session;

use std::io::PipeReader;
use std::path::Path;
use std::process::{Child, Command, Stdio};

pub use interpreter::{Executable, InterpreterLocator};
pub use session::{ProcessSession, SessionState, Termination};

use crate::utils::{Error, Result};

/// Launches interpreter sessions
#[derive(Debug, Clone, Default)]
pub struct ProcessBridge {
    locator: InterpreterLocator,
}

impl ProcessBridge {
    pub fn new(locator: InterpreterLocator) -> Self {
        Self { locator }
    }

    /// Start the interpreter on `source` and return without waiting.
    ///
    /// `on_output` receives every output line in order, from a relay
    /// thread. `on_terminated` runs exactly once, after the last line. If
    /// the interpreter cannot be started both callbacks run before this
    /// returns and the session is already `Terminated`.
    pub fn start<O, T>(&self, source: &Path, mut on_output: O, on_terminated: T) -> ProcessSession
    where
        O: FnMut(String) + Send + 'static,
        T: FnOnce(Termination) + Send + 'static,
    {
        let mut session = ProcessSession::with_state(SessionState::Starting);

        match self.launch(source) {
            Ok((executable, child, output)) => {
                log::info!(
                    "started {} {} (pid {})",
                    executable.path().display(),
                    source.display(),
                    child.id()
                );
                session.attach(executable, child, output, on_output, on_terminated);
            }
            Err(e) => {
                log::warn!("could not start interpreter: {}", e);
                session.set_state(SessionState::Terminated);
                on_output(diagnostic(&e));
                on_terminated(Termination::LaunchFailed);
            }
        }

        session
    }

    /// Locate the interpreter and spawn it with stdout and stderr sharing
    /// one pipe.
    pub(crate) fn launch(&self, source: &Path) -> Result<(Executable, Child, PipeReader)> {
        let executable = self.locator.locate()?;
        let (output, output_writer) = std::io::pipe().map_err(Error::Spawn)?;
        let errors_writer = output_writer.try_clone().map_err(Error::Spawn)?;

        let mut command = Command::new(executable.path());
        command
            .arg(source)
            .stdin(Stdio::piped())
            .stdout(output_writer)
            .stderr(errors_writer);
        let child = command.spawn().map_err(Error::Spawn)?;
        // The command still holds our copies of the write end; output only
        // reaches end-of-stream once they are gone.
        drop(command);

        Ok((executable, child, output))
    }
}

/// Console line reported in place of output when a launch fails
pub fn diagnostic(error: &Error) -> String {
    match error {
        Error::Spawn(_) => error.to_string(),
        other => format!("Error starting process: {}", other),
    }
}
