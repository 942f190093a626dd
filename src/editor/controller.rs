//! Editor controller
//!
//! Owns all editor state and applies one [`Message`] at a time. Intents come
//! from the UI; console events come back from the bridge's relay threads
//! through the same queue, so state is only ever touched by the loop.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::bridge::{ProcessBridge, ProcessSession, Termination};
use crate::editor::intent::{ConsoleEvent, EditorIntent, Message};
use crate::editor::settings::SettingsStore;
use crate::syntax::{Highlighter, Token};
use crate::utils::{Error, Result};

pub const INITIAL_TEXT: &str = "// Write your code here";
pub const NEW_FILE_TEXT: &str = "// New file";
pub const RUNNING_BANNER: &str = "Running...";

/// Plain editor state
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub file_path: Option<PathBuf>,
    pub text: String,
    /// Buffer differs from what was last read or written
    pub dirty: bool,
    /// Console transcript, one entry per line
    pub console: Vec<String>,
    pub last_termination: Option<Termination>,
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller {
    state: EditorState,
    highlighter: Highlighter,
    bridge: ProcessBridge,
    settings: Option<SettingsStore>,
    session: Option<ProcessSession>,
    /// Number of the current (or last) run
    run: u64,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl Controller {
    pub fn new(
        bridge: ProcessBridge,
        highlighter: Highlighter,
        settings: Option<SettingsStore>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let mut controller = Self {
            state: EditorState::default(),
            highlighter,
            bridge,
            settings,
            session: None,
            run: 0,
            sender,
            receiver,
        };
        controller.set_buffer(INITIAL_TEXT.to_string(), None);
        controller
    }

    /// Queue for posting intents from other threads
    pub fn sender(&self) -> Sender<Message> {
        self.sender.clone()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.highlighter.tokens()
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.state().is_active())
    }

    /// Reopen the file named in settings. A file that can no longer be read
    /// leaves a note in the buffer instead.
    pub fn restore_last_file(&mut self) {
        let Some(store) = &self.settings else { return };
        let last = match store.last_file() {
            Ok(Some(path)) => path,
            Ok(None) => return,
            Err(e) => {
                log::warn!("could not read settings: {}", e);
                return;
            }
        };

        match fs::read_to_string(&last) {
            Ok(text) => {
                log::info!("restored {}", last.display());
                self.set_buffer(text, Some(last));
            }
            Err(e) => {
                log::warn!("could not restore {}: {}", last.display(), e);
                self.set_buffer(format!("// Could not load last file: {}", e), None);
            }
        }
    }

    /// Consume the queue until a `Quit` intent. `observer` sees every
    /// message after it was applied, with its outcome.
    pub fn run_loop<F>(&mut self, mut observer: F)
    where
        F: FnMut(&Message, std::result::Result<(), &Error>, &EditorState),
    {
        while let Ok(message) = self.receiver.recv() {
            let outcome = self.apply(message.clone());
            match &outcome {
                Ok(_) => observer(&message, Ok(()), &self.state),
                Err(e) => {
                    log::debug!("{:?} failed: {}", message, e);
                    observer(&message, Err(e), &self.state);
                }
            }
            if matches!(outcome, Ok(Flow::Quit)) {
                break;
            }
        }
    }

    pub fn apply(&mut self, message: Message) -> Result<Flow> {
        match message {
            Message::Intent(intent) => self.handle(intent),
            Message::Console { run, event } if run == self.run => {
                self.on_console(event);
                Ok(Flow::Continue)
            }
            Message::Console { run, event } => {
                log::debug!("dropping {:?} from earlier run {}", event, run);
                Ok(Flow::Continue)
            }
        }
    }

    pub fn handle(&mut self, intent: EditorIntent) -> Result<Flow> {
        match intent {
            EditorIntent::NewFile => self.set_buffer(NEW_FILE_TEXT.to_string(), None),
            EditorIntent::OpenFile(path) => self.open(path)?,
            EditorIntent::Save => {
                let path = self.state.file_path.clone().ok_or(Error::NoFilePath)?;
                self.write_to(path)?;
            }
            EditorIntent::SaveAs(path) => self.write_to(path)?,
            EditorIntent::Edit(text) => {
                let lines = self.highlighter.update(&text);
                log::debug!("edit rescanned lines {:?}", lines);
                self.state.text = text;
                self.state.dirty = true;
            }
            EditorIntent::Run => self.run()?,
            EditorIntent::Stop => self.stop()?,
            EditorIntent::SendInput(line) => self.send_input(&line),
            EditorIntent::Replay(inputs) => self.replay(&inputs)?,
            EditorIntent::Quit => {
                self.shutdown();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn set_buffer(&mut self, text: String, path: Option<PathBuf>) {
        self.highlighter.set_text(&text);
        self.state.text = text;
        self.state.file_path = path;
        self.state.dirty = false;
    }

    fn open(&mut self, path: PathBuf) -> Result<()> {
        let text = fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        if let Some(store) = &self.settings {
            if let Err(e) = store.remember_file(&path) {
                log::warn!("could not remember {}: {}", path.display(), e);
            }
        }
        self.set_buffer(text, Some(path));
        Ok(())
    }

    fn write_to(&mut self, path: PathBuf) -> Result<()> {
        fs::write(&path, &self.state.text).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("saved {}", path.display());
        self.state.file_path = Some(path);
        self.state.dirty = false;
        Ok(())
    }

    /// The interpreter reads the file from disk, so unsaved edits are
    /// written first.
    fn prepare_run(&mut self) -> Result<PathBuf> {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }
        let path = self.state.file_path.clone().ok_or(Error::NoFilePath)?;
        if self.state.dirty {
            self.write_to(path.clone())?;
        }
        self.reap();
        self.run += 1;
        self.state.console = vec![RUNNING_BANNER.to_string()];
        self.state.last_termination = None;
        Ok(path)
    }

    fn run(&mut self) -> Result<()> {
        let path = self.prepare_run()?;

        let run = self.run;
        let output = self.sender.clone();
        let terminated = self.sender.clone();
        let session = self.bridge.start(
            &path,
            move |line| {
                let event = ConsoleEvent::Output(line);
                let _ = output.send(Message::Console { run, event });
            },
            move |termination| {
                let event = ConsoleEvent::Terminated(termination);
                let _ = terminated.send(Message::Console { run, event });
            },
        );
        self.session = Some(session);
        Ok(())
    }

    fn replay(&mut self, inputs: &[String]) -> Result<()> {
        let path = self.prepare_run()?;
        let output = self.bridge.run_to_completion(&path, inputs);
        self.state.console.extend(output.lines().map(str::to_string));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match &mut self.session {
            Some(session) if session.is_running() => session.stop(),
            _ => {
                log::debug!("stop requested with nothing running");
                Ok(())
            }
        }
    }

    /// Echo the line into the transcript and forward it. Sending with no
    /// program running is only logged.
    fn send_input(&mut self, line: &str) {
        let line = line.trim();
        self.state.console.push(format!("> {}", line));
        if line.is_empty() {
            return;
        }
        match &mut self.session {
            Some(session) => {
                let _ = session.send_input(line);
            }
            None => log::warn!("Failed to send input: no program is running"),
        }
    }

    fn on_console(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Output(line) => self.state.console.push(line),
            ConsoleEvent::Terminated(termination) => {
                self.state.last_termination = Some(termination);
                self.reap();
            }
        }
    }

    /// Join the relay threads of a finished session
    fn reap(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.join();
        }
    }

    fn shutdown(&mut self) {
        if let Some(session) = &mut self.session {
            if session.is_running() {
                if let Err(e) = session.stop() {
                    log::warn!("could not stop interpreter: {}", e);
                }
            }
        }
        self.reap();
    }

    /// Path of the current buffer, if it has one
    pub fn file_path(&self) -> Option<&Path> {
        self.state.file_path.as_deref()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
