//! Messages consumed by the controller loop

use std::path::PathBuf;

use crate::bridge::Termination;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorIntent {
    NewFile,
    OpenFile(PathBuf),
    Save,
    SaveAs(PathBuf),
    /// The buffer now holds this text
    Edit(String),
    Run,
    Stop,
    /// A line typed into the console
    SendInput(String),
    /// Run the current file non-interactively with these input lines
    Replay(Vec<String>),
    Quit,
}

/// Something the running interpreter did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Output(String),
    Terminated(Termination),
}

/// Everything that flows through the controller's queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Intent(EditorIntent),
    /// `run` numbers the session the event came from, so late events from
    /// an earlier run can be told apart.
    Console { run: u64, event: ConsoleEvent },
}

impl From<EditorIntent> for Message {
    fn from(intent: EditorIntent) -> Self {
        Message::Intent(intent)
    }
}
