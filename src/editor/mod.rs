//! Headless editor shell
//!
//! The window, menus and dialogs of a GUI front end all reduce to
//! [`EditorIntent`]s posted to a [`Controller`], which owns the buffer, the
//! console transcript and the active interpreter session.

pub mod controller;
pub mod intent;
pub mod settings;

pub use controller::{Controller, EditorState, Flow};
pub use intent::{ConsoleEvent, EditorIntent, Message};
pub use settings::{Settings, SettingsStore};
