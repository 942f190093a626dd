//! Line-oriented console front end for the controller
//!
//! Lines starting with `:` are editor commands; anything else is typed into
//! the running program.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use crate::bridge::Termination;
use crate::editor::{ConsoleEvent, Controller, EditorIntent, EditorState, Message};
use crate::utils::Error;

pub const HELP: &str = "\
:open PATH     open a file
:new           start an empty buffer
:save          save the buffer
:saveas PATH   save the buffer under a new name
:run           run the current file
:stop          kill the running program
:replay A|B    run the current file with input lines A and B
:quit          leave
anything else is sent to the running program";

/// Parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(EditorIntent),
    Help,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Command {
    let Some(command) = line.strip_prefix(':') else {
        return Command::Intent(EditorIntent::SendInput(line.to_string()));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    let intent = match (name, arg) {
        ("open", path) if !path.is_empty() => EditorIntent::OpenFile(PathBuf::from(path)),
        ("new", "") => EditorIntent::NewFile,
        ("save", "") => EditorIntent::Save,
        ("saveas", path) if !path.is_empty() => EditorIntent::SaveAs(PathBuf::from(path)),
        ("run", "") => EditorIntent::Run,
        ("stop", "") => EditorIntent::Stop,
        ("replay", "") => EditorIntent::Replay(Vec::new()),
        ("replay", inputs) => EditorIntent::Replay(inputs.split('|').map(str::to_string).collect()),
        ("quit" | "q", "") => EditorIntent::Quit,
        ("help" | "h", "") => return Command::Help,
        _ => return Command::Unknown(line.to_string()),
    };
    Command::Intent(intent)
}

/// Read console lines on a separate thread and post them to the controller
/// queue. End of input quits.
fn spawn_input_reader(queue: Sender<Message>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("console input failed: {}", e);
                    break;
                }
            };
            let intent = match parse_line(&line) {
                Command::Intent(intent) => intent,
                Command::Help => {
                    println!("{}", HELP);
                    continue;
                }
                Command::Unknown(line) => {
                    eprintln!("unknown command: {} (try :help)", line);
                    continue;
                }
            };
            if queue.send(intent.into()).is_err() {
                return;
            }
        }
        let _ = queue.send(EditorIntent::Quit.into());
    });
}

/// Drive `controller` from stdin until `:quit` or end of input
pub fn run(mut controller: Controller) {
    if let Some(path) = controller.file_path() {
        println!("[{}]", path.display());
    }
    spawn_input_reader(controller.sender());
    controller.run_loop(report);
}

fn report(message: &Message, outcome: Result<(), &Error>, state: &EditorState) {
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        return;
    }
    match message {
        Message::Console { event: ConsoleEvent::Output(line), .. } => println!("{}", line),
        Message::Console { event: ConsoleEvent::Terminated(termination), .. } => {
            match termination {
                Termination::Exited { code: Some(code) } => println!("[exited with {}]", code),
                Termination::Exited { code: None } => println!("[stopped]"),
                Termination::LaunchFailed => {}
            }
        }
        Message::Intent(EditorIntent::OpenFile(path)) => {
            let lines = state.text.lines().count();
            println!("[opened {} - {} lines]", path.display(), lines);
        }
        Message::Intent(EditorIntent::Save | EditorIntent::SaveAs(_)) => {
            if let Some(path) = &state.file_path {
                println!("[saved {}]", path.display());
            }
        }
        Message::Intent(EditorIntent::NewFile) => println!("[new file]"),
        Message::Intent(EditorIntent::Run) => {
            println!("{}", crate::editor::controller::RUNNING_BANNER)
        }
        Message::Intent(EditorIntent::Replay(_)) => {
            for line in &state.console {
                println!("{}", line);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_lines_are_input() {
        assert_eq!(
            parse_line("42"),
            Command::Intent(EditorIntent::SendInput("42".to_string()))
        );
        assert_eq!(
            parse_line(""),
            Command::Intent(EditorIntent::SendInput(String::new()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_line(":open src/main.oml"),
            Command::Intent(EditorIntent::OpenFile(PathBuf::from("src/main.oml")))
        );
        assert_eq!(parse_line(":run"), Command::Intent(EditorIntent::Run));
        assert_eq!(parse_line(":q"), Command::Intent(EditorIntent::Quit));
        assert_eq!(
            parse_line(":replay 1|two words|"),
            Command::Intent(EditorIntent::Replay(vec![
                "1".to_string(),
                "two words".to_string(),
                String::new(),
            ]))
        );
        assert_eq!(parse_line(":help"), Command::Help);
    }

    #[test]
    fn test_malformed_commands() {
        assert_eq!(parse_line(":open"), Command::Unknown(":open".to_string()));
        assert_eq!(parse_line(":run now"), Command::Unknown(":run now".to_string()));
        assert_eq!(parse_line(":frobnicate"), Command::Unknown(":frobnicate".to_string()));
    }
}
