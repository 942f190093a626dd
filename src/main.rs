//! omled
//!
//! Editor core for the OML language: syntax highlighting and an interpreter
//! console, driven from the command line.

mod bridge;
mod config;
mod editor;
mod shell;
mod syntax;
mod utils;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use bridge::{ProcessBridge, Termination};
use config::Config;
use editor::{Controller, SettingsStore};
use syntax::{Highlighter, TokenKind};

/// OML editor core
#[derive(Parser, Debug)]
#[command(name = "omled")]
#[command(version = "0.1.0")]
#[command(about = "OML editor core - highlighting and interpreter console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./omled.toml if present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// OML interpreter executable
    #[arg(long, value_name = "PATH", global = true)]
    interpreter: Option<PathBuf>,

    /// Settings file (default: $OMLED_HOME/settings.json)
    #[arg(long, value_name = "FILE", global = true, hide = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the highlighting tokens of a source file
    Tokens {
        /// Input source file (.oml)
        input: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run a source file, relaying this terminal to the interpreter
    Run {
        /// Input source file
        input: PathBuf,
    },
    /// Run a source file with predefined input and print its output
    Replay {
        /// Input source file
        input: PathBuf,

        /// An input line (repeatable)
        #[arg(short, long = "input", value_name = "LINE")]
        inputs: Vec<String>,

        /// Read input lines from a file
        #[arg(long, value_name = "FILE")]
        input_file: Option<PathBuf>,
    },
    /// Interactive editor console
    Shell {
        /// File to open (default: the last opened file)
        input: Option<PathBuf>,
    },
    /// Print the last opened file
    Last,
}

struct App {
    config: Config,
    interpreter: Option<PathBuf>,
    settings: SettingsStore,
}

impl App {
    fn bridge(&self) -> ProcessBridge {
        let mut locator = self.config.locator();
        if let Some(path) = &self.interpreter {
            locator = locator.with_path(path);
        }
        ProcessBridge::new(locator)
    }

    fn highlighter(&self) -> Highlighter {
        Highlighter::new(self.config.keyword_table(), self.config.highlight_options())
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    let config = Config::discover(cli.config.as_deref()).context("Error loading config")?;
    let ctx = App {
        config,
        interpreter: cli.interpreter,
        settings: cli
            .settings
            .map(SettingsStore::new)
            .unwrap_or_else(SettingsStore::default_location),
    };

    match cli.command {
        Commands::Tokens { input, json } => print_tokens(&ctx, &input, json).map(|_| 0),
        Commands::Run { input } => run_interactive(&ctx, &input),
        Commands::Replay {
            input,
            inputs,
            input_file,
        } => replay(&ctx, &input, inputs, input_file.as_deref()).map(|_| 0),
        Commands::Shell { input } => open_shell(&ctx, input).map(|_| 0),
        Commands::Last => {
            match ctx.settings.last_file()? {
                Some(path) => println!("{}", path.display()),
                None => println!("(none)"),
            }
            Ok(0)
        }
    }
}

#[derive(Serialize)]
struct TokenReport<'a> {
    start: usize,
    end: usize,
    kind: TokenKind,
    text: &'a str,
}

fn print_tokens(ctx: &App, input: &Path, json: bool) -> Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Error reading file {}", input.display()))?;

    let mut highlighter = ctx.highlighter();
    highlighter.set_text(&source);
    let tokens = highlighter.tokens();

    if json {
        let reports: Vec<TokenReport> = tokens
            .iter()
            .map(|t| TokenReport {
                start: t.start(),
                end: t.end(),
                kind: t.kind,
                text: t.text(&source, 0),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for token in &tokens {
            println!(
                "{:>6}..{:<6} {:<14} {:?}",
                token.start(),
                token.end(),
                token.kind,
                token.text(&source, 0)
            );
        }
    }
    Ok(())
}

enum Relay {
    Input(String),
    InputClosed,
    Done(Termination),
}

/// Relay this terminal to the interpreter until it exits. Returns the
/// interpreter's exit code.
fn run_interactive(ctx: &App, input: &Path) -> Result<i32> {
    let (tx, rx) = mpsc::channel();
    let done = tx.clone();
    let mut session = ctx.bridge().start(
        input,
        |line| println!("{}", line),
        move |termination| {
            let _ = done.send(Relay::Done(termination));
        },
    );

    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Relay::Input(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(Relay::InputClosed);
    });

    let termination = loop {
        match rx.recv().context("interpreter relay stopped")? {
            Relay::Input(line) => {
                let _ = session.send_input(&line);
            }
            Relay::InputClosed => session.close_input(),
            Relay::Done(termination) => break termination,
        }
    };
    session.join();

    Ok(match termination {
        Termination::Exited { code: Some(code) } => code,
        Termination::Exited { code: None } => 1,
        Termination::LaunchFailed => 127,
    })
}

fn replay(
    ctx: &App,
    input: &Path,
    mut inputs: Vec<String>,
    input_file: Option<&Path>,
) -> Result<()> {
    if let Some(path) = input_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Error reading file {}", path.display()))?;
        inputs.extend(text.lines().map(str::to_string));
    }
    let output = ctx.bridge().run_to_completion(input, &inputs);
    print!("{}", output);
    Ok(())
}

fn open_shell(ctx: &App, input: Option<PathBuf>) -> Result<()> {
    let mut controller = Controller::new(
        ctx.bridge(),
        ctx.highlighter(),
        Some(ctx.settings.clone()),
    );
    match input {
        Some(path) => {
            controller.handle(editor::EditorIntent::OpenFile(path))?;
        }
        None => controller.restore_last_file(),
    }
    shell::run(controller);
    Ok(())
}
