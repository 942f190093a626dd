//! Batch runs with predefined input

use std::io::BufWriter;
use std::path::Path;
use std::thread;

use crate::bridge::session::{for_each_line, write_line};
use crate::bridge::ProcessBridge;

impl ProcessBridge {
    /// Run `source` to completion, feeding `inputs` as stdin lines, and
    /// return everything the interpreter printed.
    ///
    /// Blocks until the process exits. A launch failure is returned as the
    /// output text rather than as an error.
    pub fn run_to_completion<S: AsRef<str> + Sync>(&self, source: &Path, inputs: &[S]) -> String {
        let (_executable, mut child, output) = match self.launch(source) {
            Ok(launched) => launched,
            Err(e) => {
                log::warn!("could not start interpreter: {}", e);
                return format!("Error running interpreter: {}\n", e);
            }
        };
        let stdin = child.stdin.take();

        let captured = thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let Some(stdin) = stdin else { return };
                let mut stdin = BufWriter::new(stdin);
                for line in inputs {
                    if let Err(e) = write_line(&mut stdin, line.as_ref()) {
                        log::warn!("Failed to send input: {}", e);
                        break;
                    }
                }
                // Dropping stdin here lets the interpreter see end of input
            });

            let reader = scope.spawn(move || {
                let mut captured = String::new();
                for_each_line(output, |line| {
                    captured.push_str(&line);
                    captured.push('\n');
                });
                captured
            });

            if writer.join().is_err() {
                log::warn!("input relay panicked");
            }
            match child.wait() {
                Ok(status) => log::info!("interpreter finished: {}", status),
                Err(e) => log::warn!("could not read interpreter exit status: {}", e),
            }
            reader.join().unwrap_or_else(|_| {
                log::warn!("output relay panicked");
                String::new()
            })
        });

        captured
    }
}
