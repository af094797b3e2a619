//! # Development Backends
//!
//! Stand-ins for the LED and button when running without GPIO hardware
//! (`--stdout`). The LED prints its transitions to stdout; pressing Enter on stdin
//! acts as a button press.

use crate::actuator::Actuator;
use crate::error::ActuatorError;
use crate::input::{EdgeLatch, InputSource};
use std::io::{self, BufRead};
use std::thread;

/// LED that renders to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleLed {
    lit: Option<bool>,
}

impl ConsoleLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self) -> bool {
        self.lit.unwrap_or(false)
    }
}

impl Actuator for ConsoleLed {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.lit != Some(on) {
            println!("{}", render(on));
        }
        self.lit = Some(on);
        Ok(())
    }
}

fn render(on: bool) -> &'static str {
    if on {
        "LED \u{25CF} ON   (rain likely)"
    } else {
        "LED \u{25CB} off"
    }
}

/// Button fed by Enter presses on stdin.
pub struct ConsoleButton {
    latch: EdgeLatch,
}

impl ConsoleButton {
    /// Spawn the stdin reader. The thread ends when stdin closes.
    pub fn spawn() -> io::Result<Self> {
        let latch = EdgeLatch::new();
        let producer = latch.clone();
        thread::Builder::new()
            .name("console-button".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    if line.is_err() {
                        break;
                    }
                    producer.trigger();
                }
            })?;
        Ok(Self { latch })
    }
}

impl InputSource for ConsoleButton {
    fn take_edge(&mut self) -> Result<bool, ActuatorError> {
        Ok(self.latch.take())
    }
}
