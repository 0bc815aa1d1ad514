use std::cell::RefCell;
use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Drops every event.
pub struct QuietProgress;

impl ProgressSink for QuietProgress {
    fn event(&self, _event: ProgressEvent) {}
}

/// Byte progress bar for downloads, falling back to a spinner when the
/// server does not announce a length.
#[derive(Default)]
pub struct TerminalProgress {
    bar: RefCell<Option<ProgressBar>>,
    message: RefCell<String>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, total: Option<u64>) -> ProgressBar {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar().template(
                    "  [{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
                ) {
                    bar.set_style(style);
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("  {spinner:.green} {bytes} {msg}")
                {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        bar.set_message(self.message.borrow().clone());
        bar
    }
}

impl ProgressSink for TerminalProgress {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Message(message) => {
                match self.bar.borrow().as_ref() {
                    Some(bar) => bar.println(&message),
                    None => eprintln!("{message}"),
                }
                *self.message.borrow_mut() = message;
            }
            ProgressEvent::Transfer { downloaded, total } => {
                let mut slot = self.bar.borrow_mut();
                let bar = slot.get_or_insert_with(|| self.start(total));
                bar.set_position(downloaded);
            }
            ProgressEvent::TransferDone => {
                if let Some(bar) = self.bar.borrow_mut().take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}
