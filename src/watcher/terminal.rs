//! Interactive terminal progress display.

use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
    QueueableCommand,
};

use super::{advance, Watcher};

const BAR_WIDTH: usize = 30;

/// Watcher that draws two progress bars and a status line in place.
///
/// The display occupies three terminal lines and is redrawn on every
/// update; [`end`](Watcher::end) leaves the final state on screen and moves
/// the cursor below it.
#[derive(Debug, Default)]
pub struct TerminalWatcher {
    download: u8,
    applied: u8,
    status: String,
    drawn: bool,
    ended: bool,
}

impl TerminalWatcher {
    /// Create a fresh terminal watcher.
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();

        if self.drawn {
            stdout.queue(cursor::MoveUp(3))?;
        }
        self.drawn = true;

        for (label, pct) in [("Download", self.download), ("Apply   ", self.applied)] {
            stdout.queue(cursor::MoveToColumn(0))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(Print(format!("{} {} {:>3}%\n", label.cyan().bold(), render_bar(pct), pct)))?;
        }

        stdout.queue(cursor::MoveToColumn(0))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(format!("{}\n", self.status.clone().dark_grey())))?;

        stdout.flush()
    }
}

/// Render a fixed-width progress bar.
fn render_bar(pct: u8) -> String {
    let filled = usize::from(pct.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl Watcher for TerminalWatcher {
    fn write_status(&mut self, text: &str) {
        if text != self.status {
            self.status = text.to_string();
            let _ = self.draw();
        }
    }

    fn download_percent(&mut self, pct: u8) -> u8 {
        let next = advance(self.download, pct);
        if next > self.download {
            self.download = next;
            let _ = self.draw();
        }
        self.download
    }

    fn current_download(&self) -> u8 {
        self.download
    }

    fn applied_percent(&mut self, pct: u8) -> u8 {
        let next = advance(self.applied, pct);
        if next > self.applied {
            self.applied = next;
            let _ = self.draw();
        }
        self.applied
    }

    fn current_applied(&self) -> u8 {
        self.applied
    }

    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        let _ = self.draw();
        let mut stdout = io::stdout();
        let _ = stdout.queue(Print("\n"));
        let _ = stdout.flush();
    }
}
