use anyhow::Context;
use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, BufWriter, Stdout, Write};

/// Raw-mode alternate screen holding the interactive status panel. The terminal is restored
/// on drop, including when the host loop bails out with an error.
pub struct StageScreen {
    out: BufWriter<Stdout>,
    rows_drawn: u16,
}

impl StageScreen {
    pub fn open() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Drop must run from here on, so raw mode is undone if setup fails below.
        let mut screen = Self {
            out: BufWriter::new(stdout()),
            rows_drawn: 0,
        };
        screen
            .out
            .execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?
            .execute(terminal::Clear(ClearType::All))
            .context("clear screen")?
            .execute(cursor::Hide)
            .context("hide cursor")?;
        log::debug!("stage screen open");
        Ok(screen)
    }

    /// Redraws the panel from the top-left, one line per row, clipped to the terminal width.
    /// Rows left over from a taller previous frame are cleared.
    pub fn draw<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) -> anyhow::Result<()> {
        let (cols, _) = terminal::size().context("get terminal size")?;
        let width = usize::from(cols);
        let mut row: u16 = 0;
        for line in lines {
            let clipped: String = line.chars().take(width).collect();
            queue!(
                self.out,
                cursor::MoveTo(0, row),
                terminal::Clear(ClearType::CurrentLine),
                Print(clipped)
            )?;
            row = row.saturating_add(1);
        }
        for stale in row..self.rows_drawn {
            queue!(
                self.out,
                cursor::MoveTo(0, stale),
                terminal::Clear(ClearType::CurrentLine)
            )?;
        }
        self.rows_drawn = row;
        self.out.flush().context("flush stage screen")?;
        Ok(())
    }
}

impl Drop for StageScreen {
    fn drop(&mut self) {
        let _ = self.out.flush();
        let _ = terminal::disable_raw_mode();
        let _ = self.out.execute(cursor::Show);
        let _ = self.out.execute(terminal::LeaveAlternateScreen);
    }
}
