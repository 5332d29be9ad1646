use anyhow::Context;
use crossterm::{
    ExecutableCommand, cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    terminal::{self, ClearType},
};
use std::io::{Stdout, Write, stdout};

/// Raw mode, alternate screen and bracketed paste for the lifetime of the
/// guard. Paste arrives as one event, so a dropped-in image path reaches the
/// open prompt intact instead of being replayed as key bindings.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Construct before the remaining steps so Drop undoes raw mode on failure.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;
        out.execute(EnableBracketedPaste)
            .context("enable bracketed paste")?;
        log::debug!("terminal entered raw mode");

        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }

    /// Terminal size as (cols, rows).
    pub fn size() -> anyhow::Result<(u16, u16)> {
        terminal::size().context("get terminal size")
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        // Undo sync output, autowrap and color state left by the renderers.
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(DisableBracketedPaste);
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        log::debug!("terminal restored");
    }
}
