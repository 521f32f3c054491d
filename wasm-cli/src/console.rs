//! Line-oriented operator terminal.
//!
//! Generic over the reader and writer so interactive flows can be driven by
//! scripted input in tests.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

/// Input line that cancels the current interactive flow.
pub const QUIT: &str = ":q";

/// Source of operator input lines.
pub trait ReadLine {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl<T: BufRead> ReadLine for T {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Process stdin, locked only for the duration of each read so menus and
/// nested consoles can read it too.
pub struct StdinLines(io::Stdin);

impl ReadLine for StdinLines {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.0.read_line(buf)
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLines, io::Stdout> {
    /// Console bound to the process's stdin / stdout.
    pub fn stdio() -> Self {
        Self::new(StdinLines(io::stdin()), io::stdout())
    }
}

impl<R: ReadLine, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Write `text` without a newline and read one line back.
    ///
    /// Returns `None` on end of input or when the operator types [`QUIT`].
    pub fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line == QUIT {
            return Ok(None);
        }
        Ok(Some(line.to_string()))
    }

    pub fn say(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Show `text` and wait for the operator to press Enter.
    pub fn pause(&mut self, text: impl Display) -> io::Result<()> {
        self.prompt(&format!("{text}. Press Enter to continue!"))?;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
