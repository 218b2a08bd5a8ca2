//! Console presentation: banner, prompts, result table, status lines.
//!
//! The interactive loop only talks to [`DisplaySurface`]; [`Terminal`] is the
//! crossterm-backed implementation used by the binary.

use std::future::Future;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

use crate::report::ReportRow;

const BANNER: &str = r"
  ___ ____    _____
 |_ _|  _ \  |_   _| __ __ _  ___ ___ _ __
  | || |_) |   | || '__/ _` |/ __/ _ \ '__|
  | ||  __/    | || | | (_| | (_|  __/ |
 |___|_|       |_||_|  \__,_|\___\___|_|
";

const SUBTITLE: &str = "         IP Geolocation Tool";

const SEPARATOR_WIDTH: usize = 48;

const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Everything the interactive loop needs from the console.
pub trait DisplaySurface {
    /// Reset the screen and draw the banner.
    fn banner(&mut self) -> io::Result<()>;

    /// Ask a question and read one line of input, without its line ending.
    /// Returns `None` once input is exhausted.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>>;

    /// Show a failure line.
    fn error(&mut self, message: &str) -> io::Result<()>;

    /// Show a completed trace.
    fn report(&mut self, rows: &[ReportRow]) -> io::Result<()>;

    /// Say goodbye before the process exits.
    fn farewell(&mut self) -> io::Result<()>;

    /// Drive `work` to completion while showing `message` as in progress.
    async fn busy<F: Future>(&mut self, message: &str, work: F) -> F::Output;
}

/// Colored line-oriented terminal UI over any reader/writer pair.
pub struct Terminal<R, W> {
    input: R,
    out: W,
    clear_screen: bool,
}

impl Terminal<StdinLock<'static>, Stdout> {
    /// Terminal bound to the process's stdin and stdout.
    pub fn stdio(clear_screen: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), clear_screen)
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, out: W, clear_screen: bool) -> Self {
        Self {
            input,
            out,
            clear_screen,
        }
    }

    fn separator(&mut self) -> io::Result<()> {
        let line = format!("  {}", "=".repeat(SEPARATOR_WIDTH));
        writeln!(self.out, "{}", line.blue())
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.out
    }
}

impl<R: BufRead, W: Write> DisplaySurface for Terminal<R, W> {
    fn banner(&mut self) -> io::Result<()> {
        if self.clear_screen {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        writeln!(self.out, "{}", BANNER.cyan())?;
        writeln!(self.out, "{}", SUBTITLE.yellow())?;
        self.separator()?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.out, "  {} {}", "[?]".yellow(), question)?;
        self.out.flush()?;

        // Invalid UTF-8 is replaced, never an error.
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "\n  {}\n", format!("[-] {message}").red())?;
        self.out.flush()
    }

    fn report(&mut self, rows: &[ReportRow]) -> io::Result<()> {
        writeln!(self.out)?;
        self.separator()?;
        writeln!(self.out)?;

        for row in rows {
            writeln!(
                self.out,
                "  {}{}  {}",
                format!("{:<14}", row.label).cyan(),
                " >".yellow(),
                row.value.as_str().white().bold()
            )?;
        }

        writeln!(self.out)?;
        self.separator()?;
        writeln!(self.out, "  {}", "[+] Trace completed successfully.".green())?;
        self.separator()?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn farewell(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "\n  {}\n",
            "[+] Goodbye! Thanks for using IP-Tracer.".green()
        )?;
        self.out.flush()
    }

    async fn busy<F: Future>(&mut self, message: &str, work: F) -> F::Output {
        tokio::pin!(work);
        let mut ticker = tokio::time::interval(SPINNER_TICK);
        let mut frame = 0usize;

        // Spinner output is cosmetic; write errors here are ignored and the
        // next real write reports them.
        let output = loop {
            tokio::select! {
                output = &mut work => break output,
                _ = ticker.tick() => {
                    let glyph = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
                    let _ = write!(self.out, "\r  {} {} {}", "[*]".cyan(), message, glyph);
                    let _ = self.out.flush();
                    frame += 1;
                }
            }
        };

        let _ = queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = self.out.flush();
        output
    }
}
