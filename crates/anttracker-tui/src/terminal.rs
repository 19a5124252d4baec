// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::queue;
use crossterm::style::{PrintStyledContent, Stylize};
use crossterm::tty::IsTty;
use std::io::{self, BufRead, Stdin, Stdout, Write};

use crate::table::{Column, TableCell, render_table};

/// Reserved input that backs out of the current prompt.
pub const ABORT: &str = "`";

/// Line-oriented console used by every screen. Implementors supply raw
/// output and input; prompting and table layout are shared.
pub trait Terminal {
    fn print(&mut self, text: &str) -> Result<()>;
    fn print_line(&mut self, text: &str) -> Result<()>;

    /// Next input line without its terminator, or `None` once input is closed.
    fn read_line(&mut self) -> Result<Option<String>>;

    fn blank_line(&mut self) -> Result<()> {
        self.print_line("")
    }

    fn title(&mut self, text: &str) -> Result<()> {
        self.print_line(&format!("== {text} =="))
    }

    /// Show `message` until the answer is one of `choices`. Closed input
    /// counts as [`ABORT`].
    fn prompt_choice(&mut self, message: &str, choices: &[String]) -> Result<String> {
        loop {
            self.print_line(message)?;
            let Some(answer) = self.read_line()? else {
                return Ok(ABORT.to_owned());
            };
            if choices.iter().any(|choice| *choice == answer) {
                return Ok(answer);
            }
        }
    }

    /// Show `message` until `valid` accepts the answer. [`ABORT`] is always
    /// returned as-is, as is an empty answer when `allow_empty` is set.
    fn prompt_valid(
        &mut self,
        message: &str,
        allow_empty: bool,
        valid: &dyn Fn(&str) -> bool,
    ) -> Result<String> {
        loop {
            self.print_line(message)?;
            let Some(answer) = self.read_line()? else {
                return Ok(ABORT.to_owned());
            };
            if answer == ABORT || (allow_empty && answer.trim().is_empty()) || valid(&answer) {
                return Ok(answer);
            }
        }
    }

    fn display_table(&mut self, columns: &[Column], rows: &[Vec<TableCell>]) -> Result<()> {
        for line in render_table(columns, rows, true) {
            self.print_line(&line)?;
        }
        Ok(())
    }
}

/// Terminal on the process's stdin and stdout. Titles are bold when stdout
/// is a tty.
pub struct StdTerminal {
    stdin: Stdin,
    stdout: Stdout,
    styled: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        let stdout = io::stdout();
        let styled = stdout.is_tty();
        Self {
            stdin: io::stdin(),
            stdout,
            styled,
        }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn print(&mut self, text: &str) -> Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(text.as_bytes()).context("write to stdout")?;
        out.flush().context("flush stdout")
    }

    fn print_line(&mut self, text: &str) -> Result<()> {
        let mut out = self.stdout.lock();
        writeln!(out, "{text}").context("write to stdout")?;
        out.flush().context("flush stdout")
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .stdin
            .lock()
            .read_line(&mut line)
            .context("read from stdin")?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn title(&mut self, text: &str) -> Result<()> {
        if !self.styled {
            return self.print_line(&format!("== {text} =="));
        }
        let mut out = self.stdout.lock();
        queue!(out, PrintStyledContent(format!("== {text} ==").bold()))
            .context("write title")?;
        writeln!(out).context("write to stdout")?;
        out.flush().context("flush stdout")
    }
}
