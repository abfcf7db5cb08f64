use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};
use std::io::{self, Write};

/// Raw mode for as long as this value lives.
pub struct RawMode;

impl RawMode {
    pub fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

/// Print `lines` above the prompt, then redraw the prompt.
pub fn print_above(lines: &[String], prompt: &str) -> Result<()> {
    let mut out = io::stdout();
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for line in lines {
        queue!(out, Print(line), Print("\r\n"))?;
    }
    queue!(out, Print(prompt))?;
    out.flush().context("Failed to flush terminal")
}

pub fn redraw_prompt(prompt: &str) -> Result<()> {
    print_above(&[], prompt)
}

pub fn finish_line() -> Result<()> {
    execute!(io::stdout(), Print("\r\n")).context("Failed to write to terminal")
}

/// What a key press did to the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Changed,
    Unchanged,
    Submit(String),
    Quit,
}

/// Single-line input buffer driven by key events.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Put a rejected submission back into the line.
    pub fn restore(&mut self, text: String) {
        self.buffer = text;
    }

    pub fn handle(&mut self, key: KeyEvent) -> Edit {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => Edit::Quit,
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char(c) => {
                self.buffer.push(c);
                Edit::Changed
            }
            KeyCode::Backspace => match self.buffer.pop() {
                Some(_) => Edit::Changed,
                None => Edit::Unchanged,
            },
            KeyCode::Esc => self.clear(),
            KeyCode::Enter => Edit::Submit(std::mem::take(&mut self.buffer)),
            _ => Edit::Unchanged,
        }
    }

    fn clear(&mut self) -> Edit {
        if self.buffer.is_empty() {
            Edit::Unchanged
        } else {
            self.buffer.clear();
            Edit::Changed
        }
    }
}
