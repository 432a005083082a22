//! Destination for values written by `PRINT`.
//!
//! The [`Output`] trait decouples the VM from standard output so embedders and
//! tests can capture printed values. [`StdoutOutput`] writes one decimal value
//! per line; `Vec<i32>` collects the values.

use std::io::{self, Write};

/// Sink for `PRINT` values.
pub trait Output {
    /// Emits one value. An `Err` carries a message and faults the run.
    fn print(&mut self, value: i32) -> Result<(), String>;
}

/// Writes each value as a decimal line to standard output.
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl StdoutOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for StdoutOutput {
    fn print(&mut self, value: i32) -> Result<(), String> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{value}").map_err(|e| e.to_string())
    }
}

impl Output for Vec<i32> {
    fn print(&mut self, value: i32) -> Result<(), String> {
        self.push(value);
        Ok(())
    }
}

/// Writes each value as a decimal line to any writer.
#[derive(Debug)]
pub struct WriterOutput<W: Write> {
    writer: W,
}

impl<W: Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Output for WriterOutput<W> {
    fn print(&mut self, value: i32) -> Result<(), String> {
        writeln!(self.writer, "{value}").map_err(|e| e.to_string())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Sink that rejects every value.
    pub struct FailingOutput;

    impl Output for FailingOutput {
        fn print(&mut self, _value: i32) -> Result<(), String> {
            Err("sink closed".to_string())
        }
    }

    #[test]
    fn vec_collects_values() {
        let mut out = Vec::new();
        out.print(5).unwrap();
        out.print(-1).unwrap();
        assert_eq!(out, vec![5, -1]);
    }

    #[test]
    fn writer_formats_decimal_lines() {
        let mut out = WriterOutput::new(Vec::new());
        out.print(1_000_000).unwrap();
        out.print(-3).unwrap();
        assert_eq!(out.into_inner(), b"1000000\n-3\n");
    }

    #[test]
    fn failing_output_reports_message() {
        assert_eq!(FailingOutput.print(0), Err("sink closed".to_string()));
    }
}
