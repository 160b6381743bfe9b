use std::io::{self, BufRead, Write};

pub const PROMPT: &str = ": ";

/// Shows the prompt and reads one line at a time.
pub struct LineReader<R, W> {
    input: R,
    output: W,
    buffer: Vec<u8>,
}

impl<R: BufRead, W: Write> LineReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LineReader {
            input,
            output,
            buffer: Vec::new(),
        }
    }

    /// Returns `Ok(None)` once the input is exhausted.
    ///
    /// Bytes that aren't valid UTF-8 are replaced with U+FFFD rather than
    /// failing the read.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.write_all(PROMPT.as_bytes())?;
        self.output.flush()?;

        self.buffer.clear();
        if self.input.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }

        let line = self.buffer.strip_suffix(b"\n").unwrap_or(&self.buffer);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}
