//! A line-buffered GAS output sink.
//!
//! Mirrors the teacher corpus's own habit of wrapping `std::io::Write` in a
//! thin line-assembling layer rather than formatting each directive as one
//! independent `write!` call; grounded directly in the original's
//! `AsmStreamer`, whose `operator<<` overloads this collapses into plain
//! methods since Rust has no streaming-operator sugar to lean on.

use std::io::{self, Write};

const TAB: &str = "    ";

pub struct AsmStreamer<W: Write> {
    out: W,
    line: String,
}

impl<W: Write> AsmStreamer<W> {
    pub fn new(out: W) -> AsmStreamer<W> {
        AsmStreamer {
            out,
            line: String::new(),
        }
    }

    /// Flushes a pending, not-yet-newline-terminated buffered line.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.line.is_empty() {
            return Ok(());
        }
        if !self.line.ends_with('\n') {
            self.line.push('\n');
        }
        self.out.write_all(self.line.as_bytes())?;
        self.line.clear();
        Ok(())
    }

    /// Flushes whatever was pending, then starts a new buffered line with
    /// `\t<name>`. Callers append to it with `append` before the next
    /// directive/label/byte flushes it out.
    pub fn directive(&mut self, name: &str) -> io::Result<&mut Self> {
        self.flush()?;
        self.line.push_str(TAB);
        self.line.push_str(name);
        Ok(self)
    }

    /// Appends raw text to the line currently being assembled.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.line.push_str(text);
        self
    }

    pub fn append_fmt(&mut self, args: std::fmt::Arguments<'_>) -> &mut Self {
        use std::fmt::Write as _;
        let _ = self.line.write_fmt(args);
        self
    }

    pub fn label(&mut self, name: &str) -> io::Result<()> {
        self.flush()?;
        let mut line = name.to_string();
        if !line.ends_with(':') {
            line.push(':');
        }
        line.push('\n');
        self.out.write_all(line.as_bytes())
    }

    pub fn byte(&mut self, b: u8) -> io::Result<()> {
        self.flush()?;
        self.out.write_all(format!("{TAB}.byte {b}\n").as_bytes())
    }

    pub fn raw_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &b in bytes {
            self.byte(b)?;
        }
        Ok(())
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.flush()?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> Drop for AsmStreamer<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_emits_one_byte_directive_per_byte() {
        let mut buf = Vec::new();
        {
            let mut streamer = AsmStreamer::new(&mut buf);
            streamer.raw_bytes(&[1, 2, 3, 4]).unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "    .byte 1\n    .byte 2\n    .byte 3\n    .byte 4\n"
        );
    }

    #[test]
    fn directive_then_append_builds_one_composed_line() {
        let mut buf = Vec::new();
        {
            let mut streamer = AsmStreamer::new(&mut buf);
            streamer.directive(".type").unwrap().append(" sym,@object");
            streamer.label("sym").unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "    .type sym,@object\nsym:\n"
        );
    }

    #[test]
    fn label_appends_colon_when_missing() {
        let mut buf = Vec::new();
        {
            let mut streamer = AsmStreamer::new(&mut buf);
            streamer.label("foo").unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "foo:\n");
    }
}
