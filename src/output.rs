//! Destinations for emitted share links, one link per line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub trait LinkSink {
    fn push(&mut self, link: &str) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory collection, in emission order.
impl LinkSink for Vec<String> {
    fn push(&mut self, link: &str) -> io::Result<()> {
        Vec::push(self, link.to_string());
        Ok(())
    }
}

/// Writes each link on its own line to any writer, e.g. stdout.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LinkSink for WriterSink<W> {
    fn push(&mut self, link: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", link)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Output file, truncated when the sink is created.
pub type FileSink = WriterSink<BufWriter<File>>;

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(WriterSink::new(BufWriter::new(File::create(path)?)))
    }
}
