//! The load, transform and write steps of a single conversion

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::debug;

use crate::emit::OutputFormat;
use crate::transform::Transform;
use crate::{Error, Image};

/// Points in a conversion at which progress is reported
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Checkpoint {
    /// The input file is about to be opened
    LoadStart,
    /// The input file has been read
    LoadDone { size: usize },
    /// The output file is about to be opened
    WriteStart,
    /// The output has been written and flushed
    WriteDone { size: usize },
}

/// Receives progress notifications from a running `Job`
pub trait Progress {
    fn checkpoint(&mut self, checkpoint: Checkpoint);
}

impl<F: FnMut(Checkpoint)> Progress for F {
    fn checkpoint(&mut self, checkpoint: Checkpoint) {
        self(checkpoint)
    }
}

/// Discards all progress notifications
impl Progress for () {
    fn checkpoint(&mut self, _checkpoint: Checkpoint) {}
}

/// A single conversion of an input image file to an output file
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub transform: Transform,
    pub format: OutputFormat,
}

impl Job {
    /// Runs the conversion, reporting each step to `progress`.
    ///
    /// The output file is only created once the image has been transformed successfully, so an
    /// invalid configuration leaves no output behind. Returns the number of bytes written.
    pub fn run<P: Progress>(&self, progress: &mut P) -> Result<usize, Error> {
        progress.checkpoint(Checkpoint::LoadStart);

        let image = Image::load(&self.input)?;

        progress.checkpoint(Checkpoint::LoadDone { size: image.size() });

        let transformed = self.transform.apply(&image)?;

        progress.checkpoint(Checkpoint::WriteStart);

        debug!("Opening output file {:?}", self.output);

        let file = File::create(&self.output)
            .map_err(|err| Error::OutputOpenError(self.output.clone(), err))?;
        let mut writer = CountingWriter::new(BufWriter::new(file));

        self.format.write(&mut writer, &transformed)?;
        writer.flush()?;

        let size = writer.count;

        debug!("Wrote {} bytes to {:?}", size, self.output);
        progress.checkpoint(Checkpoint::WriteDone { size });

        Ok(size)
    }
}

/// Counts the bytes written through it
struct CountingWriter<W> {
    inner: W,
    count: usize,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written;

        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
