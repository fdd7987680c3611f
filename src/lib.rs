pub mod emit;
mod error;
pub mod pipeline;
pub mod transform;

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

pub use error::Error;

pub use emit::{ArrayEmitter, ElementType, OutputFormat};
pub use pipeline::{Checkpoint, Job, Progress};
pub use transform::{FieldDescriptor, HeaderPolicy, Transform, Transformed};

use log::debug;

/// The complete contents of a firmware image file
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Image {
    data: Vec<u8>,
}

impl Deref for Image {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<Vec<u8>> for Image {
    fn from(data: Vec<u8>) -> Image {
        Image { data }
    }
}

impl Image {
    /// Reads the whole file at `path` into memory.
    ///
    /// Fails with `Error::InputOpenError` if the file can't be opened or read in its entirety.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use brainswitchery::Image;
    ///
    /// let image = Image::load("firmware.bin")?;
    /// println!("FileSize: {}", image.len());
    ///
    /// # Ok::<(), brainswitchery::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Image, Error> {
        let path = path.as_ref();

        debug!("Opening input file {:?}", path);

        let open_error = |err| Error::InputOpenError(path.to_path_buf(), err);
        let mut file = File::open(path).map_err(open_error)?;

        // The file size is only a hint, the read below decides the final length
        let size_hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut data = Vec::with_capacity(size_hint);

        file.read_to_end(&mut data).map_err(open_error)?;

        debug!("Read {} bytes from {:?}", data.len(), path);

        Ok(Image { data })
    }

    /// The size of the image in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Consumes `self` and returns the image bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
