use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error when opening input file {}: {}", .0.display(), .1)]
    InputOpenError(PathBuf, #[source] io::Error),
    #[error("Error when opening output file {}: {}", .0.display(), .1)]
    OutputOpenError(PathBuf, #[source] io::Error),
    #[error("I/O error: {}", .0)]
    IoError(#[from] io::Error),
    #[error(
        "Invalid header size {header_size}: the image is {image_len} bytes and the header must hold at least {required} bytes"
    )]
    InvalidHeaderSize {
        header_size: usize,
        image_len: usize,
        required: usize,
    },
    #[error("Invalid word size {} - a word must be at least one byte", .0)]
    InvalidWordSize(usize),
    #[error("Invalid checksum field width {} - expected between 1 and 8 bytes", .0)]
    InvalidFieldWidth(usize),
}
