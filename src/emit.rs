//! Output formats for transformed firmware images

mod array;

use std::io::{self, Write};

use crate::transform::Transformed;

pub use array::{ArrayEmitter, ElementType, UnknownElementType, DEFAULT_NAME};

/// Selects how a transformed image is written to its destination
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    /// The transformed bytes as-is
    Binary,
    /// A C++ header declaring the transformed bytes as an array
    Array(ArrayEmitter),
}

impl OutputFormat {
    /// Writes `transformed` to `writer` in this format
    ///
    /// The checksum is only written in the array format.
    pub fn write<W: Write>(&self, writer: &mut W, transformed: &Transformed) -> io::Result<()> {
        match self {
            OutputFormat::Binary => writer.write_all(transformed.data()),
            OutputFormat::Array(emitter) => {
                emitter.write_to(writer, transformed.data(), transformed.checksum())
            }
        }
    }
}

impl Default for OutputFormat {
    fn default() -> OutputFormat {
        OutputFormat::Array(ArrayEmitter::default())
    }
}
