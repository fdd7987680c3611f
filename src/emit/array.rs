use std::io::{self, Write};
use std::str::FromStr;

use thiserror::Error;

/// The array identifier used when the user doesn't provide one
pub const DEFAULT_NAME: &str = "firmware";

/// The number of array elements written on each line
const ELEMENTS_PER_LINE: usize = 10;

/// The C++ type of the array elements
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementType {
    /// `std::uint8_t`, written as plain hex literals
    U8,
    /// `std::byte`, written as `std::byte{0x..}`
    StdByte,
}

impl ElementType {
    fn type_name(self) -> &'static str {
        match self {
            ElementType::U8 => "std::uint8_t",
            ElementType::StdByte => "std::byte",
        }
    }

    fn write_element<W: Write>(self, writer: &mut W, byte: u8) -> io::Result<()> {
        match self {
            ElementType::U8 => write!(writer, "0x{:02x}", byte),
            ElementType::StdByte => write!(writer, "std::byte{{0x{:02x}}}", byte),
        }
    }
}

impl Default for ElementType {
    fn default() -> ElementType {
        ElementType::U8
    }
}

#[derive(Debug, Error)]
#[error("Unknown element type {0:?}, expected `u8` or `byte`")]
pub struct UnknownElementType(String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" | "uint8_t" | "std::uint8_t" => Ok(ElementType::U8),
            "byte" | "std::byte" => Ok(ElementType::StdByte),
            _ => Err(UnknownElementType(s.to_owned())),
        }
    }
}

/// Renders a byte sequence as a C++ header with a `std::array` declaration
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ArrayEmitter {
    /// The identifier of the array, also the base name of the checksum constant
    name: String,
    element_type: ElementType,
}

impl ArrayEmitter {
    pub fn new<S: Into<String>>(name: S) -> ArrayEmitter {
        ArrayEmitter {
            name: name.into(),
            element_type: ElementType::default(),
        }
    }

    pub fn with_element_type(mut self, element_type: ElementType) -> ArrayEmitter {
        self.element_type = element_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The identifier of the checksum constant
    pub fn checksum_name(&self) -> String {
        format!("{}_CRC", self.name)
    }

    /// Writes the header for `bytes` to `writer`, followed by a constant holding `checksum` if
    /// one is given
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        bytes: &[u8],
        checksum: Option<u64>,
    ) -> io::Result<()> {
        writer.write_all(b"#pragma once\n\n#include <array>\n")?;

        if self.element_type == ElementType::StdByte {
            writer.write_all(b"#include <cstddef>\n")?;
        }

        writer.write_all(b"#include <cstdint>\n\n")?;

        write!(
            writer,
            "static constexpr std::array<{}, {}> {} {{",
            self.element_type.type_name(),
            bytes.len(),
            self.name
        )?;

        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                writer.write_all(b",")?;
            }

            // Start a new line before every group of elements
            if i % ELEMENTS_PER_LINE == 0 {
                writer.write_all(b"\n  ")?;
            } else {
                writer.write_all(b" ")?;
            }

            self.element_type.write_element(writer, *byte)?;
        }

        writer.write_all(b"\n};\n")?;

        if let Some(checksum) = checksum {
            let checksum_type = if checksum > u64::from(u32::MAX) {
                "std::uint64_t"
            } else {
                "std::uint32_t"
            };

            write!(
                writer,
                "\nstatic constexpr {} {}{{{:#x}}};\n",
                checksum_type,
                self.checksum_name(),
                checksum
            )?;
        }

        Ok(())
    }

    /// Renders the header for `bytes` to a `String`
    pub fn render(&self, bytes: &[u8], checksum: Option<u64>) -> String {
        let mut buf: Vec<u8> = Vec::with_capacity(bytes.len() * 6 + 128);

        // Writing to a `Vec` can't fail and everything written is ASCII
        let _ = self.write_to(&mut buf, bytes, checksum);

        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Default for ArrayEmitter {
    fn default() -> ArrayEmitter {
        ArrayEmitter::new(DEFAULT_NAME)
    }
}
