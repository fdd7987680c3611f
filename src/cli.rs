use std::path::PathBuf;

use brainswitchery::emit::{ArrayEmitter, ElementType, OutputFormat};
use brainswitchery::transform::{FieldDescriptor, HeaderPolicy, Transform};
use brainswitchery::{Error, Job};
use structopt::StructOpt;

/// Parses `path` and makes sure it points to an existing file
fn existing_file(path: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path);

    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File does not exist: {}", path.display()))
    }
}

/// brainsWitchery -- a binary switcher for firmware binaries
#[derive(StructOpt, Debug)]
#[structopt(name = "brainswitchery")]
pub struct Opts {
    /// Input binary filename
    #[structopt(short = "i", long = "input", parse(try_from_str = existing_file))]
    pub input: PathBuf,

    /// Output binary filename
    #[structopt(short = "o", long = "output", default_value = "a.out")]
    pub output: PathBuf,

    /// Size of the header in the binary, in bytes
    #[structopt(short = "s", long = "headerSize", default_value = "16")]
    pub header_size: usize,

    /// Generate a C++ header instead of a binary
    #[structopt(
        short = "p",
        long = "generateHeader",
        default_value = "true",
        parse(try_from_str)
    )]
    pub generate_header: bool,

    /// Name of the C++ array
    #[structopt(short = "n", long = "name", default_value = "firmware")]
    pub name: String,

    /// Copy the header to the output instead of dropping it
    #[structopt(long = "keep-header")]
    pub keep_header: bool,

    /// Don't emit the checksum constant in the C++ header
    #[structopt(long = "no-crc")]
    pub no_crc: bool,

    /// Offset of the checksum within the header, in bytes
    #[structopt(long = "crc-offset", default_value = "4")]
    pub crc_offset: usize,

    /// Width of the checksum, in bytes
    #[structopt(long = "crc-width", default_value = "4")]
    pub crc_width: usize,

    /// Type of the C++ array elements, `u8` or `byte`
    #[structopt(long = "element-type", default_value = "u8")]
    pub element_type: ElementType,
}

impl Opts {
    /// Converts the options into a `Job`
    ///
    /// The checksum is only extracted when generating a C++ header, since it's only written there.
    pub fn to_job(&self) -> Result<Job, Error> {
        let mut builder = Transform::builder();

        builder.header_size(self.header_size).header_policy(if self.keep_header {
            HeaderPolicy::Retain
        } else {
            HeaderPolicy::Strip
        });

        let format = if self.generate_header {
            if !self.no_crc {
                builder.checksum(FieldDescriptor::new(self.crc_offset, self.crc_width)?);
            }

            OutputFormat::Array(
                ArrayEmitter::new(self.name.as_str()).with_element_type(self.element_type),
            )
        } else {
            OutputFormat::Binary
        };

        Ok(Job {
            input: self.input.clone(),
            output: self.output.clone(),
            transform: builder.build()?,
            format,
        })
    }
}
