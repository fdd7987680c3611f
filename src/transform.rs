//! Byte order transformation of firmware images

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};

use crate::Error;

/// The header size used when the user doesn't provide one
pub const DEFAULT_HEADER_SIZE: usize = 16;

/// The size of the unit that byte order reversal is applied to
pub const DEFAULT_WORD_SIZE: usize = 4;

/// The largest field that can be read into a `u64`
const MAX_FIELD_WIDTH: usize = 8;

/// Describes where a fixed-width little endian integer is located within the image header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FieldDescriptor {
    /// Offset from the start of the header, in bytes
    offset: usize,
    /// Width of the field, in bytes
    width: usize,
}

impl FieldDescriptor {
    /// The checksum field found in the header of the images this tool was written for: a 32-bit
    /// value at offset 4
    pub const CHECKSUM: FieldDescriptor = FieldDescriptor {
        offset: 4,
        width: 4,
    };

    /// Creates a new field descriptor for a field of `width` bytes at `offset`
    ///
    /// Returns `Error::InvalidFieldWidth` if `width` is not between 1 and 8 bytes.
    pub fn new(offset: usize, width: usize) -> Result<FieldDescriptor, Error> {
        if width == 0 || width > MAX_FIELD_WIDTH {
            return Err(Error::InvalidFieldWidth(width));
        }

        Ok(FieldDescriptor { offset, width })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the smallest header size that can contain this field
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.width)
    }

    /// Reads the field verbatim from `header` as a little endian unsigned integer
    fn read_from(&self, header: &[u8]) -> Result<u64, Error> {
        let mut field = &header[self.offset..self.end()];

        Ok(field.read_uint::<LittleEndian>(self.width)?)
    }
}

impl Default for FieldDescriptor {
    fn default() -> FieldDescriptor {
        FieldDescriptor::CHECKSUM
    }
}

/// Decides what happens to the header bytes in the transformed output
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HeaderPolicy {
    /// The header is dropped from the output
    Strip,
    /// The header is copied to the output untouched, followed by the transformed payload
    Retain,
}

impl Default for HeaderPolicy {
    fn default() -> HeaderPolicy {
        HeaderPolicy::Strip
    }
}

/// Converts the byte order of the words in a firmware image payload
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Transform {
    header_size: usize,
    word_size: usize,
    header_policy: HeaderPolicy,
    /// The header field to extract, if any
    checksum: Option<FieldDescriptor>,
}

impl Transform {
    pub fn builder() -> TransformBuilder {
        TransformBuilder::default()
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn header_policy(&self) -> HeaderPolicy {
        self.header_policy
    }

    pub fn checksum(&self) -> Option<FieldDescriptor> {
        self.checksum
    }

    /// The minimum header size this transform accepts
    fn required_header_size(&self) -> usize {
        self.checksum.map_or(0, |field| field.end())
    }

    /// Applies the transformation to `image` and returns the result as a new buffer
    ///
    /// Returns `Error::InvalidHeaderSize` if the header is larger than the image, or if it is too
    /// small to contain the checksum field.
    pub fn apply(&self, image: &[u8]) -> Result<Transformed, Error> {
        let required = self.required_header_size();

        if self.header_size > image.len() || self.header_size < required {
            return Err(Error::InvalidHeaderSize {
                header_size: self.header_size,
                image_len: image.len(),
                required,
            });
        }

        let (header, payload) = image.split_at(self.header_size);

        // Read the checksum before anything is moved around
        let checksum = self
            .checksum
            .map(|field| field.read_from(header))
            .transpose()?;

        if let Some(checksum) = checksum {
            trace!("Extracted checksum {:#x} from header", checksum);
        }

        let mut data = Vec::with_capacity(image.len());

        if self.header_policy == HeaderPolicy::Retain {
            data.extend_from_slice(header);
        }

        let header_len = data.len();

        data.extend_from_slice(payload);
        reverse_words(&mut data[header_len..], self.word_size);

        debug!(
            "Transformed {} payload bytes in words of {} ({:?} header of {} bytes)",
            payload.len(),
            self.word_size,
            self.header_policy,
            self.header_size
        );

        Ok(Transformed {
            data,
            header_len,
            checksum,
        })
    }
}

/// Builder for `Transform`
#[derive(Debug, Default)]
pub struct TransformBuilder {
    header_size: Option<usize>,
    word_size: Option<usize>,
    header_policy: HeaderPolicy,
    checksum: Option<FieldDescriptor>,
}

impl TransformBuilder {
    /// Sets the size of the header to `header_size` bytes
    pub fn header_size(&mut self, header_size: usize) -> &mut TransformBuilder {
        self.header_size = Some(header_size);
        self
    }

    /// Sets the size of the words whose bytes are reversed
    pub fn word_size(&mut self, word_size: usize) -> &mut TransformBuilder {
        self.word_size = Some(word_size);
        self
    }

    pub fn header_policy(&mut self, header_policy: HeaderPolicy) -> &mut TransformBuilder {
        self.header_policy = header_policy;
        self
    }

    /// Extracts the header field described by `field` as the image checksum
    pub fn checksum(&mut self, field: FieldDescriptor) -> &mut TransformBuilder {
        self.checksum = Some(field);
        self
    }

    /// Builds the final `Transform`
    ///
    /// Returns `Error::InvalidWordSize` if the word size was set to zero.
    pub fn build(&self) -> Result<Transform, Error> {
        let word_size = self.word_size.unwrap_or(DEFAULT_WORD_SIZE);

        if word_size == 0 {
            return Err(Error::InvalidWordSize(word_size));
        }

        Ok(Transform {
            header_size: self.header_size.unwrap_or(DEFAULT_HEADER_SIZE),
            word_size,
            header_policy: self.header_policy,
            checksum: self.checksum,
        })
    }
}

/// The output of a `Transform`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Transformed {
    data: Vec<u8>,
    /// Number of retained header bytes at the start of `data`
    header_len: usize,
    checksum: Option<u64>,
}

impl Transformed {
    /// The complete output, header included if it was retained
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The retained header bytes, empty when the header was stripped
    pub fn header(&self) -> &[u8] {
        &self.data[..self.header_len]
    }

    /// The payload with the byte order of each word reversed
    pub fn payload(&self) -> &[u8] {
        &self.data[self.header_len..]
    }

    /// The checksum extracted from the header
    pub fn checksum(&self) -> Option<u64> {
        self.checksum
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Reverses the order of the bytes within each `word_size` chunk of `data`
///
/// Chunks are taken from the start of `data`. A trailing chunk shorter than `word_size` is
/// reversed across its own length.
///
/// # Panics
///
/// Panics if `word_size` is 0.
pub fn reverse_words(data: &mut [u8], word_size: usize) {
    let remainder = data.len() % word_size;

    if remainder != 0 {
        trace!(
            "Payload of {} bytes ends with a partial word of {} bytes",
            data.len(),
            remainder
        );
    }

    for word in data.chunks_mut(word_size) {
        word.reverse();
    }
}

#[cfg(test)]
mod tests {
    use assert_hex::assert_eq_hex;
    use hex_literal::hex;

    use super::*;

    fn strip_with_checksum() -> Transform {
        Transform::builder()
            .checksum(FieldDescriptor::CHECKSUM)
            .build()
            .unwrap()
    }

    #[test]
    fn it_should_extract_checksum_and_strip_header() {
        let image = hex!("00 00 00 00 78 56 34 12 00 00 00 00 00 00 00 00 AA BB CC DD");
        let transformed = strip_with_checksum().apply(&image).unwrap();

        assert_eq!(transformed.checksum(), Some(0x12345678));
        assert!(transformed.header().is_empty());
        assert_eq_hex!(transformed.data(), &hex!("DD CC BB AA")[..]);
    }

    #[test]
    fn it_should_reverse_trailing_partial_word() {
        let image: Vec<u8> = (0..15).collect();
        let transform = Transform::builder().header_size(0).build().unwrap();
        let transformed = transform.apply(&image).unwrap();

        assert_eq_hex!(
            transformed.data(),
            &hex!("03 02 01 00 07 06 05 04 0B 0A 09 08 0E 0D 0C")[..]
        );
    }

    #[test]
    fn it_should_return_original_payload_when_applied_twice() {
        let image: Vec<u8> = (0..64).map(|x| x * 3).collect();
        let transform = Transform::builder().header_size(0).build().unwrap();

        let once = transform.apply(&image).unwrap();
        let twice = transform.apply(once.data()).unwrap();

        assert_eq_hex!(twice.data(), &image[..]);
    }

    #[test]
    fn it_should_preserve_payload_length() {
        let image = [0xFFu8; 37];

        for &policy in &[HeaderPolicy::Strip, HeaderPolicy::Retain] {
            let transformed = Transform::builder()
                .header_policy(policy)
                .build()
                .unwrap()
                .apply(&image)
                .unwrap();

            assert_eq!(transformed.payload().len(), 37 - DEFAULT_HEADER_SIZE);
        }
    }

    #[test]
    fn it_should_retain_header_untouched() {
        let image = hex!("00 11 22 33 44 55 66 77 88 99");
        let transformed = Transform::builder()
            .header_size(4)
            .header_policy(HeaderPolicy::Retain)
            .build()
            .unwrap()
            .apply(&image)
            .unwrap();

        assert_eq_hex!(transformed.header(), &hex!("00 11 22 33")[..]);
        assert_eq_hex!(
            transformed.data(),
            &hex!("00 11 22 33 77 66 55 44 99 88")[..]
        );
    }

    #[test]
    fn it_should_align_words_to_payload_not_image() {
        // A header that isn't word aligned must not shift the word boundaries of the payload
        let image = hex!("A0 A1 A2 A3 A4 A5 00 01 02 03 04 05 06 07");
        let transformed = Transform::builder()
            .header_size(6)
            .header_policy(HeaderPolicy::Retain)
            .build()
            .unwrap()
            .apply(&image)
            .unwrap();

        assert_eq_hex!(
            transformed.data(),
            &hex!("A0 A1 A2 A3 A4 A5 03 02 01 00 07 06 05 04")[..]
        );
    }

    #[test]
    fn it_should_not_modify_header_when_extracting_checksum() {
        let image = hex!("01 02 03 04 78 56 34 12 05 06 07 08 09 0A 0B 0C 10 20 30 40");
        let transformed = Transform::builder()
            .header_policy(HeaderPolicy::Retain)
            .checksum(FieldDescriptor::CHECKSUM)
            .build()
            .unwrap()
            .apply(&image)
            .unwrap();

        assert_eq!(transformed.checksum(), Some(0x12345678));
        assert_eq_hex!(transformed.header(), &image[..16]);
    }

    #[test]
    fn it_should_read_custom_checksum_field() {
        let image = hex!("00 00 CD AB 00 00");
        let field = FieldDescriptor::new(2, 2).unwrap();
        let transformed = Transform::builder()
            .header_size(6)
            .checksum(field)
            .build()
            .unwrap()
            .apply(&image)
            .unwrap();

        assert_eq!(transformed.checksum(), Some(0xABCD));
        assert!(transformed.data().is_empty());
    }

    #[test]
    fn it_should_reject_header_larger_than_image() {
        let result = Transform::builder().build().unwrap().apply(&[0u8; 8]);

        match result {
            Err(Error::InvalidHeaderSize {
                header_size,
                image_len,
                ..
            }) => {
                assert_eq!(header_size, 16);
                assert_eq!(image_len, 8);
            }
            other => panic!("expected InvalidHeaderSize, got {:?}", other),
        }
    }

    #[test]
    fn it_should_reject_header_too_small_for_checksum() {
        let result = Transform::builder()
            .header_size(6)
            .checksum(FieldDescriptor::CHECKSUM)
            .build()
            .unwrap()
            .apply(&[0u8; 32]);

        assert!(matches!(
            result,
            Err(Error::InvalidHeaderSize { required: 8, .. })
        ));
    }

    #[test]
    fn it_should_accept_header_spanning_whole_image() {
        let image = [0x5Au8; 16];
        let transformed = strip_with_checksum().apply(&image).unwrap();

        assert!(transformed.payload().is_empty());
        assert_eq!(transformed.checksum(), Some(0x5A5A5A5A));
    }

    #[test]
    fn it_should_reject_zero_word_size() {
        assert!(matches!(
            Transform::builder().word_size(0).build(),
            Err(Error::InvalidWordSize(0))
        ));
    }

    #[test]
    fn it_should_reject_invalid_field_width() {
        assert!(matches!(
            FieldDescriptor::new(4, 0),
            Err(Error::InvalidFieldWidth(0))
        ));
        assert!(matches!(
            FieldDescriptor::new(4, 9),
            Err(Error::InvalidFieldWidth(9))
        ));
    }

    #[test]
    fn it_should_reverse_words_of_any_size() {
        let mut data = hex!("01 02 03 04 05 06 07 08 09");

        reverse_words(&mut data, 2);
        assert_eq_hex!(data, hex!("02 01 04 03 06 05 08 07 09"));

        let mut data = hex!("01 02 03 04 05 06 07 08 09");

        reverse_words(&mut data, 8);
        assert_eq_hex!(data, hex!("08 07 06 05 04 03 02 01 09"));
    }
}
