// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::array;

use eventheader_types::*;

use crate::ByteReader;

/// Text encoding of a string-valued item, as classified by [`ItemValue::to_string_bytes`].
/// This is a classification only: no transcoding is performed, the caller gets a
/// borrowed slice plus the encoding needed to interpret it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Corresponds to [`FieldFormat::String8`], i.e. "unspecified single-byte character set",
    /// generally decoded as Latin1 (ISO-8859-1) or Windows-1252.
    Latin1,

    /// UTF-8 string.
    Utf8,

    /// UTF-16 string, big-endian byte order.
    Utf16BE,

    /// UTF-16 string, little-endian byte order.
    Utf16LE,

    /// UTF-32 string, big-endian byte order.
    Utf32BE,

    /// UTF-32 string, little-endian byte order.
    Utf32LE,
}

impl TextEncoding {
    /// Returns `(Some(encoding), bom_len)` for the BOM at the start of `bytes`, or
    /// `(None, 0)` if `bytes` does not start with a recognized BOM.
    pub fn from_bom(bytes: &[u8]) -> (Option<Self>, u8) {
        return if bytes.len() >= 4 && bytes[0..4] == [0x00, 0x00, 0xFE, 0xFF] {
            (Some(Self::Utf32BE), 4)
        } else if bytes.len() >= 4 && bytes[0..4] == [0xFF, 0xFE, 0x00, 0x00] {
            (Some(Self::Utf32LE), 4)
        } else if bytes.len() >= 2 && bytes[0..2] == [0xFE, 0xFF] {
            (Some(Self::Utf16BE), 2)
        } else if bytes.len() >= 2 && bytes[0..2] == [0xFF, 0xFE] {
            (Some(Self::Utf16LE), 2)
        } else if bytes.len() >= 3 && bytes[0..3] == [0xEF, 0xBB, 0xBF] {
            (Some(Self::Utf8), 3)
        } else {
            (None, 0)
        };
    }
}

/// Metadata (type, endianness, tag) of an event item. An item is a field of the
/// event or an element of an array field of the event.
///
/// The item may represent one of the following, determined by `is_scalar()` and
/// `type_size()`:
///
/// - **Simple scalar:** `is_scalar() && type_size() != 0` — non-array field, or
///   one element of an array field; value type is fixed-size. `element_count()`
///   is always 1; `format()` is significant.
/// - **Complex scalar:** `is_scalar() && type_size() == 0` — non-array field, or
///   one element of an array field; value type is variable-size or struct. If
///   `encoding() == Struct`, this is the start/end of a structure and
///   `struct_field_count()` is significant; otherwise `format()` is significant.
/// - **Simple array:** `!is_scalar() && type_size() != 0` — array-begin or
///   array-end item with fixed-size elements. `element_count()` is the array
///   length; `format()` is significant.
/// - **Complex array:** `!is_scalar() && type_size() == 0` — array-begin or
///   array-end item with variable-size or struct elements.
#[derive(Clone, Copy, Debug)]
pub struct ItemMetadata {
    element_count: u16,
    field_tag: u16,
    type_size: u8,
    encoding_and_array_flag_and_is_scalar: FieldEncoding,
    format: FieldFormat,
    byte_reader: ByteReader,
}

impl ItemMetadata {
    /// Creates a new `ItemMetadata`. Not normally called directly: obtained from
    /// [`crate::Enumerator::item_metadata`] or [`crate::Enumerator::item_info`].
    pub const fn new(
        byte_reader: ByteReader,
        encoding_and_array_flag: FieldEncoding,
        format: FieldFormat,
        is_scalar: bool,
        type_size: u8,
        element_count: u16,
        field_tag: u16,
    ) -> Self {
        debug_assert!(!encoding_and_array_flag.has_chain_flag());
        debug_assert!(!format.has_chain_flag());
        debug_assert!(encoding_and_array_flag.array_flags() != FieldEncoding::ArrayFlagMask);

        let is_scalar_flag = if is_scalar {
            FieldEncoding::ChainFlag
        } else {
            0
        };
        return Self {
            element_count,
            field_tag,
            type_size,
            encoding_and_array_flag_and_is_scalar: FieldEncoding::from_int(
                encoding_and_array_flag.as_int() | is_scalar_flag,
            ),
            format,
            byte_reader,
        };
    }

    /// For array-begin or array-end, number of elements in the array. For
    /// non-array or for an element of an array, this is 1. May be 0 for a
    /// variable-length array of length 0.
    pub const fn element_count(&self) -> u16 {
        self.element_count
    }

    /// Field tag, or 0 if none.
    pub const fn field_tag(&self) -> u16 {
        self.field_tag
    }

    /// For simple (fixed-size) encodings, the size of one element in bytes
    /// (1, 2, 4, 8, or 16). For complex encodings (struct or string), 0.
    pub const fn type_size(&self) -> u8 {
        self.type_size
    }

    /// The item's encoding, without array/chain flags.
    pub const fn encoding(&self) -> FieldEncoding {
        self.encoding_and_array_flag_and_is_scalar.base_encoding()
    }

    /// The field's `CArrayFlag`/`VArrayFlag` bit if the item is an array-begin,
    /// array-end, or array element. 0 for a non-array item.
    pub const fn array_flag(&self) -> u8 {
        self.encoding_and_array_flag_and_is_scalar.array_flags()
    }

    /// True for a non-array field or a single element of an array field.
    /// False for an array-begin or array-end item.
    pub const fn is_scalar(&self) -> bool {
        self.encoding_and_array_flag_and_is_scalar.has_chain_flag()
    }

    /// True if this item represents an element within an array (as opposed to a
    /// non-array field, an array-begin, or an array-end).
    pub const fn is_element(&self) -> bool {
        let enc = self.encoding_and_array_flag_and_is_scalar.as_int();
        return 0 != (enc & FieldEncoding::ChainFlag) && 0 != (enc & FieldEncoding::ArrayFlagMask);
    }

    /// Field's semantic type. Meaningful only when `encoding() != Struct`.
    pub const fn format(&self) -> FieldFormat {
        self.format
    }

    /// Number of fields in the struct. Meaningful only when `encoding() == Struct`
    /// (aliased with `format`).
    pub const fn struct_field_count(&self) -> u8 {
        self.format.as_int()
    }

    /// A reader configured for this item's byte order.
    pub const fn byte_reader(&self) -> ByteReader {
        self.byte_reader
    }

    /// True if this item's data uses big-endian byte order.
    pub const fn source_big_endian(&self) -> bool {
        self.byte_reader.source_big_endian()
    }
}

/// Metadata and borrowed content of an event item, i.e. a field of the event or
/// an element of an array field of the event.
///
/// For a struct, an array of structs, or an array of variable-size elements,
/// `bytes()` is empty: use the enumerator's `move_next` to visit member items.
/// Otherwise `bytes()` holds the item's raw (event-byte-order) content, and the
/// `to_*` accessors decode individual fixed-size elements out of it by index.
#[derive(Clone, Copy, Debug)]
pub struct ItemValue<'dat> {
    bytes: &'dat [u8],
    metadata: ItemMetadata,
}

impl<'dat> ItemValue<'dat> {
    /// Creates a new `ItemValue`. Not normally called directly: obtained from
    /// [`crate::Enumerator::item_info`].
    pub const fn new(bytes: &'dat [u8], metadata: ItemMetadata) -> Self {
        return Self { bytes, metadata };
    }

    /// The item's raw content, in event byte order. Empty for a struct, an array
    /// of structs, or an array of variable-size elements.
    pub fn bytes(&self) -> &'dat [u8] {
        self.bytes
    }

    /// The item's metadata (type, endianness, tag).
    pub fn metadata(&self) -> ItemMetadata {
        self.metadata
    }

    /// Same as `self.metadata().byte_reader()`.
    pub fn byte_reader(&self) -> ByteReader {
        self.metadata.byte_reader()
    }

    /// Same as `self.byte_reader().source_big_endian()`.
    pub fn source_big_endian(&self) -> bool {
        self.metadata.source_big_endian()
    }

    /// For `Value8`: a 1-byte array at element `index`.
    pub fn to_u8x1(&self, index: usize) -> &'dat [u8; 1] {
        debug_assert!(self.bytes.len() > index, "index out of range");
        return array::from_ref(&self.bytes[index]);
    }

    /// For `Value16`: a 2-byte array at element `index`.
    pub fn to_u8x2(&self, index: usize) -> &'dat [u8; 2] {
        const SIZE: usize = 2;
        debug_assert!(self.bytes.len() / SIZE > index, "index out of range");
        return self.bytes[index * SIZE..index * SIZE + SIZE].try_into().unwrap();
    }

    /// For `Value32`: a 4-byte array at element `index`.
    pub fn to_u8x4(&self, index: usize) -> &'dat [u8; 4] {
        const SIZE: usize = 4;
        debug_assert!(self.bytes.len() / SIZE > index, "index out of range");
        return self.bytes[index * SIZE..index * SIZE + SIZE].try_into().unwrap();
    }

    /// For `Value64`: an 8-byte array at element `index`.
    pub fn to_u8x8(&self, index: usize) -> &'dat [u8; 8] {
        const SIZE: usize = 8;
        debug_assert!(self.bytes.len() / SIZE > index, "index out of range");
        return self.bytes[index * SIZE..index * SIZE + SIZE].try_into().unwrap();
    }

    /// For `Value128`: a 16-byte array at element `index`.
    pub fn to_u8x16(&self, index: usize) -> &'dat [u8; 16] {
        const SIZE: usize = 16;
        debug_assert!(self.bytes.len() / SIZE > index, "index out of range");
        return self.bytes[index * SIZE..index * SIZE + SIZE].try_into().unwrap();
    }

    /// For `Value8`: a `u8` at element `index`.
    pub fn to_u8(&self, index: usize) -> u8 {
        debug_assert!(self.bytes.len() > index, "index out of range");
        return self.bytes[index];
    }

    /// For `Value8`: an `i8` at element `index`.
    pub fn to_i8(&self, index: usize) -> i8 {
        return self.to_u8(index) as i8;
    }

    /// For `Value16`: a `u16` at element `index`, event byte order fixed up.
    pub fn to_u16(&self, index: usize) -> u16 {
        debug_assert!(self.bytes.len() / 2 > index, "index out of range");
        return self.metadata.byte_reader.read_u16(&self.bytes[index * 2..]);
    }

    /// For `Value16`: an `i16` at element `index`, event byte order fixed up.
    pub fn to_i16(&self, index: usize) -> i16 {
        debug_assert!(self.bytes.len() / 2 > index, "index out of range");
        return self.metadata.byte_reader.read_i16(&self.bytes[index * 2..]);
    }

    /// For `Value32`: a `u32` at element `index`, event byte order fixed up.
    pub fn to_u32(&self, index: usize) -> u32 {
        debug_assert!(self.bytes.len() / 4 > index, "index out of range");
        return self.metadata.byte_reader.read_u32(&self.bytes[index * 4..]);
    }

    /// For `Value32`: an `i32` at element `index`, event byte order fixed up.
    pub fn to_i32(&self, index: usize) -> i32 {
        debug_assert!(self.bytes.len() / 4 > index, "index out of range");
        return self.metadata.byte_reader.read_i32(&self.bytes[index * 4..]);
    }

    /// For `Value64`: a `u64` at element `index`, event byte order fixed up.
    pub fn to_u64(&self, index: usize) -> u64 {
        debug_assert!(self.bytes.len() / 8 > index, "index out of range");
        return self.metadata.byte_reader.read_u64(&self.bytes[index * 8..]);
    }

    /// For `Value64`: an `i64` at element `index`, event byte order fixed up.
    pub fn to_i64(&self, index: usize) -> i64 {
        debug_assert!(self.bytes.len() / 8 > index, "index out of range");
        return self.metadata.byte_reader.read_i64(&self.bytes[index * 8..]);
    }

    /// For `Value128`: a `u128` at element `index`, event byte order fixed up.
    pub fn to_u128(&self, index: usize) -> u128 {
        debug_assert!(self.bytes.len() / 16 > index, "index out of range");
        return self.metadata.byte_reader.read_u128(&self.bytes[index * 16..]);
    }

    /// For `Value32`: an `f32` at element `index`, event byte order fixed up.
    pub fn to_f32(&self, index: usize) -> f32 {
        debug_assert!(self.bytes.len() / 4 > index, "index out of range");
        return self.metadata.byte_reader.read_f32(&self.bytes[index * 4..]);
    }

    /// For `Value64`: an `f64` at element `index`, event byte order fixed up.
    pub fn to_f64(&self, index: usize) -> f64 {
        debug_assert!(self.bytes.len() / 8 > index, "index out of range");
        return self.metadata.byte_reader.read_f64(&self.bytes[index * 8..]);
    }

    /// For `Value16` with `Port` format: a network-byte-order port number at
    /// element `index` (network byte order is always big-endian regardless of
    /// the event's declared endianness).
    pub fn to_port(&self, index: usize) -> u16 {
        const SIZE: usize = 2;
        debug_assert!(self.bytes.len() / SIZE > index, "index out of range");
        return u16::from_be_bytes(self.bytes[index * SIZE..index * SIZE + SIZE].try_into().unwrap());
    }

    /// For `Value32` with `IPv4` format: the 4 raw address bytes (network byte
    /// order) at element `index`. No `Ipv4Addr` type is constructed; the caller
    /// can wrap these bytes in whatever network-address type it prefers.
    pub fn to_ipv4(&self, index: usize) -> [u8; 4] {
        *self.to_u8x4(index)
    }

    /// For `Value128` with `IPv6` format: the 16 raw address bytes (network byte
    /// order) at element `index`.
    pub fn to_ipv6(&self, index: usize) -> [u8; 16] {
        *self.to_u8x16(index)
    }

    /// For `Value128` with `Uuid` format: the 16 raw bytes (RFC 4122 / network
    /// byte order) at element `index`.
    pub fn to_guid(&self, index: usize) -> [u8; 16] {
        *self.to_u8x16(index)
    }

    /// Interprets the value as a string and returns the encoded bytes along with
    /// the encoding to use to convert them to text. The encoding is determined
    /// from `format`, `encoding`, and (if present) a leading byte-order mark in
    /// the value bytes. If a BOM is detected, the returned bytes exclude it.
    pub fn to_string_bytes(&self) -> (&'dat [u8], TextEncoding) {
        match self.metadata.format {
            FieldFormat::String8 => return (self.bytes, TextEncoding::Latin1),
            FieldFormat::StringUtfBom | FieldFormat::StringXml | FieldFormat::StringJson => {
                let (bom_encoding, bom_len) = TextEncoding::from_bom(self.bytes);
                if let Some(enc) = bom_encoding {
                    return (&self.bytes[bom_len as usize..], enc);
                }
            }
            _ => {}
        }

        let enc = match self.metadata.encoding() {
            FieldEncoding::Value8
            | FieldEncoding::ZStringChar8
            | FieldEncoding::StringLength16Char8 => TextEncoding::Utf8,

            FieldEncoding::Value16 | FieldEncoding::ZStringChar16 | FieldEncoding::StringLength16Char16 => {
                if self.metadata.source_big_endian() {
                    TextEncoding::Utf16BE
                } else {
                    TextEncoding::Utf16LE
                }
            }

            _ => {
                if self.metadata.source_big_endian() {
                    TextEncoding::Utf32BE
                } else {
                    TextEncoding::Utf32LE
                }
            }
        };

        return (self.bytes, enc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(encoding: FieldEncoding, type_size: u8, element_count: u16) -> ItemMetadata {
        ItemMetadata::new(
            ByteReader::new(false),
            encoding,
            FieldFormat::Default,
            true,
            type_size,
            element_count,
            0,
        )
    }

    #[test]
    fn scalar_integer_readers() {
        let bytes = 0x1234u16.to_le_bytes();
        let value = ItemValue::new(&bytes, meta(FieldEncoding::Value16, 2, 1));
        assert_eq!(value.to_u16(0), 0x1234);
    }

    #[test]
    fn array_indexing() {
        let bytes: [u8; 8] = [1, 0, 2, 0, 3, 0, 4, 0];
        let value = ItemValue::new(&bytes, meta(FieldEncoding::Value16, 2, 4));
        assert_eq!(value.to_u16(0), 1);
        assert_eq!(value.to_u16(3), 4);
    }

    #[test]
    fn bom_detection_strips_prefix() {
        let bytes: [u8; 5] = [0xEF, 0xBB, 0xBF, b'h', b'i'];
        let value = ItemValue::new(
            &bytes,
            ItemMetadata::new(
                ByteReader::new(false),
                FieldEncoding::StringLength16Char8,
                FieldFormat::StringUtfBom,
                true,
                0,
                1,
                0,
            ),
        );
        let (text, enc) = value.to_string_bytes();
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(text, b"hi");
    }
}
