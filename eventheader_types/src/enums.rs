// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![allow(non_upper_case_globals)]

use core::fmt;

#[allow(unused_imports)]
use crate::descriptors::EventHeader; // For docs
#[allow(unused_imports)]
use crate::descriptors::EventHeaderExtension; // For docs

/// Values for [`EventHeader::flags`].
///
/// Indicates whether the event uses 32-bit or 64-bit pointers, whether the event
/// uses little-endian or big-endian byte order, and whether the event contains
/// any header extension blocks.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// Returns a HeaderFlags with the specified value.
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this HeaderFlags value.
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Pointer-32, big-endian, no extension blocks.
    pub const None: Self = HeaderFlags(0);

    /// Event uses 64-bit pointers, not 32-bit.
    pub const Pointer64: Self = HeaderFlags(0x01);

    /// Event uses little-endian byte order, not big-endian.
    pub const LittleEndian: Self = HeaderFlags(0x02);

    /// There is one or more EventHeaderExtension block.
    pub const Extension: Self = HeaderFlags(0x04);

    /// Mask of all flag bits this crate assigns meaning to. A flags byte with any
    /// other bit set is not decodable by this crate (`NotSupported`).
    pub const KnownMask: u8 = Self::Pointer64.0 | Self::LittleEndian.0 | Self::Extension.0;

    /// The flags value that should be used by default when generating events on
    /// this target: little-endian, pointer size matching `target_pointer_width`,
    /// no extension blocks.
    pub const Default: Self = HeaderFlags(
        (if cfg!(target_pointer_width = "64") {
            Self::Pointer64.0
        } else {
            0
        }) | (if cfg!(target_endian = "little") {
            Self::LittleEndian.0
        } else {
            0
        }),
    );

    /// Same as `Default` but with the `Extension` bit set, for use when the event
    /// has one or more header extension blocks.
    pub const DefaultWithExtension: Self = HeaderFlags(Self::Default.0 | Self::Extension.0);

    /// Returns true if all of the bits in `flag` are set in `self`.
    pub const fn has_flag(self, flag: Self) -> bool {
        return self.0 & flag.0 == flag.0;
    }
}

impl fmt::Display for HeaderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for HeaderFlags {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<HeaderFlags> for u8 {
    fn from(val: HeaderFlags) -> Self {
        return val.0;
    }
}

/// The type of data contained in an [`EventHeaderExtension`] block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExtensionKind(u16);

impl ExtensionKind {
    /// Returns an ExtensionKind with the specified value.
    pub const fn from_int(value: u16) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this ExtensionKind value.
    pub const fn as_int(self) -> u16 {
        return self.0;
    }

    /// Invalid extension kind.
    pub const Invalid: Self = Self(0);

    /// Extension contains an event definition: event name, nul terminator,
    /// then a tightly-packed sequence of field descriptors. See [`crate::FieldEncoding`].
    pub const Metadata: Self = Self(1);

    /// Extension contains a 16-byte activity id, or a 16-byte activity id
    /// followed by a 16-byte related (parent) activity id (extension size
    /// 16 or 32, respectively; no other size is valid).
    pub const ActivityId: Self = Self(2);

    /// If set, another extension block follows this one. If unset, this is the
    /// last extension block and the event payload data follows.
    pub const ChainFlag: u16 = 0x8000;

    /// Mask for the kind field (i.e. the value without the chain bit).
    pub const ValueMask: u16 = 0x7FFF;

    /// Returns the kind value with the chain bit masked off.
    pub const fn base_kind(self) -> Self {
        return Self(self.0 & Self::ValueMask);
    }

    /// Returns true if the chain bit is set, i.e. another extension follows.
    pub const fn has_chain_flag(self) -> bool {
        return self.0 & Self::ChainFlag != 0;
    }

    /// Returns true if all of the bits in `flag` are set in `self`.
    pub const fn has_flag(self, flag: Self) -> bool {
        return self.0 & flag.0 == flag.0;
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u16> for ExtensionKind {
    fn from(val: u16) -> Self {
        return Self(val);
    }
}

impl From<ExtensionKind> for u16 {
    fn from(val: ExtensionKind) -> Self {
        return val.0;
    }
}

/// Values for the encoding byte of a field definition.
///
/// The low 5 bits of the encoding byte contain the field's encoding. The encoding
/// indicates how a decoder should determine the size of the field. It also
/// indicates a default format behavior that should be used if the field has no
/// format specified or if the specified format is 0, unrecognized, or unsupported.
///
/// The top 3 bits of the field encoding byte are flags:
/// - `CArrayFlag` indicates that this field is a constant-length array, with the
///   element count specified as a 16-bit value in the event metadata (must not be
///   0).
/// - `VArrayFlag` indicates that this field is a variable-length array, with the
///   element count specified as a 16-bit value in the event payload (immediately
///   before the array elements, may be 0).
/// - `ChainFlag` indicates that a format byte is present after the encoding byte.
///   If `ChainFlag` is not set, the format byte is omitted and is assumed to be 0.
///
/// Setting both `CArrayFlag` and `VArrayFlag` is invalid (reserved).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldEncoding(u8);

impl FieldEncoding {
    /// Returns a `FieldEncoding` with the specified value.
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this `FieldEncoding` value.
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Invalid encoding value.
    pub const Invalid: Self = Self(0);

    /// 0-byte value, logically groups subsequent N fields, N = `format & 0x7F`, N must not be 0.
    pub const Struct: Self = Self(1);

    /// 1-byte value, default format UnsignedInt.
    pub const Value8: Self = Self(2);

    /// 2-byte value, default format UnsignedInt.
    pub const Value16: Self = Self(3);

    /// 4-byte value, default format UnsignedInt.
    pub const Value32: Self = Self(4);

    /// 8-byte value, default format UnsignedInt.
    pub const Value64: Self = Self(5);

    /// 16-byte value, default format HexBytes.
    pub const Value128: Self = Self(6);

    /// zero-terminated uint8[], default format StringUtf.
    pub const ZStringChar8: Self = Self(7);

    /// zero-terminated uint16[], default format StringUtf.
    pub const ZStringChar16: Self = Self(8);

    /// zero-terminated uint32[], default format StringUtf.
    pub const ZStringChar32: Self = Self(9);

    /// uint16 Length followed by uint8 Data\[Length\], default format StringUtf.
    pub const StringLength16Char8: Self = Self(10);

    /// uint16 Length followed by uint16 Data\[Length\], default format StringUtf.
    pub const StringLength16Char16: Self = Self(11);

    /// uint16 Length followed by uint32 Data\[Length\], default format StringUtf.
    pub const StringLength16Char32: Self = Self(12);

    /// Mask for the kind field.
    pub const ValueMask: u8 = 0x1F;

    /// Mask for the array flag bits (`CArrayFlag | VArrayFlag`).
    pub const ArrayFlagMask: u8 = 0x60;

    /// Constant-length array: 16-bit element count in metadata (count must not be 0).
    pub const CArrayFlag: u8 = 0x20;

    /// Variable-length array: 16-bit element count in payload (count may be 0).
    pub const VArrayFlag: u8 = 0x40;

    /// A FieldFormat byte follows the FieldEncoding byte.
    pub const ChainFlag: u8 = 0x80;

    /// Returns the encoding with the array-flag bits and chain-bit masked off.
    pub const fn base_encoding(self) -> Self {
        return Self(self.0 & Self::ValueMask);
    }

    /// Returns the encoding with only the chain-bit masked off, keeping the
    /// array-flag bits. Use this (not `base_encoding()`) when storing a decoded
    /// field's encoding for later use: the array flags are needed to dispatch
    /// `is_array()`/`is_carray()`/`is_varray()` afterward.
    pub const fn without_chain_flag(self) -> Self {
        return Self(self.0 & !Self::ChainFlag);
    }

    /// Returns the raw array-flag bits (`0`, `CArrayFlag`, `VArrayFlag`, or the
    /// reserved combination `ArrayFlagMask`).
    pub const fn array_flags(self) -> u8 {
        return self.0 & Self::ArrayFlagMask;
    }

    /// True if either array flag bit is set (including the reserved combination).
    pub const fn is_array(self) -> bool {
        return self.array_flags() != 0;
    }

    /// True if this is a compile-time-constant-length array (`CArrayFlag` set,
    /// `VArrayFlag` unset).
    pub const fn is_carray(self) -> bool {
        return self.array_flags() == Self::CArrayFlag;
    }

    /// True if this is a runtime-variable-length array (`VArrayFlag` set,
    /// `CArrayFlag` unset).
    pub const fn is_varray(self) -> bool {
        return self.array_flags() == Self::VArrayFlag;
    }

    /// True if the chain bit is set, i.e. a format byte follows.
    pub const fn has_chain_flag(self) -> bool {
        return self.0 & Self::ChainFlag != 0;
    }
}

impl fmt::Display for FieldEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for FieldEncoding {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<FieldEncoding> for u8 {
    fn from(val: FieldEncoding) -> Self {
        return val.0;
    }
}

/// Values for the format byte of a field definition.
///
/// The low 7 bits of the format byte contain the field's format.
/// In the case of the `Struct` encoding, the low 7 bits of the format byte contain
/// the number of logical fields in the struct (which must not be 0).
///
/// The top bit of the field format byte is the `ChainFlag`. If set, it indicates
/// that a field tag (uint16) is present after the format byte. If not set, the
/// field tag is not present and is assumed to be 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldFormat(u8);

impl FieldFormat {
    /// Returns a FieldFormat with the specified value.
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this FieldFormat value.
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Use the default format of the encoding.
    pub const Default: Self = Self(0);

    /// unsigned integer, event byte order. Use with Value8..Value64 encodings.
    pub const UnsignedInt: Self = Self(1);

    /// signed integer, event byte order. Use with Value8..Value64 encodings.
    pub const SignedInt: Self = Self(2);

    /// hex integer, event byte order. Use with Value8..Value64 encodings.
    pub const HexInt: Self = Self(3);

    /// errno, event byte order. Use with Value32 encoding.
    pub const Errno: Self = Self(4);

    /// process id, event byte order. Use with Value32 encoding.
    pub const Pid: Self = Self(5);

    /// signed integer, event byte order, seconds since 1970. Use with Value32 or Value64 encodings.
    pub const Time: Self = Self(6);

    /// 0 = false, 1 = true, event byte order. Use with Value8..Value32 encodings.
    pub const Boolean: Self = Self(7);

    /// floating point, event byte order. Use with Value32..Value64 encodings.
    pub const Float: Self = Self(8);

    /// binary, decoded as hex dump of bytes. Use with any encoding.
    pub const HexBytes: Self = Self(9);

    /// 8-bit char string, unspecified character set. Use with Value8 and Char8 encodings.
    pub const String8: Self = Self(10);

    /// UTF string, event byte order, code unit size based on encoding.
    pub const StringUtf: Self = Self(11);

    /// UTF string, BOM used if present, otherwise behaves like string_utf.
    pub const StringUtfBom: Self = Self(12);

    /// XML string, otherwise behaves like string_utf_bom.
    pub const StringXml: Self = Self(13);

    /// JSON string, otherwise behaves like string_utf_bom.
    pub const StringJson: Self = Self(14);

    /// UUID, network byte order (RFC 4122 format). Use with Value128 encoding.
    pub const Uuid: Self = Self(15);

    /// IP port, network byte order (in_port_t layout). Use with Value16 encoding.
    pub const Port: Self = Self(16);

    /// IPv4 address, network byte order (in_addr layout). Use with Value32 encoding.
    pub const IPv4: Self = Self(17);

    /// IPv6 address, in6_addr layout. Use with Value128 encoding.
    pub const IPv6: Self = Self(18);

    /// Mask for the type field.
    pub const ValueMask: u8 = 0x7F;

    /// A field tag (uint16) follows the format byte.
    pub const ChainFlag: u8 = 0x80;

    /// Returns the format with the chain bit masked off. For the `Struct`
    /// encoding this is the struct's field count.
    pub const fn base_encoding(self) -> Self {
        return Self(self.0 & Self::ValueMask);
    }

    /// Returns true if the chain bit is set, i.e. a field tag follows.
    pub const fn has_chain_flag(self) -> bool {
        return self.0 & Self::ChainFlag != 0;
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for FieldFormat {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<FieldFormat> for u8 {
    fn from(val: FieldFormat) -> Self {
        return val.0;
    }
}

/// Indicates the severity of an event. Use Verbose if unsure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Level(pub(crate) u8);

impl Level {
    /// Returns a level with the specified value.
    #[inline(always)]
    pub const fn from_int(value: u8) -> Level {
        return Level(value);
    }

    /// Returns the integer value of this level.
    #[inline(always)]
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Invalid event level.
    pub const Invalid: Level = Level(0);

    /// Critical error event.
    pub const CriticalError: Level = Level(1);

    /// Error event.
    pub const Error: Level = Level(2);

    /// Warning event.
    pub const Warning: Level = Level(3);

    /// Informational event.
    pub const Informational: Level = Level(4);

    /// Verbose event.
    pub const Verbose: Level = Level(5);
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for Level {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<Level> for u8 {
    fn from(val: Level) -> Self {
        return val.0;
    }
}

/// Values for [`EventHeader::opcode`], indicating special semantics to be used
/// by the event decoder for grouping and organizing events, e.g. for activities.
///
/// Most events set opcode = `Info` (0). Other opcode values add special
/// semantics to an event that help the event analysis tool with grouping
/// related events, most often `ActivityStart`/`ActivityStop`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Opcode(u8);

impl Opcode {
    /// Returns an opcode with the specified value.
    #[inline(always)]
    pub const fn from_int(value: u8) -> Opcode {
        return Opcode(value);
    }

    /// Returns the integer value of this opcode.
    #[inline(always)]
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Normal event. The event may set activity_id if it is part of an activity.
    pub const Info: Opcode = Opcode(0);

    /// Event indicates the beginning of an activity.
    pub const ActivityStart: Opcode = Opcode(1);

    /// Event indicates the end of an activity.
    pub const ActivityStop: Opcode = Opcode(2);

    /// Data Collection Start event.
    pub const CollectionStart: Opcode = Opcode(3);

    /// Data Collection Stop event.
    pub const CollectionStop: Opcode = Opcode(4);

    /// Extension event.
    pub const Extension: Opcode = Opcode(5);

    /// Reply event.
    pub const Reply: Opcode = Opcode(6);

    /// Resume event.
    pub const Resume: Opcode = Opcode(7);

    /// Suspend event.
    pub const Suspend: Opcode = Opcode(8);

    /// Message Send event.
    pub const Send: Opcode = Opcode(9);

    /// Message Receive event.
    pub const Receive: Opcode = Opcode(240);
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for Opcode {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<Opcode> for u8 {
    fn from(val: Opcode) -> Self {
        return val.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_encoding_array_flags() {
        let carray = FieldEncoding::from_int(FieldEncoding::Value32.as_int() | FieldEncoding::CArrayFlag);
        assert!(carray.is_array());
        assert!(carray.is_carray());
        assert!(!carray.is_varray());
        assert_eq!(carray.base_encoding(), FieldEncoding::Value32);

        let varray = FieldEncoding::from_int(FieldEncoding::Value32.as_int() | FieldEncoding::VArrayFlag);
        assert!(varray.is_varray());
        assert!(!varray.is_carray());

        let reserved =
            FieldEncoding::from_int(FieldEncoding::Value32.as_int() | FieldEncoding::ArrayFlagMask);
        assert!(reserved.is_array());
        assert!(!reserved.is_carray());
        assert!(!reserved.is_varray());
    }

    #[test]
    fn field_encoding_chain_flag() {
        let chained = FieldEncoding::from_int(FieldEncoding::Value8.as_int() | FieldEncoding::ChainFlag);
        assert!(chained.has_chain_flag());
        assert_eq!(chained.base_encoding(), FieldEncoding::Value8);
    }

    #[test]
    fn header_flags_known_mask() {
        let known = HeaderFlags::from_int(HeaderFlags::KnownMask);
        assert!(known.has_flag(HeaderFlags::Pointer64));
        assert!(known.has_flag(HeaderFlags::LittleEndian));
        assert!(known.has_flag(HeaderFlags::Extension));

        let unknown = HeaderFlags::from_int(0x08);
        assert_eq!(unknown.as_int() & !HeaderFlags::KnownMask, 0x08);
    }

    #[test]
    fn extension_kind_chain_and_mask() {
        let chained = ExtensionKind::from_int(ExtensionKind::Metadata.as_int() | ExtensionKind::ChainFlag);
        assert!(chained.has_chain_flag());
        assert_eq!(chained.base_kind(), ExtensionKind::Metadata);
    }
}
