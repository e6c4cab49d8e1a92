// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::mem;

use eventheader_types::*;

use crate::ByteReader;
use crate::ItemMetadata;
use crate::ItemValue;

#[derive(Clone, Copy, Debug)]
enum SubState {
    Error,
    AfterLastItem,
    BeforeFirstItem,
    ValueMetadata,
    ValueScalar,
    ValueSimpleArrayElement,
    ValueComplexArrayElement,
    ArrayBegin,
    ArrayEnd,
    StructBegin,
    StructEnd,
}

/// Parses a run of lowercase hex digits starting at `start_pos`. Returns
/// `(value, end_pos)`, where `end_pos` is the position of the first
/// non-hex-digit byte (or `str.len()`).
fn lowercase_hex_to_int(str: &[u8], start_pos: usize) -> (u64, usize) {
    let mut val: u64 = 0;
    let mut pos = start_pos;
    while pos < str.len() {
        let nibble;
        let ch = str[pos];
        if ch.is_ascii_digit() {
            nibble = ch - b'0';
        } else if (b'a'..=b'f').contains(&ch) {
            nibble = ch - b'a' + 10;
        } else {
            break;
        }

        val = (val << 4) + (nibble as u64);
        pos += 1;
    }

    return (val, pos);
}

#[derive(Clone, Copy, Debug)]
struct StackEntry {
    /// event_data[next_offset] starts next field's name.
    next_offset: u32,

    /// event_data[name_offset] starts current field's name.
    name_offset: u32,

    // event_data[name_offset + name_len + 1] starts current field's type.
    name_len: u16,

    array_index: u16,

    array_count: u16,

    /// Number of next_property() calls before popping stack.
    remaining_field_count: u8,

    _unused: u8,
}

impl StackEntry {
    const ZERO: StackEntry = StackEntry {
        next_offset: 0,
        name_offset: 0,
        name_len: 0,
        array_index: 0,
        array_count: 0,
        remaining_field_count: 0,
        _unused: 0,
    };
}

#[derive(Clone, Copy, Debug)]
struct FieldType {
    encoding: FieldEncoding,
    format: FieldFormat,
    tag: u16,
}

/// Values for [`Enumerator::last_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumeratorError {
    /// Event is smaller than 8 bytes or larger than 2GB,
    /// or the tracepoint name is longer than 255 characters.
    InvalidParameter,

    /// Event does not follow the EventHeader naming/layout rules,
    /// has unrecognized flags, or has unrecognized types.
    NotSupported,

    /// Resource usage limit (`move_next_limit`) reached.
    ImplementationLimit,

    /// Event has an out-of-range value.
    InvalidData,

    /// Event has more than 8 levels of nested structs.
    StackOverflow,
}

/// Values for [`Enumerator::state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumeratorState {
    /// After an error has been returned by `move_next`.
    /// `move_next()` and `item_info()` are invalid operations for this state.
    Error,

    /// Positioned after the last item in the event.
    /// `move_next()` and `item_info()` are invalid operations for this state.
    AfterLastItem,

    // move_next() is an invalid operation for all states above this line.
    // move_next() is a valid operation for all states below this line.
    /// Positioned before the first item in the event.
    /// `item_info()` is an invalid operation for this state.
    BeforeFirstItem,

    // item_info() is an invalid operation for all states above this line.
    // item_info() is a valid operation for all states below this line.
    /// Positioned at an item with data (a field or an array element).
    Value,

    /// Positioned before the first item in an array.
    ArrayBegin,

    /// Positioned after the last item in an array.
    ArrayEnd,

    /// Positioned before the first item in a struct.
    StructBegin,

    /// Positioned after the last item in a struct.
    StructEnd,
}

impl EnumeratorState {
    /// True if `move_next()` is valid for this state, i.e. `self >= BeforeFirstItem`.
    pub const fn can_move_next(self) -> bool {
        return self as u8 >= EnumeratorState::BeforeFirstItem as u8;
    }

    /// True if `item_info()` is valid for this state, i.e. `self >= Value`.
    pub const fn can_item_info(self) -> bool {
        return self as u8 >= EnumeratorState::Value as u8;
    }
}

/// Event attributes returned by [`Enumerator::event_info`].
#[derive(Clone, Copy, Debug)]
pub struct EventInfo<'nam, 'dat> {
    tracepoint_name: &'nam str,
    event_data: &'dat [u8],
    name_start: u32,
    name_len: u32,
    activity_id_start: u32,
    activity_id_len: u8,
    header: EventHeader,
    keyword: u64,
}

impl<'nam, 'dat> EventInfo<'nam, 'dat> {
    /// Returns the `tracepoint_name` that was passed to `start_event`,
    /// e.g. "ProviderName_L1K2".
    pub fn tracepoint_name(&self) -> &'nam str {
        return self.tracepoint_name;
    }

    /// Returns the `event_data` that was passed to `start_event`.
    pub fn event_data(&self) -> &'dat [u8] {
        return self.event_data;
    }

    /// Returns the offset into `event_data` where the event name starts.
    pub fn name_start(&self) -> u32 {
        return self.name_start;
    }

    /// Returns the length of the event name in bytes.
    pub fn name_len(&self) -> u32 {
        return self.name_len;
    }

    /// Returns the offset into `event_data` where the activity ID section starts.
    pub fn activity_id_start(&self) -> u32 {
        return self.activity_id_start;
    }

    /// Returns the length of the activity ID section in bytes: 0 (none),
    /// 16 (activity ID only), or 32 (activity ID + related ID).
    pub fn activity_id_len(&self) -> u8 {
        return self.activity_id_len;
    }

    /// Returns the event header (level, opcode, tag, id, version).
    pub fn header(&self) -> EventHeader {
        return self.header;
    }

    /// Returns the event keyword (category bits, extracted from `tracepoint_name`).
    pub fn keyword(&self) -> u64 {
        return self.keyword;
    }

    /// Returns the event's name as a byte slice. In a well-formed event this is
    /// valid UTF-8.
    pub fn name_bytes(&self) -> &'dat [u8] {
        let start = self.name_start as usize;
        let end = start + self.name_len as usize;
        return &self.event_data[start..end];
    }

    /// Returns the provider name, i.e. `tracepoint_name` up to (not including)
    /// the last `_`.
    pub fn provider_name(&self) -> &'nam str {
        match self.tracepoint_name.rfind('_') {
            Some(underscore_pos) => &self.tracepoint_name[..underscore_pos],
            None => self.tracepoint_name,
        }
    }

    /// Returns the provider options substring of `tracepoint_name`, e.g. "" or
    /// "Gmygroup": the text starting at the first uppercase ASCII letter other
    /// than `L`/`K` that follows the last `_`.
    pub fn options(&self) -> &'nam str {
        if let Some(underscore_pos) = self.tracepoint_name.rfind('_') {
            let bytes = self.tracepoint_name.as_bytes();
            let mut pos = underscore_pos + 1;
            while pos < bytes.len() {
                let ch = bytes[pos];
                if ch.is_ascii_uppercase() && ch != b'L' && ch != b'K' {
                    return &self.tracepoint_name[pos..];
                }
                pos += 1;
            }
        }
        return "";
    }

    /// Returns the activity ID section as a slice: empty (no activity ID), 16
    /// bytes (activity ID only), or 32 bytes (activity ID followed by related ID).
    pub fn activity_id_bytes(&self) -> &'dat [u8] {
        let start = self.activity_id_start as usize;
        let end = start + self.activity_id_len as usize;
        return &self.event_data[start..end];
    }

    /// Returns the activity ID (big-endian bytes), or `None` if absent.
    pub fn activity_id(&self) -> Option<&'dat [u8; 16]> {
        if self.activity_id_len < 16 {
            return None;
        }
        let start = self.activity_id_start as usize;
        return Some(self.event_data[start..start + 16].try_into().unwrap());
    }

    /// Returns the related (parent) activity ID (big-endian bytes), or `None` if absent.
    pub fn related_activity_id(&self) -> Option<&'dat [u8; 16]> {
        if self.activity_id_len < 32 {
            return None;
        }
        let start = self.activity_id_start as usize + 16;
        return Some(self.event_data[start..start + 16].try_into().unwrap());
    }
}

/// Name and value of an EventHeader event item. An item is a field of the event
/// or an element of an array field of the event. Returned by
/// [`Enumerator::item_info`].
#[derive(Clone, Copy, Debug)]
pub struct ItemInfo<'dat> {
    event_data: &'dat [u8],
    name_start: u32,
    name_len: u32,
    value: ItemValue<'dat>,
}

impl<'dat> ItemInfo<'dat> {
    /// Returns the `event_data` that was passed to `start_event`.
    pub fn event_data(&self) -> &'dat [u8] {
        return self.event_data;
    }

    /// Returns the offset into `event_data` where the field name starts.
    pub fn name_start(&self) -> u32 {
        return self.name_start;
    }

    /// Returns the length of the field name in bytes.
    pub fn name_len(&self) -> u32 {
        return self.name_len;
    }

    /// Returns the field value.
    pub fn value(&self) -> &ItemValue<'dat> {
        return &self.value;
    }

    /// Returns the field's metadata (type information).
    pub fn metadata(&self) -> ItemMetadata {
        return self.value.metadata();
    }

    /// Returns the field's name as a byte slice. In a well-formed event this is
    /// valid UTF-8.
    pub fn name_bytes(&self) -> &'dat [u8] {
        let start = self.name_start as usize;
        let end = start + self.name_len as usize;
        return &self.event_data[start..end];
    }
}

/// Pull-style enumerator over the fields of an EventHeader event. Get one by
/// calling [`EnumeratorContext::start_event`]. Enumerate as follows:
/// - Enumerator starts positioned `BeforeFirstItem`.
/// - Use `event_info()` to get the event's name and attributes.
/// - Call `move_next()` to move through the event items; check `state()` to
///   determine whether the item is a field value, the start/end of an array, or
///   the start/end of a struct.
/// - Call `item_info()` to get information about the current item.
/// - Call `reset()` to restart enumeration of the same event.
#[derive(Debug)]
pub struct Enumerator<'ctx, 'nam, 'dat> {
    context: &'ctx mut EnumeratorContext,
    tracepoint_name: &'nam str,
    event_data: &'dat [u8],
}

impl<'ctx, 'nam, 'dat> Enumerator<'ctx, 'nam, 'dat> {
    /// Returns the current state.
    pub fn state(&self) -> EnumeratorState {
        return self.context.state;
    }

    /// Returns the error from the most recent `move_next*` call, or `None` if no
    /// call has failed yet.
    pub fn last_error(&self) -> Option<EnumeratorError> {
        return self.context.last_error;
    }

    /// Gets information that applies to the current event, e.g. the event name,
    /// provider name, options, level, keyword, activity id.
    pub fn event_info(&self) -> EventInfo<'nam, 'dat> {
        return EventInfo {
            event_data: self.event_data,
            tracepoint_name: self.tracepoint_name,
            name_start: self.context.meta_start,
            name_len: self.context.event_name_len as u32,
            activity_id_start: self.context.activity_id_start,
            activity_id_len: self.context.activity_id_len,
            header: self.context.header,
            keyword: self.context.keyword,
        };
    }

    /// Gets information about the current item: name, type, data pointer, data
    /// size. The current item changes each time `move_next()` is called.
    ///
    /// **PRECONDITION (debug_assert):** `self.state().can_item_info()`.
    pub fn item_info(&self) -> ItemInfo<'dat> {
        debug_assert!(self.context.state.can_item_info());
        let data_pos = self.context.data_pos_cooked as usize;
        return ItemInfo {
            event_data: self.event_data,
            name_start: self.context.stack_top.name_offset,
            name_len: self.context.stack_top.name_len as u32,
            value: ItemValue::new(
                &self.event_data[data_pos..data_pos + self.context.item_size_cooked as usize],
                self.item_metadata(),
            ),
        };
    }

    /// Gets metadata (type, endian, tag) of the current item. A subset of the
    /// information returned by `item_info()`.
    ///
    /// **PRECONDITION (debug_assert):** `self.state().can_item_info()`.
    pub fn item_metadata(&self) -> ItemMetadata {
        debug_assert!(self.context.state.can_item_info());
        let is_scalar =
            self.context.state < EnumeratorState::ArrayBegin || self.context.state > EnumeratorState::ArrayEnd;
        return ItemMetadata::new(
            self.context.byte_reader,
            self.context.field_type.encoding,
            self.context.field_type.format,
            is_scalar,
            self.context.element_size,
            if is_scalar {
                1
            } else {
                self.context.stack_top.array_count
            },
            self.context.field_type.tag,
        );
    }

    /// Gets the remaining event payload, i.e. the event data not yet decoded.
    /// Useful after enumeration completes to detect trailing data: up to 7
    /// bytes is normal padding, 8+ may indicate corruption.
    pub fn raw_data_position(&self) -> &'dat [u8] {
        return &self.event_data[self.context.data_pos_raw as usize..];
    }

    /// Positions the enumerator before the first item of the same event. Resets
    /// the `move_next` limit to `EnumeratorContext::MOVE_NEXT_LIMIT_DEFAULT`.
    pub fn reset(&mut self) {
        self.context.reset(EnumeratorContext::MOVE_NEXT_LIMIT_DEFAULT);
    }

    /// Positions the enumerator before the first item of the same event, with
    /// the `move_next` limit set to `move_next_limit`.
    pub fn reset_with_limit(&mut self, move_next_limit: u32) {
        self.context.reset(move_next_limit);
    }

    /// Moves to the next item in the event, or to the end of the event if there
    /// are no more items.
    ///
    /// **PRECONDITION (debug_assert):** `self.state().can_move_next()`.
    ///
    /// - Returns `true` if moved to a valid item.
    /// - Returns `false` and sets state to `AfterLastItem` if there are no more items.
    /// - Returns `false` and sets state to `Error` on a decoding error (see `last_error()`).
    pub fn move_next(&mut self) -> bool {
        return self.context.move_next(self.event_data);
    }

    /// Moves to the next sibling of the current item, or to the end of the
    /// event if there are no more items.
    ///
    /// If the current item is `ArrayBegin` or `StructBegin`, this efficiently
    /// moves past the corresponding `ArrayEnd`/`StructEnd`. Otherwise, same as
    /// `move_next()`.
    ///
    /// **PRECONDITION (debug_assert):** `self.state().can_move_next()`.
    pub fn move_next_sibling(&mut self) -> bool {
        return self.context.move_next_sibling(self.event_data);
    }

    /// Advanced scenario: extracts type information from an event without
    /// looking at value data. Moves to the next field declaration (not the next
    /// field value).
    ///
    /// Metadata enumeration gives a flat view of arrays and structs: only
    /// `Value` and `ArrayBegin` items occur, never `ArrayEnd`/`StructBegin`/
    /// `StructEnd`. A struct appears as a `Value` with `encoding() == Struct`.
    /// An array appears as `ArrayBegin` with `element_count()` either 0 (runtime
    /// variable length) or nonzero (compile-time length); an array of struct is
    /// `ArrayBegin` with `encoding() == Struct`. Value bytes are always empty.
    ///
    /// Enumeration may end before the declared struct field count is exhausted:
    /// a large count just means "the rest of the event's fields belong to this
    /// struct", which is legal.
    ///
    /// **PRECONDITION (debug_assert):** `self.state().can_move_next()`.
    pub fn move_next_metadata(&mut self) -> bool {
        return self.context.move_next_metadata(self.event_data);
    }
}

/// Reusable state for enumerating the fields of EventHeader events. Construct
/// once with [`EnumeratorContext::new`] and reuse across many events via
/// `start_event` to avoid repeated allocation (there is none) and to amortize
/// the cost of the fixed-size internal stack.
#[derive(Debug)]
pub struct EnumeratorContext {
    // Set by start_event:
    header: EventHeader,
    keyword: u64,
    meta_start: u32, // Relative to event_data.
    meta_end: u32,
    activity_id_start: u32, // Relative to event_data.
    activity_id_len: u8,
    byte_reader: ByteReader,
    event_name_len: u16, // Name starts at event_data[meta_start].
    data_start: u32,     // Relative to event_data.

    // Vary during enumeration:
    data_pos_raw: u32,
    move_next_remaining: u32,
    stack_top: StackEntry,
    stack_index: u8, // Number of items currently on stack.
    state: EnumeratorState,
    substate: SubState,
    last_error: Option<EnumeratorError>,

    element_size: u8,
    field_type: FieldType,
    data_pos_cooked: u32,
    item_size_raw: u32,
    item_size_cooked: u32,

    stack: [StackEntry; EnumeratorContext::STRUCT_NEST_LIMIT as usize],
}

impl EnumeratorContext {
    const READ_FIELD_ERROR: FieldEncoding = FieldEncoding::Invalid;

    /// Default limit on the number of `move_next()` calls that can be made
    /// while decoding one event, currently 4096. Bounds CPU usage for malformed
    /// or adversarial events.
    pub const MOVE_NEXT_LIMIT_DEFAULT: u32 = 4096;

    /// Maximum supported levels of struct nesting, currently 8.
    pub const STRUCT_NEST_LIMIT: u8 = 8;

    /// Creates a new context for enumerating the fields of EventHeader events.
    pub const fn new() -> Self {
        return Self {
            header: EventHeader {
                flags: HeaderFlags::None,
                version: 0,
                id: 0,
                tag: 0,
                opcode: Opcode::Info,
                level: Level::Invalid,
            },
            keyword: 0,
            meta_start: 0,
            meta_end: 0,
            activity_id_start: 0,
            activity_id_len: 0,
            byte_reader: ByteReader::new(false),
            event_name_len: 0,
            data_start: 0,
            data_pos_raw: 0,
            move_next_remaining: 0,
            stack_top: StackEntry::ZERO,
            stack_index: 0,
            state: EnumeratorState::Error,
            substate: SubState::Error,
            last_error: None,
            element_size: 0,
            field_type: FieldType {
                encoding: FieldEncoding::Invalid,
                format: FieldFormat::Default,
                tag: 0,
            },
            data_pos_cooked: 0,
            item_size_raw: 0,
            item_size_cooked: 0,
            stack: [StackEntry::ZERO; Self::STRUCT_NEST_LIMIT as usize],
        };
    }

    /// Parses the header, extensions, and metadata of an EventHeader event, and
    /// returns an enumerator positioned before the first item.
    ///
    /// - `tracepoint_name` is the name of the tracepoint, e.g. "ProviderName_L1K2".
    /// - `event_data` is the event's user data, starting at the `eventheader_flags`
    ///   field (immediately after the event's common fields).
    ///
    /// The returned enumerator's `move_next` limit is `MOVE_NEXT_LIMIT_DEFAULT`.
    /// On failure, returns `Err` and no enumerator is produced: there is nothing
    /// to call `move_next` on.
    pub fn start_event<'ctx, 'nam, 'dat>(
        &'ctx mut self,
        tracepoint_name: &'nam str,
        event_data: &'dat [u8],
    ) -> Result<Enumerator<'ctx, 'nam, 'dat>, EnumeratorError> {
        return self.start_event_with_limit(tracepoint_name, event_data, Self::MOVE_NEXT_LIMIT_DEFAULT);
    }

    /// Same as `start_event`, but sets the `move_next` limit to
    /// `move_next_limit` instead of the default. This bounds the number of
    /// `move_next()` calls that can be made while decoding the event, guarding
    /// against excessive CPU usage on malformed events.
    pub fn start_event_with_limit<'ctx, 'nam, 'dat>(
        &'ctx mut self,
        tracepoint_name: &'nam str,
        event_data: &'dat [u8],
        move_next_limit: u32,
    ) -> Result<Enumerator<'ctx, 'nam, 'dat>, EnumeratorError> {
        const EVENT_HEADER_TRACEPOINT_NAME_MAX: usize = 256;

        let mut event_pos = 0;
        let tp_name_bytes = tracepoint_name.as_bytes();

        if event_data.len() < mem::size_of::<EventHeader>()
            || event_data.len() >= 0x80000000
            || tp_name_bytes.len() >= EVENT_HEADER_TRACEPOINT_NAME_MAX
        {
            // Event has no header or tracepoint_name too long.
            return Err(EnumeratorError::InvalidParameter);
        }

        // Get event header and validate it.

        self.header.flags = HeaderFlags::from_int(event_data[event_pos]);
        self.byte_reader = ByteReader::new(!self.header.flags.has_flag(HeaderFlags::LittleEndian));
        event_pos += 1;
        self.header.version = event_data[event_pos];
        event_pos += 1;
        self.header.id = self.byte_reader.read_u16(&event_data[event_pos..]);
        event_pos += 2;
        self.header.tag = self.byte_reader.read_u16(&event_data[event_pos..]);
        event_pos += 2;
        self.header.opcode = Opcode::from_int(event_data[event_pos]);
        event_pos += 1;
        self.header.level = Level::from_int(event_data[event_pos]);
        event_pos += 1;

        if self.header.flags.as_int() != (self.header.flags.as_int() & HeaderFlags::KnownMask) {
            // Not a supported event: unsupported flags.
            return Err(EnumeratorError::NotSupported);
        }

        // Validate tracepoint name (e.g. "ProviderName_L1K2..."), extract keyword.

        let mut attrib_pos = tp_name_bytes.len();
        loop {
            if attrib_pos == 0 {
                // Not a supported event: no Level in name.
                return Err(EnumeratorError::NotSupported);
            }

            attrib_pos -= 1;
            if tp_name_bytes[attrib_pos] == b'_' {
                attrib_pos += 1; // Skip underscore.
                break;
            }
        }

        if attrib_pos >= tp_name_bytes.len() || tp_name_bytes[attrib_pos] != b'L' {
            // Not a supported event: no Level in name.
            return Err(EnumeratorError::NotSupported);
        }

        let attrib_level;
        (attrib_level, attrib_pos) = lowercase_hex_to_int(tp_name_bytes, attrib_pos + 1);
        if attrib_level != self.header.level.as_int() as u64 {
            // Not a supported event: name's level != header's level.
            return Err(EnumeratorError::NotSupported);
        }

        if attrib_pos >= tp_name_bytes.len() || b'K' != tp_name_bytes[attrib_pos] {
            // Not a supported event: no Keyword in name.
            return Err(EnumeratorError::NotSupported);
        }

        (self.keyword, attrib_pos) = lowercase_hex_to_int(tp_name_bytes, attrib_pos + 1);

        // Validate but ignore any other attributes.

        while attrib_pos < tp_name_bytes.len() {
            let ch = tp_name_bytes[attrib_pos];
            attrib_pos += 1;
            if !ch.is_ascii_uppercase() {
                // Invalid attribute start character.
                return Err(EnumeratorError::NotSupported);
            }

            // Skip attribute value chars.
            while attrib_pos < tp_name_bytes.len() {
                let ch = tp_name_bytes[attrib_pos];
                if !ch.is_ascii_digit() && !ch.is_ascii_lowercase() {
                    break;
                }
                attrib_pos += 1;
            }
        }

        // Parse header extensions.

        self.meta_start = 0;
        self.meta_end = 0;
        self.activity_id_start = 0;
        self.activity_id_len = 0;

        if self.header.flags.has_flag(HeaderFlags::Extension) {
            loop {
                if event_data.len() - event_pos < mem::size_of::<EventHeaderExtension>() {
                    return Err(EnumeratorError::InvalidData);
                }

                let ext_size = self.byte_reader.read_u16(&event_data[event_pos..]);
                event_pos += 2;
                let ext_kind = ExtensionKind::from_int(self.byte_reader.read_u16(&event_data[event_pos..]));
                event_pos += 2;

                if event_data.len() - event_pos < ext_size as usize {
                    return Err(EnumeratorError::InvalidData);
                }

                match ExtensionKind::from_int(ext_kind.as_int() & ExtensionKind::ValueMask) {
                    ExtensionKind::Invalid => {
                        // Invalid extension type.
                        return Err(EnumeratorError::InvalidData);
                    }
                    ExtensionKind::Metadata => {
                        if self.meta_start != 0 {
                            // Multiple Metadata extensions.
                            return Err(EnumeratorError::InvalidData);
                        }

                        self.meta_start = event_pos as u32;
                        self.meta_end = self.meta_start + ext_size as u32;
                    }
                    ExtensionKind::ActivityId => {
                        if self.activity_id_start != 0 || (ext_size != 16 && ext_size != 32) {
                            // Multiple ActivityId extensions, or bad activity id size.
                            return Err(EnumeratorError::InvalidData);
                        }

                        self.activity_id_start = event_pos as u32;
                        self.activity_id_len = ext_size as u8;
                    }
                    _ => {} // Ignore other extension types.
                }

                event_pos += ext_size as usize;

                if !ext_kind.has_flag(ExtensionKind::from_int(ExtensionKind::ChainFlag)) {
                    break;
                }
            }
        }

        if self.meta_start == 0 {
            // Not a supported event - no metadata extension.
            return Err(EnumeratorError::NotSupported);
        }

        let mut name_pos = self.meta_start as usize;
        let meta_end = self.meta_end as usize;
        loop {
            if name_pos >= meta_end {
                // Event name not nul-terminated.
                return Err(EnumeratorError::InvalidData);
            }

            if event_data[name_pos] == 0 {
                break;
            }

            name_pos += 1;
        }

        self.event_name_len = (name_pos - self.meta_start as usize) as u16;
        self.data_start = event_pos as u32;
        self.reset(move_next_limit);
        return Ok(Enumerator {
            context: self,
            event_data,
            tracepoint_name,
        });
    }

    fn reset(&mut self, move_next_limit: u32) {
        self.data_pos_raw = self.data_start;
        self.move_next_remaining = move_next_limit;
        self.stack_top.next_offset = self.meta_start + self.event_name_len as u32 + 1;
        self.stack_top.remaining_field_count = 255;
        self.stack_index = 0;
        self.set_state(EnumeratorState::BeforeFirstItem, SubState::BeforeFirstItem);
        self.last_error = None;
    }

    fn move_next(&mut self, event_data: &[u8]) -> bool {
        debug_assert!(self.state.can_move_next());

        if self.move_next_remaining == 0 {
            return self.set_error_state(EnumeratorError::ImplementationLimit);
        }

        self.move_next_remaining -= 1;

        let moved_to_item;
        match self.substate {
            SubState::BeforeFirstItem => {
                debug_assert!(self.state == EnumeratorState::BeforeFirstItem);
                moved_to_item = self.next_property(event_data);
            }
            SubState::ValueScalar => {
                debug_assert!(self.state == EnumeratorState::Value);
                debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                debug_assert!(!self.field_type.encoding.is_array());
                debug_assert!(event_data.len() as u32 - self.data_pos_raw >= self.item_size_raw);

                self.data_pos_raw += self.item_size_raw;
                moved_to_item = self.next_property(event_data);
            }
            SubState::ValueSimpleArrayElement => {
                debug_assert!(self.state == EnumeratorState::Value);
                debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                debug_assert!(self.field_type.encoding.is_array());
                debug_assert!(self.stack_top.array_index < self.stack_top.array_count);
                debug_assert!(self.element_size != 0); // Eligible for fast path.
                debug_assert!(event_data.len() as u32 - self.data_pos_raw >= self.item_size_raw);

                self.data_pos_raw += self.item_size_raw;
                self.stack_top.array_index += 1;

                if self.stack_top.array_count == self.stack_top.array_index {
                    // End of array.
                    self.set_end_state(EnumeratorState::ArrayEnd, SubState::ArrayEnd);
                } else {
                    // Middle of array - get next element.
                    self.start_value_simple(); // Fast path for simple array elements.
                }

                moved_to_item = true;
            }
            SubState::ValueComplexArrayElement => {
                debug_assert!(self.state == EnumeratorState::Value);
                debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                debug_assert!(self.field_type.encoding.is_array());
                debug_assert!(self.stack_top.array_index < self.stack_top.array_count);
                debug_assert!(self.element_size == 0); // Not eligible for fast path.
                debug_assert!(event_data.len() as u32 - self.data_pos_raw >= self.item_size_raw);

                self.data_pos_raw += self.item_size_raw;
                self.stack_top.array_index += 1;

                if self.stack_top.array_count == self.stack_top.array_index {
                    // End of array.
                    self.set_end_state(EnumeratorState::ArrayEnd, SubState::ArrayEnd);
                    moved_to_item = true;
                } else {
                    // Middle of array - get next element.
                    moved_to_item = self.start_value(event_data); // Normal path for complex array elements.
                }
            }
            SubState::ArrayBegin => {
                debug_assert!(self.state == EnumeratorState::ArrayBegin);
                debug_assert!(self.field_type.encoding.is_array());
                debug_assert!(self.stack_top.array_index == 0);

                if self.stack_top.array_count == 0 {
                    // 0-length array.
                    self.set_end_state(EnumeratorState::ArrayEnd, SubState::ArrayEnd);
                    moved_to_item = true;
                } else if self.element_size != 0 {
                    // First element of simple array.
                    debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                    self.item_size_cooked = self.element_size as u32;
                    self.item_size_raw = self.element_size as u32;
                    self.set_state(EnumeratorState::Value, SubState::ValueSimpleArrayElement);
                    self.start_value_simple();
                    moved_to_item = true;
                } else if self.field_type.encoding.base_encoding() != FieldEncoding::Struct {
                    // First element of complex array.
                    self.set_state(EnumeratorState::Value, SubState::ValueComplexArrayElement);
                    moved_to_item = self.start_value(event_data);
                } else {
                    // First element of array of struct.
                    self.start_struct();
                    moved_to_item = true;
                }
            }
            SubState::ArrayEnd => {
                debug_assert!(self.state == EnumeratorState::ArrayEnd);
                debug_assert!(self.field_type.encoding.is_array());
                debug_assert!(self.stack_top.array_count == self.stack_top.array_index);

                // 0-length array of struct means we won't naturally traverse
                // the child struct's metadata. Since stack_top.next_offset
                // won't get updated naturally, we need to update it manually.
                if self.field_type.encoding.base_encoding() == FieldEncoding::Struct
                    && self.stack_top.array_count == 0
                    && !self.skip_struct_metadata(event_data)
                {
                    moved_to_item = false;
                } else {
                    moved_to_item = self.next_property(event_data);
                }
            }
            SubState::StructBegin => {
                debug_assert!(self.state == EnumeratorState::StructBegin);
                if self.stack_index >= Self::STRUCT_NEST_LIMIT {
                    moved_to_item = self.set_error_state(EnumeratorError::StackOverflow);
                } else {
                    self.stack[self.stack_index as usize] = self.stack_top;
                    self.stack_index += 1;

                    self.stack_top.remaining_field_count = self.field_type.format.as_int();
                    // Parent's next_offset is the correct starting point for the struct.
                    moved_to_item = self.next_property(event_data);
                }
            }
            SubState::StructEnd => {
                debug_assert!(self.state == EnumeratorState::StructEnd);
                debug_assert!(self.field_type.encoding.base_encoding() == FieldEncoding::Struct);
                debug_assert!(self.item_size_raw == 0);

                self.stack_top.array_index += 1;

                if self.stack_top.array_count != self.stack_top.array_index {
                    debug_assert!(self.field_type.encoding.is_array());
                    debug_assert!(self.stack_top.array_index < self.stack_top.array_count);

                    // Middle of array - get next element.
                    self.start_struct();
                    moved_to_item = true;
                } else if self.field_type.encoding.is_array() {
                    // End of array.
                    self.set_end_state(EnumeratorState::ArrayEnd, SubState::ArrayEnd);
                    moved_to_item = true;
                } else {
                    // End of property - move to next property.
                    moved_to_item = self.next_property(event_data);
                }
            }
            _ => {
                debug_assert!(false, "Unexpected substate.");
                moved_to_item = false;
            }
        }

        return moved_to_item;
    }

    fn move_next_sibling(&mut self, event_data: &[u8]) -> bool {
        debug_assert!(self.state.can_move_next());
        let mut moved_to_item;
        let mut depth: i32 = 0; // May go negative if we start on ArrayEnd/StructEnd.
        loop {
            match self.state {
                EnumeratorState::ArrayEnd | EnumeratorState::StructEnd => {
                    depth -= 1;
                }
                EnumeratorState::StructBegin => {
                    depth += 1;
                }
                EnumeratorState::ArrayBegin => {
                    if self.element_size == 0 || self.move_next_remaining == 0 {
                        // Use move_next for full processing.
                        depth += 1;
                    } else {
                        // Array of simple elements - jump directly to next sibling.
                        debug_assert!(matches!(self.substate, SubState::ArrayBegin));
                        debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                        debug_assert!(self.field_type.encoding.is_array());
                        debug_assert!(self.stack_top.array_index == 0);
                        self.data_pos_raw += self.stack_top.array_count as u32 * self.element_size as u32;
                        self.move_next_remaining -= 1;
                        self.next_property(event_data);
                        continue; // Skip move_next().
                    }
                }
                _ => {} // Same as move_next.
            }

            moved_to_item = self.move_next(event_data);
            if !moved_to_item || depth <= 0 {
                break;
            }
        }

        return moved_to_item;
    }

    fn move_next_metadata(&mut self, event_data: &[u8]) -> bool {
        if !matches!(self.substate, SubState::ValueMetadata) {
            debug_assert!(self.state == EnumeratorState::BeforeFirstItem);
            debug_assert!(matches!(self.substate, SubState::BeforeFirstItem));
            self.stack_top.array_index = 0;
            self.data_pos_cooked = event_data.len() as u32;
            self.item_size_cooked = 0;
            self.element_size = 0;
            self.set_state(EnumeratorState::Value, SubState::ValueMetadata);
        }

        debug_assert!(self.state == EnumeratorState::Value || self.state == EnumeratorState::ArrayBegin);

        let moved_to_item;
        if self.stack_top.next_offset != self.meta_end {
            self.stack_top.name_offset = self.stack_top.next_offset;

            self.field_type = self.read_field_name_and_type(event_data);
            if self.field_type.encoding == Self::READ_FIELD_ERROR {
                moved_to_item = self.set_error_state(EnumeratorError::InvalidData);
            } else if FieldEncoding::Struct == self.field_type.encoding.base_encoding()
                && self.field_type.format == FieldFormat::Default
            {
                // Struct must have at least 1 field (potential for DoS).
                moved_to_item = self.set_error_state(EnumeratorError::InvalidData);
            } else if !self.field_type.encoding.is_array() {
                // Non-array.
                self.stack_top.array_count = 1;
                moved_to_item = true;
                self.set_state(EnumeratorState::Value, SubState::ValueMetadata);
            } else if self.field_type.encoding.is_varray() {
                // Runtime-variable array length.
                self.stack_top.array_count = 0;
                moved_to_item = true;
                self.set_state(EnumeratorState::ArrayBegin, SubState::ValueMetadata);
            } else if self.field_type.encoding.is_carray() {
                // Compile-time-constant array length.

                if self.meta_end - self.stack_top.next_offset < 2 {
                    moved_to_item = self.set_error_state(EnumeratorError::InvalidData);
                } else {
                    self.stack_top.array_count = self
                        .byte_reader
                        .read_u16(&event_data[self.stack_top.next_offset as usize..]);
                    self.stack_top.next_offset += 2;

                    if self.stack_top.array_count == 0 {
                        // Constant-length array cannot have length of 0 (potential for DoS).
                        moved_to_item = self.set_error_state(EnumeratorError::InvalidData);
                    } else {
                        moved_to_item = true;
                        self.set_state(EnumeratorState::ArrayBegin, SubState::ValueMetadata);
                    }
                }
            } else {
                moved_to_item = self.set_error_state(EnumeratorError::NotSupported);
            }
        } else {
            // End of event.

            self.set_end_state(EnumeratorState::AfterLastItem, SubState::AfterLastItem);
            moved_to_item = false; // No more items.
        }

        return moved_to_item;
    }

    fn skip_struct_metadata(&mut self, event_data: &[u8]) -> bool {
        debug_assert!(self.field_type.encoding.base_encoding() == FieldEncoding::Struct);

        let ok;
        let mut remaining_field_count = self.field_type.format.as_int();
        loop {
            // It's unusual but legal to reach end-of-metadata before
            // remaining_field_count == 0.
            if remaining_field_count == 0 || self.stack_top.next_offset == self.meta_end {
                ok = true;
                break;
            }

            self.stack_top.name_offset = self.stack_top.next_offset;

            // Minimal validation, then skip the field:

            let typ = self.read_field_name_and_type(event_data);
            if typ.encoding == Self::READ_FIELD_ERROR {
                ok = self.set_error_state(EnumeratorError::InvalidData);
                break;
            }

            if FieldEncoding::Struct == typ.encoding.base_encoding() {
                remaining_field_count += typ.format.as_int();
            }

            if !typ.encoding.is_carray() {
                // Scalar or runtime length. We're done with the field.
            } else if !typ.encoding.is_varray() {
                // CArrayFlag is set, VArrayFlag is unset.
                // Compile-time-constant array length.
                // Skip the array length in metadata.

                if self.meta_end - self.stack_top.next_offset < 2 {
                    ok = self.set_error_state(EnumeratorError::InvalidData);
                    break;
                }

                self.stack_top.next_offset += 2;
            } else {
                // Both CArrayFlag and VArrayFlag are set (reserved encoding).
                ok = self.set_error_state(EnumeratorError::NotSupported);
                break;
            }

            remaining_field_count -= 1;
        }

        return ok;
    }

    fn next_property(&mut self, event_data: &[u8]) -> bool {
        if self.stack_top.remaining_field_count != 0 && self.stack_top.next_offset != self.meta_end {
            self.stack_top.remaining_field_count -= 1;
            self.stack_top.array_index = 0;
            self.stack_top.name_offset = self.stack_top.next_offset;

            // Decode a field:

            self.field_type = self.read_field_name_and_type(event_data);
            if self.field_type.encoding == Self::READ_FIELD_ERROR {
                return self.set_error_state(EnumeratorError::InvalidData);
            }

            if !self.field_type.encoding.is_array() {
                // Non-array.

                self.stack_top.array_count = 1;
                if FieldEncoding::Struct != self.field_type.encoding {
                    self.set_state(EnumeratorState::Value, SubState::ValueScalar);
                    return self.start_value(event_data);
                }

                if self.field_type.format == FieldFormat::Default {
                    // Struct must have at least 1 field (potential for DoS).
                    return self.set_error_state(EnumeratorError::InvalidData);
                }

                self.start_struct();
                return true;
            }

            if self.field_type.encoding.is_varray() {
                // Runtime-variable array length.

                if event_data.len() - (self.data_pos_raw as usize) < 2 {
                    return self.set_error_state(EnumeratorError::InvalidData);
                }

                self.stack_top.array_count = self.byte_reader.read_u16(&event_data[self.data_pos_raw as usize..]);
                self.data_pos_raw += 2;

                return self.start_array(event_data.len() as u32); // start_array will set flags.
            }

            if self.field_type.encoding.is_carray() {
                // Compile-time-constant array length.

                if self.meta_end - self.stack_top.next_offset < 2 {
                    return self.set_error_state(EnumeratorError::InvalidData);
                }

                self.stack_top.array_count = self
                    .byte_reader
                    .read_u16(&event_data[self.stack_top.next_offset as usize..]);
                self.stack_top.next_offset += 2;

                if self.stack_top.array_count == 0 {
                    // Constant-length array cannot have length of 0 (potential for DoS).
                    return self.set_error_state(EnumeratorError::InvalidData);
                }

                return self.start_array(event_data.len() as u32); // start_array will set flags.
            }

            return self.set_error_state(EnumeratorError::NotSupported);
        }

        if self.stack_index != 0 {
            // End of struct.
            // It's unusual but legal to reach end-of-metadata before
            // remaining_field_count == 0.

            // Pop child from stack.
            self.stack_index -= 1;
            let child_metadata_offset = self.stack_top.next_offset;
            self.stack_top = self.stack[self.stack_index as usize];

            self.field_type = self.read_field_type(
                event_data,
                self.stack_top.name_offset + self.stack_top.name_len as u32 + 1,
            );
            debug_assert!(FieldEncoding::Struct == self.field_type.encoding.base_encoding());
            self.element_size = 0;

            // Unless parent is in the middle of an array, we need to set the
            // "next field" position to the child's metadata position.
            debug_assert!(self.stack_top.array_index < self.stack_top.array_count);
            if self.stack_top.array_index + 1 == self.stack_top.array_count {
                self.stack_top.next_offset = child_metadata_offset;
            }

            self.set_end_state(EnumeratorState::StructEnd, SubState::StructEnd);
            return true;
        }

        // End of event.

        if self.stack_top.next_offset != self.meta_end {
            // Event has metadata for more than the supported top-level field count.
            return self.set_error_state(EnumeratorError::NotSupported);
        }

        self.set_end_state(EnumeratorState::AfterLastItem, SubState::AfterLastItem);
        return false; // No more items.
    }

    fn read_field_name_and_type(&mut self, event_data: &[u8]) -> FieldType {
        let name_begin = self.stack_top.name_offset;
        debug_assert!(self.meta_end >= name_begin);

        let mut name_end = name_begin;
        while name_end < self.meta_end && event_data[name_end as usize] != 0 {
            name_end += 1;
        }

        if self.meta_end - name_end < 2 {
            // Missing nul termination or missing encoding.
            return FieldType {
                encoding: Self::READ_FIELD_ERROR,
                format: FieldFormat::Default,
                tag: 0,
            };
        } else {
            self.stack_top.name_len = (name_end - name_begin) as u16;
            return self.read_field_type(event_data, name_end + 1);
        }
    }

    fn read_field_type(&mut self, event_data: &[u8], type_offset: u32) -> FieldType {
        let mut pos = type_offset;
        debug_assert!(self.meta_end > pos);

        let mut encoding = FieldEncoding::from_int(event_data[pos as usize]);
        let mut format = FieldFormat::Default;
        let mut tag = 0;
        pos += 1;
        if encoding.has_chain_flag() {
            if self.meta_end == pos {
                // Missing format.
                encoding = Self::READ_FIELD_ERROR;
            } else {
                format = FieldFormat::from_int(event_data[pos as usize]);
                pos += 1;
                if format.has_chain_flag() {
                    if self.meta_end - pos < 2 {
                        // Missing tag.
                        encoding = Self::READ_FIELD_ERROR;
                    } else {
                        tag = self.byte_reader.read_u16(&event_data[pos as usize..]);
                        pos += 2;
                    }
                }
            }
        }

        self.stack_top.next_offset = pos;
        return FieldType {
            encoding: encoding.without_chain_flag(),
            format: format.base_encoding(),
            tag,
        };
    }

    /// Returns: moved_to_value
    fn start_array(&mut self, event_data_len: u32) -> bool {
        self.element_size = 0;
        self.item_size_raw = 0;
        self.data_pos_cooked = self.data_pos_raw;
        self.item_size_cooked = 0;
        self.set_state(EnumeratorState::ArrayBegin, SubState::ArrayBegin);

        // Determine the element_size value.
        match self.field_type.encoding.base_encoding() {
            FieldEncoding::Struct => return true,

            FieldEncoding::Value8 => {
                self.element_size = 1;
            }

            FieldEncoding::Value16 => {
                self.element_size = 2;
            }

            FieldEncoding::Value32 => {
                self.element_size = 4;
            }

            FieldEncoding::Value64 => {
                self.element_size = 8;
            }

            FieldEncoding::Value128 => {
                self.element_size = 16;
            }

            FieldEncoding::ZStringChar8
            | FieldEncoding::ZStringChar16
            | FieldEncoding::ZStringChar32
            | FieldEncoding::StringLength16Char8
            | FieldEncoding::StringLength16Char16
            | FieldEncoding::StringLength16Char32 => return true,

            FieldEncoding::Invalid => return self.set_error_state(EnumeratorError::InvalidData),

            _ => return self.set_error_state(EnumeratorError::NotSupported),
        }

        // For simple array element types, validate that count * element_size <= remaining.
        // That way we can skip per-element validation and can safely expose the array
        // data during ArrayBegin.
        let remaining_len = event_data_len - self.data_pos_raw;
        let array_len = self.stack_top.array_count as u32 * self.element_size as u32;
        if remaining_len < array_len {
            return self.set_error_state(EnumeratorError::InvalidData);
        }

        self.item_size_cooked = array_len;
        self.item_size_raw = array_len;
        return true;
    }

    fn start_struct(&mut self) {
        debug_assert!(self.field_type.encoding.base_encoding() == FieldEncoding::Struct);
        self.element_size = 0;
        self.item_size_raw = 0;
        self.data_pos_cooked = self.data_pos_raw;
        self.item_size_cooked = 0;
        self.set_state(EnumeratorState::StructBegin, SubState::StructBegin);
    }

    fn start_value(&mut self, event_data: &[u8]) -> bool {
        let remaining_len = event_data.len() as u32 - self.data_pos_raw;

        debug_assert!(self.state == EnumeratorState::Value);
        self.data_pos_cooked = self.data_pos_raw;
        self.element_size = 0;

        match self.field_type.encoding.base_encoding() {
            FieldEncoding::Value8 => return self.start_value_fixed_length(event_data, 1),
            FieldEncoding::Value16 => return self.start_value_fixed_length(event_data, 2),
            FieldEncoding::Value32 => return self.start_value_fixed_length(event_data, 4),
            FieldEncoding::Value64 => return self.start_value_fixed_length(event_data, 8),
            FieldEncoding::Value128 => return self.start_value_fixed_length(event_data, 16),

            FieldEncoding::ZStringChar8 => self.start_value_zstring8(event_data),
            FieldEncoding::ZStringChar16 => self.start_value_zstring16(event_data),
            FieldEncoding::ZStringChar32 => self.start_value_zstring32(event_data),
            FieldEncoding::StringLength16Char8 => self.start_value_string(event_data, 0),
            FieldEncoding::StringLength16Char16 => self.start_value_string(event_data, 1),
            FieldEncoding::StringLength16Char32 => self.start_value_string(event_data, 2),

            _ => {
                debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
                self.item_size_cooked = 0;
                self.item_size_raw = 0;
                return self.set_error_state(EnumeratorError::InvalidData);
            }
        }

        if remaining_len < self.item_size_raw {
            self.item_size_cooked = 0;
            self.item_size_raw = 0;
            return self.set_error_state(EnumeratorError::InvalidData);
        }

        return true;
    }

    fn start_value_simple(&mut self) {
        debug_assert!(self.stack_top.array_index < self.stack_top.array_count);
        debug_assert!(self.field_type.encoding.is_array());
        debug_assert!(self.field_type.encoding.base_encoding() != FieldEncoding::Struct);
        debug_assert!(self.element_size != 0);
        debug_assert!(self.item_size_cooked == self.element_size as u32);
        debug_assert!(self.item_size_raw == self.element_size as u32);
        debug_assert!(self.state == EnumeratorState::Value);
        self.data_pos_cooked = self.data_pos_raw;
    }

    fn start_value_fixed_length(&mut self, event_data: &[u8], size: u8) -> bool {
        let remaining_len = event_data.len() as u32 - self.data_pos_raw;

        self.element_size = size;
        self.item_size_cooked = size as u32;
        self.item_size_raw = size as u32;

        if size as u32 <= remaining_len {
            return true;
        } else {
            self.item_size_cooked = 0;
            self.item_size_raw = 0;
            self.set_error_state(EnumeratorError::InvalidData);
            return false;
        }
    }

    fn start_value_zstring8(&mut self, event_data: &[u8]) {
        type Ch = u8;
        const ELEMENT_SIZE: usize = mem::size_of::<Ch>();
        let end_pos = event_data.len() - ELEMENT_SIZE + 1;
        let mut pos = self.data_pos_raw as usize;
        while pos < end_pos {
            // Byte order not significant - just need to see if it is all-0-bits.
            if 0 == event_data[pos] {
                self.item_size_cooked = pos as u32 - self.data_pos_raw;
                self.item_size_raw = self.item_size_cooked + ELEMENT_SIZE as u32;
                return;
            }
            pos += ELEMENT_SIZE;
        }

        self.item_size_cooked = event_data.len() as u32 - self.data_pos_raw;
        self.item_size_raw = event_data.len() as u32 - self.data_pos_raw;
    }

    fn start_value_zstring16(&mut self, event_data: &[u8]) {
        type Ch = u16;
        const ELEMENT_SIZE: usize = mem::size_of::<Ch>();
        let end_pos = event_data.len() - ELEMENT_SIZE + 1;
        let mut pos = self.data_pos_raw as usize;
        while pos < end_pos {
            // Byte order not significant - just need to see if it is all-0-bits.
            if 0 == Ch::from_ne_bytes(event_data[pos..pos + ELEMENT_SIZE].try_into().unwrap()) {
                self.item_size_cooked = pos as u32 - self.data_pos_raw;
                self.item_size_raw = self.item_size_cooked + ELEMENT_SIZE as u32;
                return;
            }
            pos += ELEMENT_SIZE;
        }

        self.item_size_cooked = event_data.len() as u32 - self.data_pos_raw;
        self.item_size_raw = event_data.len() as u32 - self.data_pos_raw;
    }

    fn start_value_zstring32(&mut self, event_data: &[u8]) {
        type Ch = u32;
        const ELEMENT_SIZE: usize = mem::size_of::<Ch>();
        let end_pos = event_data.len() - ELEMENT_SIZE + 1;
        let mut pos = self.data_pos_raw as usize;
        while pos < end_pos {
            // Byte order not significant - just need to see if it is all-0-bits.
            if 0 == Ch::from_ne_bytes(event_data[pos..pos + ELEMENT_SIZE].try_into().unwrap()) {
                self.item_size_cooked = pos as u32 - self.data_pos_raw;
                self.item_size_raw = self.item_size_cooked + ELEMENT_SIZE as u32;
                return;
            }
            pos += ELEMENT_SIZE;
        }

        self.item_size_cooked = event_data.len() as u32 - self.data_pos_raw;
        self.item_size_raw = event_data.len() as u32 - self.data_pos_raw;
    }

    fn start_value_string(&mut self, event_data: &[u8], char_size_shift: u8) {
        let remaining = event_data.len() as u32 - self.data_pos_raw;
        if remaining < 2 {
            self.item_size_raw = 2;
        } else {
            self.data_pos_cooked = self.data_pos_raw + 2;

            let cch = self.byte_reader.read_u16(&event_data[self.data_pos_raw as usize..]);
            self.item_size_cooked = (cch as u32) << char_size_shift;
            self.item_size_raw = self.item_size_cooked + 2;
        }
    }

    fn set_state(&mut self, state: EnumeratorState, substate: SubState) {
        self.state = state;
        self.substate = substate;
    }

    fn set_end_state(&mut self, state: EnumeratorState, substate: SubState) {
        self.data_pos_cooked = self.data_pos_raw;
        self.item_size_raw = 0;
        self.item_size_cooked = 0;
        self.state = state;
        self.substate = substate;
    }

    fn set_error_state(&mut self, error: EnumeratorError) -> bool {
        self.last_error = Some(error);
        self.state = EnumeratorState::Error;
        self.substate = SubState::Error;
        return false;
    }
}

impl Default for EnumeratorContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_int() {
        assert_eq!(lowercase_hex_to_int(b"", 0), (0, 0));
        assert_eq!(lowercase_hex_to_int(b" ", 0), (0, 0));
        assert_eq!(lowercase_hex_to_int(b" ", 1), (0, 1));
        assert_eq!(lowercase_hex_to_int(b"0", 0), (0, 1));
        assert_eq!(lowercase_hex_to_int(b"0", 1), (0, 1));
        assert_eq!(lowercase_hex_to_int(b"gfedcba9876543210ABCDEFG", 0), (0, 0));
        assert_eq!(
            lowercase_hex_to_int(b"gfedcba9876543210ABCDEFG", 1),
            (0xfedcba9876543210, 17)
        );
        assert_eq!(
            lowercase_hex_to_int(b"gfedcba9876543210ABCDEFG", 2),
            (0xedcba9876543210, 17)
        );
    }

    #[test]
    fn state_ordering() {
        assert!(!EnumeratorState::Error.can_move_next());
        assert!(!EnumeratorState::AfterLastItem.can_move_next());
        assert!(EnumeratorState::BeforeFirstItem.can_move_next());
        assert!(!EnumeratorState::BeforeFirstItem.can_item_info());
        assert!(EnumeratorState::Value.can_item_info());
        assert!(EnumeratorState::StructEnd.can_item_info());
    }
}
