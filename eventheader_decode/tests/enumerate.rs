// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use eventheader_decode::*;
use eventheader_types::*;

const F_LE: u8 = HeaderFlags::LittleEndian.as_int();
const F_LE_EXT: u8 = HeaderFlags::LittleEndian.as_int() | HeaderFlags::Extension.as_int();

/// Appends an 8-byte EventHeader in wire order.
fn push_header(buf: &mut Vec<u8>, flags: u8, version: u8, id: u16, tag: u16, opcode: u8, level: u8) {
    buf.push(flags);
    buf.push(version);
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&tag.to_le_bytes());
    buf.push(opcode);
    buf.push(level);
}

/// Appends a 4-byte extension header (size, kind|chain) followed by `content`.
fn push_extension(buf: &mut Vec<u8>, kind: u16, chain: bool, content: &[u8]) {
    buf.extend_from_slice(&(content.len() as u16).to_le_bytes());
    let kind_and_chain = kind | if chain { 0x8000 } else { 0 };
    buf.extend_from_slice(&kind_and_chain.to_le_bytes());
    buf.extend_from_slice(content);
}

fn push_name(buf: &mut Vec<u8>, name: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
}

#[test]
fn empty_event_is_invalid_parameter() {
    let mut ctx = EnumeratorContext::new();
    let bytes = [0u8; 7];
    let err = ctx.start_event("p_L1K0", &bytes).unwrap_err();
    assert_eq!(err, EnumeratorError::InvalidParameter);
}

#[test]
fn header_only_is_not_supported() {
    let mut ctx = EnumeratorContext::new();
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE, 0, 0, 0, 0, 1);
    let err = ctx.start_event("p_L1K0", &bytes).unwrap_err();
    assert_eq!(err, EnumeratorError::NotSupported);
}

#[test]
fn single_u32_field() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E"); // event name
    push_name(&mut meta, "F"); // field name
    meta.push(FieldEncoding::Value32.as_int());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);

    bytes.extend_from_slice(&0x12345678u32.to_le_bytes());

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();
    assert_eq!(e.state(), EnumeratorState::BeforeFirstItem);
    assert_eq!(e.last_error(), None);

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::Value);
    let item = e.item_info();
    assert_eq!(item.name_bytes(), b"F");
    assert_eq!(item.metadata().encoding(), FieldEncoding::Value32);
    assert_eq!(item.value().to_u32(0), 0x12345678);

    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::AfterLastItem);
}

#[test]
fn carray_of_three_u16() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value16.as_int() | FieldEncoding::CArrayFlag);
    meta.extend_from_slice(&3u16.to_le_bytes());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);

    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes());

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::ArrayBegin);
    let begin = e.item_info();
    assert_eq!(begin.metadata().element_count(), 3);
    assert_eq!(begin.value().bytes().len(), 6);

    for expected in [1u16, 2, 3] {
        assert!(e.move_next());
        assert_eq!(e.state(), EnumeratorState::Value);
        assert_eq!(e.item_info().value().to_u16(0), expected);
    }

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::ArrayEnd);

    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::AfterLastItem);
}

#[test]
fn varray_of_zero_u32() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value32.as_int() | FieldEncoding::VArrayFlag);
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);

    bytes.extend_from_slice(&0u16.to_le_bytes()); // runtime array length = 0

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::ArrayBegin);
    assert_eq!(e.item_info().metadata().element_count(), 0);

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::ArrayEnd);

    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::AfterLastItem);
}

#[test]
fn struct_nesting_beyond_limit_overflows() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    for i in 0..9 {
        push_name(&mut meta, &format!("S{i}"));
        meta.push(FieldEncoding::Struct.as_int() | FieldEncoding::ChainFlag);
        meta.push(1); // one nested field
    }
    push_name(&mut meta, "Leaf");
    meta.push(FieldEncoding::Value8.as_int());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);
    bytes.push(0); // Leaf's one byte of payload, probably never reached.

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    let mut struct_begins = 0;
    loop {
        if !e.move_next() {
            break;
        }
        if e.state() == EnumeratorState::StructBegin {
            struct_begins += 1;
        }
    }

    assert_eq!(e.state(), EnumeratorState::Error);
    assert_eq!(e.last_error(), Some(EnumeratorError::StackOverflow));
    assert!(struct_begins <= EnumeratorContext::STRUCT_NEST_LIMIT as usize);
}

#[test]
fn zstring_without_terminator_takes_remaining_bytes() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::ZStringChar8.as_int());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);

    bytes.extend_from_slice(b"hi");

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    assert!(e.move_next());
    assert_eq!(e.state(), EnumeratorState::Value);
    assert_eq!(e.item_info().value().bytes(), b"hi");
    assert_eq!(e.last_error(), None);

    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::AfterLastItem);
}

#[test]
fn carray_with_malicious_count_is_invalid_data() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value32.as_int() | FieldEncoding::CArrayFlag);
    meta.extend_from_slice(&0xFFFFu16.to_le_bytes());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);

    bytes.extend_from_slice(&[0u8; 4]); // Far fewer bytes than 0xFFFF * 4.

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::Error);
    assert_eq!(e.last_error(), Some(EnumeratorError::InvalidData));
}

#[test]
fn reset_replays_same_sequence() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value32.as_int());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);
    bytes.extend_from_slice(&0x12345678u32.to_le_bytes());

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event("p_L0K0", &bytes).unwrap();

    assert!(e.move_next());
    let first_value = e.item_info().value().to_u32(0);
    assert!(!e.move_next());

    e.reset();
    assert_eq!(e.state(), EnumeratorState::BeforeFirstItem);
    assert!(e.move_next());
    assert_eq!(e.item_info().value().to_u32(0), first_value);
    assert!(!e.move_next());
}

#[test]
fn move_next_limit_is_enforced() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value8.as_int() | FieldEncoding::CArrayFlag);
    meta.extend_from_slice(&4u16.to_le_bytes());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);
    bytes.extend_from_slice(&[1, 2, 3, 4]);

    let mut ctx = EnumeratorContext::new();
    let mut e = ctx.start_event_with_limit("p_L0K0", &bytes, 1).unwrap();

    assert!(e.move_next()); // Consumes the one allotted move_next call (ArrayBegin).
    assert!(!e.move_next());
    assert_eq!(e.state(), EnumeratorState::Error);
    assert_eq!(e.last_error(), Some(EnumeratorError::ImplementationLimit));
}

#[test]
fn activity_id_extension_is_exposed() {
    let mut bytes = Vec::new();
    push_header(&mut bytes, F_LE_EXT, 0, 0, 0, 0, 0);

    let activity_id: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
    push_extension(&mut bytes, ExtensionKind::ActivityId.as_int(), true, &activity_id);

    let mut meta = Vec::new();
    push_name(&mut meta, "E");
    push_name(&mut meta, "F");
    meta.push(FieldEncoding::Value8.as_int());
    push_extension(&mut bytes, ExtensionKind::Metadata.as_int(), false, &meta);
    bytes.push(42);

    let mut ctx = EnumeratorContext::new();
    let e = ctx.start_event("p_L0K0", &bytes).unwrap();

    let info = e.event_info();
    assert_eq!(info.activity_id(), Some(&activity_id));
    assert_eq!(info.related_activity_id(), None);
    assert_eq!(info.provider_name(), "p");
}
