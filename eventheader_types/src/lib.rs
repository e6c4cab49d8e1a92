// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![no_std]
#![warn(missing_docs)]

//! Wire-format types shared by generators and decoders of EventHeader-encoded
//! Linux tracepoint events: the `EventHeader` and `EventHeaderExtension`
//! structs, plus the small newtype-over-integer enums used throughout the
//! format (`HeaderFlags`, `ExtensionKind`, `FieldEncoding`, `FieldFormat`,
//! `Level`, `Opcode`).
//!
//! These types have no behavior of their own beyond bit-level accessors: they
//! exist so that a wire value that this crate does not recognize can still be
//! stored and round-tripped instead of causing a decode-time panic.

pub mod changelog;
mod descriptors;
mod enums;

pub use descriptors::EventHeader;
pub use descriptors::EventHeaderExtension;
pub use enums::ExtensionKind;
pub use enums::FieldEncoding;
pub use enums::FieldFormat;
pub use enums::HeaderFlags;
pub use enums::Level;
pub use enums::Opcode;
