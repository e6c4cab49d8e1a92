// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Release history

#[allow(unused_imports)]
use crate::*; // For docs

/// # v0.1.0
/// - Initial release: wire-format types for EventHeader-encoded Linux
///   tracepoint events (`EventHeader`, `EventHeaderExtension`, `HeaderFlags`,
///   `ExtensionKind`, `FieldEncoding`, `FieldFormat`, `Level`, `Opcode`).
pub mod v0_1_0 {}
