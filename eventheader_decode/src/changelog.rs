// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Release history

#[allow(unused_imports)]
use crate::*; // For docs

/// # v0.1.0
/// - Initial release: pull-style enumerator (`EnumeratorContext`, `Enumerator`)
///   for EventHeader-encoded Linux tracepoint events, plus `ByteReader` and the
///   `ItemMetadata`/`ItemValue` typed field accessors.
pub mod v0_1_0 {}
