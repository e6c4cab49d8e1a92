// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![no_std]
#![allow(clippy::needless_return)]
#![warn(missing_docs)]

//! Pull-style, zero-copy, borrow-safe decoder for EventHeader-encoded Linux
//! tracepoint events.
//!
//! An EventHeader event is the payload of a Linux `user_events`/tracefs
//! tracepoint whose name ends in an encoded level and keyword, e.g.
//! `MyProvider_L5K1f`, and whose data begins with an [`eventheader_types::EventHeader`]
//! followed by zero or more chained extension blocks (one of which, the
//! Metadata extension, describes the event name and field layout) and finally
//! the field payload itself.
//!
//! Start decoding an event with [`EnumeratorContext::new`] and
//! [`EnumeratorContext::start_event`], then drive the returned
//! [`Enumerator`] with `move_next()` until it reaches
//! [`EnumeratorState::AfterLastItem`] or [`EnumeratorState::Error`]. Use
//! `item_info()` at each state where [`EnumeratorState::can_item_info`] is
//! true to get the current field's name and typed value.
//!
//! This crate performs no allocation and holds no owned copies of event data:
//! all names and values returned from an [`Enumerator`] borrow directly from
//! the `event_data` slice passed to `start_event`.

pub use byte_reader::ByteReader;
pub use enumerator::Enumerator;
pub use enumerator::EnumeratorContext;
pub use enumerator::EnumeratorError;
pub use enumerator::EnumeratorState;
pub use enumerator::EventInfo;
pub use enumerator::ItemInfo;
pub use item::ItemMetadata;
pub use item::ItemValue;
pub use item::TextEncoding;

pub mod changelog;

mod byte_reader;
mod enumerator;
mod item;
