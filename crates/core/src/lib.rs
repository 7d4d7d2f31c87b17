//! `aggreports-core`: building blocks shared by the codec, the filter
//! compiler and the store adapters.
//!
//! Pure data and conversion logic only (no IO).

pub mod document;
pub mod error;
pub mod id;
pub mod wire;

pub use document::{Document, decode_all, encode_all};
pub use error::{CodecError, CodecResult, ValidationError};
pub use id::{DocumentKey, EntityId};
pub use wire::{DocumentBuilder, DocumentReader, KEY_FIELD, WireDocument};
