//! Encode/decode contract implemented by every entity kind.

use crate::error::CodecResult;
use crate::wire::WireDocument;

/// An entity with a stable wire representation.
///
/// Implementations must round-trip: `from_document(&e.to_document()) == Ok(e)`
/// for any entity whose floats are finite.
pub trait Document: Sized {
    fn to_document(&self) -> WireDocument;

    fn from_document(doc: &WireDocument) -> CodecResult<Self>;
}

/// Decode a batch; the first failure discards the whole batch.
pub fn decode_all<T: Document>(docs: &[WireDocument]) -> CodecResult<Vec<T>> {
    docs.iter().map(T::from_document).collect()
}

pub fn encode_all<T: Document>(items: &[T]) -> Vec<WireDocument> {
    items.iter().map(Document::to_document).collect()
}

/// Implement `serde::Serialize`/`Deserialize` for a [`Document`] through its
/// wire form, so JSON handed to API callers mirrors the stored document.
///
/// The invoking crate must depend on `serde`.
#[macro_export]
macro_rules! impl_wire_serde {
    ($t:ty) => {
        impl ::serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                ::serde::Serialize::serialize(&$crate::Document::to_document(self), serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let doc = <$crate::WireDocument as ::serde::Deserialize>::deserialize(deserializer)?;
                <$t as $crate::Document>::from_document(&doc).map_err(::serde::de::Error::custom)
            }
        }
    };
}
