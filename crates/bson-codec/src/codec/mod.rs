//! Binary encoding/decoding.
//!
//! This module implements the length-prefixed document wire format.

pub mod document;
pub mod primitives;
pub mod value;

pub use document::{
    decode, decode_document, decode_document_with_options, decode_with_options, encode,
    encode_document, encode_with_options, DecodeOptions, EncodeOptions, IntegerWidth,
};
pub use primitives::{Reader, Writer};
pub use value::{decode_value, encode_value};
