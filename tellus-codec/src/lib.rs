//! Wire codec for tellus telemetry graphs.
//!
//! The wire format is a JSON object per entity:
//! - `a_type` carries the kind tag (`SE`, `TR`, `EV`, `ST`, or a custom tag)
//! - well-known fields use the compact keys registered in the [`TypeRegistry`]
//! - extension fields pass through under their own names, prefixed with
//!   `~` when that name is reserved or already taken by a well-known field
//! - container children are nested under `child`
//!
//! Every scalar is written as a string. Arrays stay arrays, and registered
//! bean values become nested objects tagged with their simple type name.
//!
//! [`TypeRegistry`]: tellus_model::TypeRegistry

mod decoder;
mod encoder;

pub use decoder::JsonDecoder;
pub use encoder::{Encoder, JsonEncoder};
