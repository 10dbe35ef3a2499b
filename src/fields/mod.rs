//! Typed attribute codecs.
//!
//! Each attribute type is a [`FieldKind`] variant; a [`FieldCodec`] pairs a
//! kind with its display label and converts between the engine's text and
//! native [`FieldValue`]s. The [`UdaRegistry`] builds codecs for the
//! user-defined attributes declared in a taskrc.

mod codec;
mod registry;
mod value;

pub use codec::{
    DATE_FORMAT, FieldCodec, FieldKind, format_date, is_duration, parse_date, parse_number,
    strip_nul,
};
pub use registry::{UdaRegistry, kind_for_type};
pub use value::{Annotation, FieldValue, whole_seconds};
