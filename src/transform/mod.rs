//! Transforms applied to JSON objects between read and write

mod field_dropper;

pub use field_dropper::FieldDropper;
