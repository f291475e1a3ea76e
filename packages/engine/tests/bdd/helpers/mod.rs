//! Helpers shared by the step definitions.

pub mod value_conversion;
