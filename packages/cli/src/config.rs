//! Output defaults for the CLI.

/// Column at which assembled paragraphs are wrapped in text output.
pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// Narrowest accepted `--width`; anything below cannot fit a paragraph number.
pub const MIN_WRAP_WIDTH: usize = 20;
