//! Configuration constants for the Nusach engine
//!
//! Centralized limits and tunables used throughout the engine for:
//! - Shield token namespaces (private-use codepoint blocks)
//! - Bounded fixpoint loops (corrective pass)
//! - Template nesting depth (prevent stack overflow on hostile input)
//! - Hebrew morphology used by word rules
//! - Input size limits for loaded files
//!
//! The interactive form layer may re-run the whole pipeline on every
//! keystroke, so every loop here is bounded and every pass is linear in the
//! text length.

/// First codepoint of the Basic Multilingual Plane private-use area.
pub const PRIVATE_USE_START: u32 = 0xE000;

/// Number of codepoints reserved per shield token namespace.
///
/// Slot 0 opens a token, slot 1 closes it, slots 2..12 encode decimal digits.
/// The remaining slots are unused but still reserved, so a text that happens
/// to contain any of them forces a different namespace.
pub const SHIELD_NAMESPACE_SIZE: u32 = 0x100;

/// Number of candidate shield namespaces tried before giving up.
///
/// 25 blocks fit in the BMP private-use area (U+E000..U+F8FF). Legal prose
/// never contains private-use characters, so the first block is almost always
/// free.
pub const MAX_SHIELD_NAMESPACES: u32 = 25;

/// Upper bound on corrective-pass repetitions.
///
/// Corrections are applied until nothing changes. A well-formed table reaches
/// its fixpoint in one or two passes.
pub const MAX_CORRECTION_PASSES: usize = 8;

/// Maximum nesting depth of `{{#if}}`/`{{#each}}` blocks.
///
/// Deeper opening tags are treated as unbalanced and stripped.
pub const MAX_BLOCK_DEPTH: usize = 32;

/// Hebrew letters that attach to the front of a word
/// (ו ה ב ל כ מ ש: and, the, in, to, as, from, that).
pub const HEBREW_PREFIX_LETTERS: &str = "ובהלכמש";

/// Maximum number of attached prefix letters a word rule tolerates
/// (e.g. "וה" in "והמצהיר").
pub const MAX_ATTACHED_PREFIXES: usize = 2;

/// Maximum size of a loaded input file (rule table, records, context) in bytes.
///
/// Protects against YAML bombs and runaway inputs.
pub const MAX_INPUT_SIZE: usize = 1_000_000;

/// Maximum number of entries in a rule table or section record list.
pub const MAX_ENTRIES: usize = 10_000;

/// Default number of the first top-level section.
pub const DEFAULT_START_NUMBER: u32 = 1;

/// Separator used when a list variable is substituted as plain text.
pub const LIST_SEPARATOR: &str = ", ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_reasonable() {
        // Namespaces must stay inside the BMP private-use area
        let last = PRIVATE_USE_START + MAX_SHIELD_NAMESPACES * SHIELD_NAMESPACE_SIZE;
        assert!(last <= 0xF900, "Namespaces overflow the private-use area");
        assert!(SHIELD_NAMESPACE_SIZE >= 12, "Need room for open, close and 10 digits");

        assert!(MAX_CORRECTION_PASSES >= 2, "Need at least one confirming pass");
        assert!(MAX_CORRECTION_PASSES <= 64, "Should bound correction loops");

        assert!(MAX_BLOCK_DEPTH >= 4, "Should allow realistic nesting");
        assert!(MAX_BLOCK_DEPTH <= 256, "Should limit extreme nesting");

        assert!(MAX_INPUT_SIZE >= 100_000, "Should allow at least 100KB");
        assert!(MAX_INPUT_SIZE <= 10_000_000, "Should not allow 10MB+");
        assert!(MAX_ENTRIES >= 1_000, "Should allow large catalogs");

        assert_eq!(HEBREW_PREFIX_LETTERS.chars().count(), 7);
        assert!(MAX_ATTACHED_PREFIXES <= 3, "Longer prefix runs are not Hebrew");
        assert!(DEFAULT_START_NUMBER >= 1);
    }
}
