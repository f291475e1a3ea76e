//! Then step definitions
//!
//! Steps that verify outcomes and assertions.

use cucumber::{gherkin::Step, then};
use nusach_engine::{contains_placeholder, Diagnostic};

use crate::helpers::value_conversion::unescape;
use crate::world::DraftingWorld;

// =============================================================================
// Text output steps
// =============================================================================

#[then(expr = "the output is {string}")]
fn assert_output(world: &mut DraftingWorld, expected: String) {
    assert_eq!(world.output(), unescape(&expected));
}

#[then(expr = "the output contains {string}")]
fn assert_output_contains(world: &mut DraftingWorld, expected: String) {
    let output = world.output();
    assert!(
        output.contains(&unescape(&expected)),
        "Expected {output:?} to contain {expected:?}"
    );
}

#[then(expr = "the output does not contain {string}")]
fn assert_output_not_contains(world: &mut DraftingWorld, unexpected: String) {
    let output = world.output();
    assert!(
        !output.contains(&unescape(&unexpected)),
        "Expected {output:?} not to contain {unexpected:?}"
    );
}

#[then("the output has no placeholders")]
fn assert_no_placeholders(world: &mut DraftingWorld) {
    let output = world.output();
    assert!(!contains_placeholder(output), "Leaked placeholder in {output:?}");
}

// =============================================================================
// Diagnostic steps
// =============================================================================

#[then("no diagnostics are reported")]
fn assert_no_diagnostics(world: &mut DraftingWorld) {
    assert!(
        world.diagnostics.is_empty(),
        "Expected no diagnostics, got {:?}",
        world.diagnostics
    );
}

#[then(expr = "the placeholder {string} is reported as unresolved")]
fn assert_unresolved(world: &mut DraftingWorld, tag: String) {
    assert!(
        world.has_diagnostic(
            |d| matches!(d, Diagnostic::UnresolvedPlaceholder { tag: t } if *t == tag)
        ),
        "Expected unresolved placeholder '{tag}', got {:?}",
        world.diagnostics
    );
}

#[then(expr = "the gender profile {string} is reported as unknown")]
fn assert_unknown_profile(world: &mut DraftingWorld, value: String) {
    assert!(
        world.has_diagnostic(
            |d| matches!(d, Diagnostic::UnknownGenderProfile { value: v } if *v == value)
        ),
        "Expected unknown profile '{value}', got {:?}",
        world.diagnostics
    );
}

#[then(regex = r"^(\d+) orphaned sections? (?:is|are) reported$")]
fn assert_orphan_count(world: &mut DraftingWorld, count: usize) {
    assert_eq!(
        world.diagnostics.orphan_count(),
        count,
        "Diagnostics: {:?}",
        world.diagnostics
    );
}

#[then(expr = "section {string} is reported as orphaned")]
fn assert_orphaned(world: &mut DraftingWorld, id: String) {
    let orphans = world.diagnostics.orphaned_ids();
    assert!(
        orphans.contains(&id.as_str()),
        "Expected '{id}' among orphans {orphans:?}"
    );
}

// =============================================================================
// Document steps
// =============================================================================

#[then("the paragraphs are:")]
fn assert_paragraphs(world: &mut DraftingWorld, step: &Step) {
    let table = step.table.as_ref().expect("Step needs a table");
    let expected: Vec<(String, String)> = table
        .rows
        .iter()
        .skip(1)
        .map(|row| (row[0].trim().to_string(), row[1].trim().to_string()))
        .collect();
    let actual: Vec<(String, String)> = world
        .stream()
        .iter()
        .map(|p| (p.number.clone(), p.section_id.clone()))
        .collect();
    assert_eq!(actual, expected);
}

#[then(expr = "paragraph {string} reads {string}")]
fn assert_paragraph_text(world: &mut DraftingWorld, number: String, expected: String) {
    let paragraph = world
        .stream()
        .iter()
        .find(|p| p.number == number)
        .unwrap_or_else(|| panic!("No paragraph numbered {number}"));
    assert_eq!(paragraph.text, unescape(&expected));
}

#[then(regex = r"^the top-level sections are ordered (.+)$")]
fn assert_top_level_order(world: &mut DraftingWorld, ids: String) {
    let built = world.built.as_ref().expect("No outline built");
    let actual: Vec<&str> = built.tree.iter().map(|n| n.id.as_str()).collect();
    let expected: Vec<&str> = ids.split(',').map(str::trim).collect();
    assert_eq!(actual, expected);
}
