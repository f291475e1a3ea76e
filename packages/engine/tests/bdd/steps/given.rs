//! Given step definitions
//!
//! Steps that set up the initial state for scenarios.

use cucumber::{gherkin::Step, given};
use nusach_engine::{GenderForms, GenderRule};

use crate::helpers::value_conversion::{parse_section_records, parse_table_to_context, unescape};
use crate::world::DraftingWorld;

// =============================================================================
// Template steps
// =============================================================================

#[given("the following form data:")]
fn set_form_data(world: &mut DraftingWorld, step: &Step) {
    if let Some(table) = &step.table {
        world.context = parse_table_to_context(table);
    }
}

#[given(expr = "the template {string}")]
fn set_template(world: &mut DraftingWorld, template: String) {
    world.template = unescape(&template);
}

// =============================================================================
// Gender steps
// =============================================================================

#[given(expr = "the gender profile {string}")]
fn set_profile(world: &mut DraftingWorld, profile: String) {
    world.profile = profile;
}

#[given(expr = "a {string} document")]
fn set_document_kind(world: &mut DraftingWorld, kind: String) {
    world.kind = kind
        .parse()
        .unwrap_or_else(|e| panic!("Invalid document kind: {e}"));
}

#[given(expr = "a generic rule rewriting {string} as {string}, {string} and {string}")]
fn add_generic_rule(
    world: &mut DraftingWorld,
    word: String,
    female: String,
    plural: String,
    organization: String,
) {
    let forms = GenderForms::new(&word, &female, &plural).with_organization(&organization);
    let rule = GenderRule::word(&word, forms).expect("Invalid generic rule");
    world
        .extra_rules
        .push_rule(rule)
        .expect("Generic rule conflicts with earlier rules");
}

// =============================================================================
// Section steps
// =============================================================================

#[given("the following sections:")]
fn set_sections(world: &mut DraftingWorld, step: &Step) {
    if let Some(table) = &step.table {
        world.records = parse_section_records(table);
    }
}

#[given(expr = "numbering starts at {int}")]
fn set_start_at(world: &mut DraftingWorld, start_at: u32) {
    world.start_at = start_at;
}
