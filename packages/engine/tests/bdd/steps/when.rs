//! When step definitions
//!
//! Steps that run the drafting pipeline.

use cucumber::when;
use nusach_engine::resolve_with_diagnostics;

use crate::world::DraftingWorld;

#[when("the template is resolved")]
fn resolve_template(world: &mut DraftingWorld) {
    let resolution = resolve_with_diagnostics(&world.template, &world.context);
    world.output = Some(resolution.text);
    world.diagnostics = resolution.diagnostics;
}

#[when("gender agreement is applied")]
fn apply_gender(world: &mut DraftingWorld) {
    world.apply_gender();
}

#[when("the template is rendered")]
fn render_template(world: &mut DraftingWorld) {
    world.render();
}

#[when("the document is assembled")]
fn assemble_document(world: &mut DraftingWorld) {
    world.assemble();
}
