//! World struct for Cucumber BDD tests
//!
//! Holds the inputs and outputs of one drafting scenario.

use cucumber::World;
use nusach_engine::{
    build_tree, render_document, AssemblyOptions, BuiltTree, Diagnostic, Diagnostics,
    DocumentAssembler, DocumentKind, GenderEngine, GenderProfile, ParagraphStream, RuleTable,
    SectionRecord, VariableContext,
};
use std::fmt;

/// Test world that holds state across steps in a Cucumber scenario.
#[derive(World)]
#[world(init = Self::new)]
pub struct DraftingWorld {
    /// Form data for template resolution
    pub context: VariableContext,
    /// Template under test
    pub template: String,
    /// Profile name as written in the scenario
    pub profile: String,
    /// Document kind selecting the protected phrases
    pub kind: DocumentKind,
    /// Rules appended after the built-in table
    pub extra_rules: RuleTable,
    /// Section catalog rows
    pub records: Vec<SectionRecord>,
    /// First top-level number
    pub start_at: u32,
    /// Last text output
    pub output: Option<String>,
    /// Diagnostics of the last operation
    pub diagnostics: Diagnostics,
    /// Last built outline
    pub built: Option<BuiltTree>,
    /// Last assembled document
    pub stream: Option<ParagraphStream>,
}

impl fmt::Debug for DraftingWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftingWorld")
            .field("template", &self.template)
            .field("profile", &self.profile)
            .field("kind", &self.kind)
            .field("records", &self.records.len())
            .field("start_at", &self.start_at)
            .field("output", &self.output)
            .field("diagnostics", &self.diagnostics)
            .field(
                "extra_rules",
                &format!("<{} rules>", self.extra_rules.len()),
            )
            .finish()
    }
}

impl Default for DraftingWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftingWorld {
    /// Create an empty world for a male, general document.
    pub fn new() -> Self {
        Self {
            context: VariableContext::new(),
            template: String::new(),
            profile: GenderProfile::Male.as_str().to_string(),
            kind: DocumentKind::General,
            extra_rules: RuleTable::new(),
            records: Vec::new(),
            start_at: 1,
            output: None,
            diagnostics: Diagnostics::new(),
            built: None,
            stream: None,
        }
    }

    /// The engine configured by the scenario.
    pub fn engine(&self) -> GenderEngine {
        GenderEngine::for_document(self.kind)
            .with_extra_rules(self.extra_rules.clone())
            .expect("Extra rules conflict with the built-in table")
    }

    /// The profile, normalized.
    pub fn gender_profile(&self) -> GenderProfile {
        GenderProfile::from_name(&self.profile)
    }

    /// Gender the template with the named profile.
    pub fn apply_gender(&mut self) {
        let rewritten = self.engine().apply_named(&self.template, &self.profile);
        self.output = Some(rewritten.text);
        self.diagnostics = rewritten.diagnostics;
    }

    /// Resolve and gender the template.
    pub fn render(&mut self) {
        let rendered = render_document(
            &self.template,
            &self.context,
            &self.engine(),
            self.gender_profile(),
        );
        self.output = Some(rendered.text);
        self.diagnostics = rendered.diagnostics;
    }

    /// Build the outline and assemble the numbered document.
    pub fn assemble(&mut self) {
        let built = build_tree(&self.records);
        let engine = self.engine();
        let stream = DocumentAssembler::new(&engine)
            .with_options(
                AssemblyOptions::new()
                    .with_start_at(self.start_at)
                    .with_profiles(self.gender_profile()),
            )
            .assemble(&built.tree, &self.context);

        let mut diagnostics = built.diagnostics.clone();
        diagnostics.extend(stream.diagnostics.clone());
        self.diagnostics = diagnostics;
        self.built = Some(built);
        self.stream = Some(stream);
    }

    /// Get the text output, panicking when no step produced one.
    pub fn output(&self) -> &str {
        self.output
            .as_deref()
            .expect("No output - run a When step first")
    }

    /// Get the assembled document.
    pub fn stream(&self) -> &ParagraphStream {
        self.stream
            .as_ref()
            .expect("No document - run 'the document is assembled' first")
    }

    /// Check whether a diagnostic matching `pred` was reported.
    pub fn has_diagnostic(&self, pred: impl Fn(&Diagnostic) -> bool) -> bool {
        self.diagnostics.iter().any(pred)
    }
}
