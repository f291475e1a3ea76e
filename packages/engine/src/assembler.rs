//! Document assembler
//!
//! Walks a [`SectionTree`], renders every title and body through the template
//! resolver and the gender engine, and numbers what is left:
//!
//! ```text
//! 1. title
//!    body
//! 1.1. sub title
//! 1.1.1. sub-sub title
//! 2. …
//! ```
//!
//! Numbers are assigned after conditional and empty sections have been
//! dropped, so every sibling group is gapless. The first top-level number is a
//! caller option: documents whose section 1 is a fixed lead section start the
//! catalog sections at 2.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::DEFAULT_START_NUMBER;
use crate::context::VariableContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::gender::GenderEngine;
use crate::sections::{SectionNode, SectionTree};
use crate::template::{resolve_with_diagnostics, sweep_placeholders};
use crate::types::GenderProfile;

/// Profiles for sections whose parties differ in gender.
///
/// Body profile: section override, then actor profile, then `default`.
/// Title profile: `titles` when set, otherwise the body profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionProfiles {
    pub default: GenderProfile,
    pub titles: Option<GenderProfile>,
    pub actors: HashMap<String, GenderProfile>,
    pub sections: HashMap<String, GenderProfile>,
}

impl SectionProfiles {
    /// Profiles with a document-wide default.
    pub fn new(default: GenderProfile) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// Use one profile for every title.
    pub fn with_title_profile(mut self, profile: GenderProfile) -> Self {
        self.titles = Some(profile);
        self
    }

    /// Profile for sections tagged with an actor.
    pub fn with_actor(mut self, actor: impl Into<String>, profile: GenderProfile) -> Self {
        self.actors.insert(actor.into(), profile);
        self
    }

    /// Profile for one section id.
    pub fn with_section(mut self, id: impl Into<String>, profile: GenderProfile) -> Self {
        self.sections.insert(id.into(), profile);
        self
    }
}

/// How gender profiles are chosen per section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAssignment {
    /// Same profile for every title and body
    Uniform(GenderProfile),
    /// Profiles chosen per section, actor and role
    PerSection(SectionProfiles),
}

impl Default for ProfileAssignment {
    fn default() -> Self {
        ProfileAssignment::Uniform(GenderProfile::default())
    }
}

impl From<GenderProfile> for ProfileAssignment {
    fn from(profile: GenderProfile) -> Self {
        ProfileAssignment::Uniform(profile)
    }
}

impl From<SectionProfiles> for ProfileAssignment {
    fn from(profiles: SectionProfiles) -> Self {
        ProfileAssignment::PerSection(profiles)
    }
}

impl ProfileAssignment {
    /// Profile for a section's body.
    pub fn body_profile(&self, node: &SectionNode) -> GenderProfile {
        match self {
            ProfileAssignment::Uniform(profile) => *profile,
            ProfileAssignment::PerSection(p) => p
                .sections
                .get(&node.id)
                .or_else(|| node.actor.as_ref().and_then(|a| p.actors.get(a)))
                .copied()
                .unwrap_or(p.default),
        }
    }

    /// Profile for a section's title.
    pub fn title_profile(&self, node: &SectionNode) -> GenderProfile {
        match self {
            ProfileAssignment::Uniform(profile) => *profile,
            ProfileAssignment::PerSection(p) => {
                p.titles.unwrap_or_else(|| self.body_profile(node))
            }
        }
    }
}

/// Assembly options supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Number of the first top-level section
    pub start_at: u32,
    pub profiles: ProfileAssignment,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            start_at: DEFAULT_START_NUMBER,
            profiles: ProfileAssignment::default(),
        }
    }
}

impl AssemblyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the first top-level section; 0 is raised to 1.
    pub fn with_start_at(mut self, start_at: u32) -> Self {
        self.start_at = start_at.max(1);
        self
    }

    pub fn with_profiles(mut self, profiles: impl Into<ProfileAssignment>) -> Self {
        self.profiles = profiles.into();
        self
    }
}

/// One numbered paragraph of the assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// Dotted number, e.g. `2.1.3`
    pub number: String,
    /// 0 for main sections
    pub depth: usize,
    /// Title and body composed into one paragraph
    pub text: String,
    pub title: String,
    pub body: String,
    pub section_id: String,
}

impl Paragraph {
    fn compose(title: &str, body: &str) -> String {
        match (title.is_empty(), body.is_empty()) {
            (true, _) => body.to_string(),
            (false, true) => title.to_string(),
            (false, false) if title == body => title.to_string(),
            (false, false) => format!("{title}\n{body}"),
        }
    }
}

/// Assembled document handed to the exporter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParagraphStream {
    pub paragraphs: Vec<Paragraph>,
    pub diagnostics: Diagnostics,
}

impl ParagraphStream {
    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraphs in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, Paragraph> {
        self.paragraphs.iter()
    }

    /// Paragraph numbers in document order.
    pub fn numbers(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.number.as_str()).collect()
    }

    /// Plain-text rendering, one `"{number}. {text}"` block per paragraph.
    pub fn to_plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| format!("{}. {}", p.number, p.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single rendered text plus everything that was stripped or lost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// Resolve a template and gender it for a simple, unsectioned document.
///
/// # Example
///
/// ```
/// use nusach_engine::{render_document, GenderEngine, GenderProfile, VariableContext};
///
/// let engine = GenderEngine::hebrew_default();
/// let ctx = VariableContext::new().with("name", "דנה");
/// let rendered = render_document(
///     "אני {{name}} {{gender:מצהיר|מצהירה|מצהירים}} כי",
///     &ctx,
///     &engine,
///     GenderProfile::Female,
/// );
/// assert_eq!(rendered.text, "אני דנה מצהירה כי");
/// ```
pub fn render_document(
    template: &str,
    ctx: &VariableContext,
    engine: &GenderEngine,
    profile: GenderProfile,
) -> Rendered {
    let mut diagnostics = Diagnostics::new();
    let text = render_text(template, ctx, engine, profile, &mut diagnostics);
    Rendered { text, diagnostics }
}

fn render_text(
    template: &str,
    ctx: &VariableContext,
    engine: &GenderEngine,
    profile: GenderProfile,
    diagnostics: &mut Diagnostics,
) -> String {
    let resolution = resolve_with_diagnostics(template, ctx);
    diagnostics.extend(resolution.diagnostics);
    let rewritten = engine.apply_with_diagnostics(&resolution.text, profile);
    diagnostics.extend(rewritten.diagnostics);
    // Marker expansion can expose braces that wrapped a marker
    sweep_placeholders(&rewritten.text, false, diagnostics)
}

/// Renders and numbers a section tree.
#[derive(Debug, Clone)]
pub struct DocumentAssembler<'e> {
    engine: &'e GenderEngine,
    options: AssemblyOptions,
}

impl<'e> DocumentAssembler<'e> {
    /// Create an assembler with default options.
    pub fn new(engine: &'e GenderEngine) -> Self {
        Self {
            engine,
            options: AssemblyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Render and number every emitted section.
    pub fn assemble(&self, tree: &SectionTree, ctx: &VariableContext) -> ParagraphStream {
        let mut stream = ParagraphStream::default();
        self.emit(
            &tree.sections,
            "",
            u64::from(self.options.start_at.max(1)),
            ctx,
            &mut stream.paragraphs,
            &mut stream.diagnostics,
        );
        tracing::debug!(
            paragraphs = stream.len(),
            diagnostics = stream.diagnostics.len(),
            "Assembled document"
        );
        stream
    }

    /// Emit one sibling group, numbering from `start`.
    fn emit(
        &self,
        nodes: &[SectionNode],
        prefix: &str,
        start: u64,
        ctx: &VariableContext,
        out: &mut Vec<Paragraph>,
        diagnostics: &mut Diagnostics,
    ) {
        // u64 so that a u32 offset plus any sibling count cannot overflow
        let mut next = start;
        for node in nodes {
            if let Some(condition) = &node.condition {
                if !ctx.is_truthy(condition) {
                    tracing::debug!(
                        id = %node.id,
                        condition = %condition,
                        "Section condition not met"
                    );
                    continue;
                }
            }

            let profiles = &self.options.profiles;
            let title = render_text(
                &node.title,
                ctx,
                self.engine,
                profiles.title_profile(node),
                diagnostics,
            );
            let title = title.trim().to_string();
            // A leaf without content shows its title once, in the title profile
            let body = if node.body_is_title() {
                title.clone()
            } else {
                render_text(
                    &node.body,
                    ctx,
                    self.engine,
                    profiles.body_profile(node),
                    diagnostics,
                )
                .trim()
                .to_string()
            };

            let number = if prefix.is_empty() {
                next.to_string()
            } else {
                format!("{prefix}.{next}")
            };

            let mut children = Vec::new();
            self.emit(&node.children, &number, 1, ctx, &mut children, diagnostics);

            if title.is_empty() && body.is_empty() && children.is_empty() {
                diagnostics.push(Diagnostic::SkippedEmptySection {
                    id: node.id.clone(),
                });
                continue;
            }

            out.push(Paragraph {
                number,
                depth: node.level.depth(),
                text: Paragraph::compose(&title, &body),
                title,
                body,
                section_id: node.id.clone(),
            });
            out.append(&mut children);
            next += 1;
        }
    }
}
