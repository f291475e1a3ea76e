//! Nusach Engine
//!
//! The drafting core behind Nusach's legal document forms.
//! This library provides functionality for:
//! - Resolving catalog templates (`{{name}}`, `{{#if}}`, `{{#each}}`) against
//!   form data
//! - Rewriting Hebrew legal prose to agree with a grammatical gender profile,
//!   without touching protected terms of art
//! - Building numbered outlines from flat section catalogs
//!
//! Text operations never fail. Anything they strip, drop or cannot restore is
//! reported through [`Diagnostics`].
//!
//! # Example
//!
//! ```
//! use nusach_engine::{
//!     build_tree, DocumentAssembler, GenderEngine, GenderProfile, AssemblyOptions,
//!     SectionRecord, VariableContext,
//! };
//!
//! let records = vec![
//!     SectionRecord::main("scope", 1.0).with_title("היקף השירות"),
//!     SectionRecord::main("fee", 2.0)
//!         .with_title("שכר טרחה")
//!         .with_content("{{client}} {{gender:ישלם|תשלם|ישלמו}} שכר טרחה"),
//! ];
//! let built = build_tree(&records);
//!
//! let engine = GenderEngine::hebrew_default();
//! let ctx = VariableContext::new().with("client", "הלקוחה");
//! let stream = DocumentAssembler::new(&engine)
//!     .with_options(AssemblyOptions::new().with_profiles(GenderProfile::Female))
//!     .assemble(&built.tree, &ctx);
//!
//! assert_eq!(stream.numbers(), vec!["1", "2"]);
//! assert_eq!(stream.paragraphs[1].body, "הלקוחה תשלם שכר טרחה");
//! ```

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod gender;
pub mod rules;
pub mod sections;
pub mod shield;
pub mod template;
pub mod types;

// Re-export commonly used items
pub use assembler::{
    render_document, AssemblyOptions, DocumentAssembler, Paragraph, ParagraphStream,
    ProfileAssignment, Rendered, SectionProfiles,
};
pub use catalog::DocumentKind;
pub use context::{Scope, VariableContext};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{EngineError, Result};
pub use gender::{apply_gender, expand_markers, GenderEngine, Rewritten};
pub use rules::{Correction, GenderForms, GenderRule, Rule, RuleMatch, RulePhase, RuleTable};
pub use sections::{build_tree, BuiltTree, SectionLevel, SectionNode, SectionRecord, SectionTree};
pub use shield::{protect, unprotect, PhraseSet, PhraseTable, ProtectedPhrase, Restored, Shielded};
pub use template::{
    contains_placeholder, contains_unresolved_placeholder, resolve, resolve_with_diagnostics,
    Resolution,
};
pub use types::{GenderProfile, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
