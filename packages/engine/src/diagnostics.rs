//! Non-fatal diagnostics
//!
//! Nothing in the drafting pipeline aborts document generation: the live
//! preview must always render something. Conditions that the text output
//! silently absorbs (stripped placeholders, dropped sections, unknown
//! profiles) are collected here so tests, logs and catalog authors can see
//! them.

use serde::Serialize;
use std::fmt;

use crate::sections::SectionLevel;

/// A single non-fatal condition observed during resolution or assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `{{…}}` construct that was stripped from the output
    UnresolvedPlaceholder { tag: String },

    /// An opening or closing block tag without its counterpart
    UnbalancedBlock { tag: String },

    /// A profile name that was normalized to male forms
    UnknownGenderProfile { value: String },

    /// A shield token that a rewrite rule destroyed
    ShieldTokenLost { phrase: String },

    /// A protected phrase left unshielded because no token namespace was free
    PhraseUnprotected { phrase: String },

    /// A section whose parent does not exist one level up
    OrphanedSection {
        id: String,
        level: SectionLevel,
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
    },

    /// A section id used by more than one record
    DuplicateSectionId { id: String },

    /// A section that resolved to no text and was left unnumbered
    SkippedEmptySection { id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedPlaceholder { tag } => {
                write!(f, "Unresolved placeholder '{tag}' was removed")
            }
            Diagnostic::UnbalancedBlock { tag } => write!(f, "Unbalanced block tag '{tag}'"),
            Diagnostic::UnknownGenderProfile { value } => {
                write!(f, "Unknown gender profile '{value}', male forms used")
            }
            Diagnostic::ShieldTokenLost { phrase } => {
                write!(f, "Protected phrase '{phrase}' was lost during rewriting")
            }
            Diagnostic::PhraseUnprotected { phrase } => {
                write!(f, "Protected phrase '{phrase}' could not be shielded")
            }
            Diagnostic::OrphanedSection {
                id,
                level,
                parent_id,
            } => match parent_id {
                Some(parent) => write!(
                    f,
                    "Orphaned {level} section '{id}': parent '{parent}' not found"
                ),
                None => write!(f, "Orphaned {level} section '{id}': no parent given"),
            },
            Diagnostic::DuplicateSectionId { id } => write!(f, "Duplicate section id '{id}'"),
            Diagnostic::SkippedEmptySection { id } => {
                write!(f, "Section '{id}' resolved to empty text and was skipped")
            }
        }
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "Diagnostic recorded");
        self.0.push(diagnostic);
    }

    /// Append all diagnostics from another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in recording order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Ids of orphaned section records, in recording order.
    pub fn orphaned_ids(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|d| match d {
                Diagnostic::OrphanedSection { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of orphaned section records.
    pub fn orphan_count(&self) -> usize {
        self.orphaned_ids().len()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
