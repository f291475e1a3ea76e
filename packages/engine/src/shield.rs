//! Protected-phrase shield
//!
//! The generic gender pass is a blanket, word-pattern rewrite with no
//! knowledge of sentence structure. Fixed legal terms ("שכר טרחה",
//! "ייפוי כוח מתמשך") would be corrupted by it, so they are swapped out for
//! opaque tokens before the pass and swapped back afterwards.
//!
//! # Tokens
//!
//! A token is built entirely from Unicode private-use codepoints:
//!
//! ```text
//! OPEN  digit digit …  CLOSE
//! base  base+2+d       base+1
//! ```
//!
//! Private-use characters are neither letters nor digits, so word-boundary
//! rules treat a token like punctuation and never match inside it. Every
//! [`PhraseSet::protect`] call picks its own namespace (a block of
//! [`SHIELD_NAMESPACE_SIZE`] codepoints) that shares no character with the
//! input text, so the restore step can never confuse a token with source text
//! and concurrent calls never share a table.

use regex::Regex;

use crate::config::{MAX_SHIELD_NAMESPACES, PRIVATE_USE_START, SHIELD_NAMESPACE_SIZE};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{EngineError, Result};

/// A phrase that must survive gender rewriting verbatim.
#[derive(Debug, Clone)]
pub struct ProtectedPhrase {
    label: String,
    pattern: Regex,
}

impl ProtectedPhrase {
    /// Protect an exact literal phrase.
    pub fn literal(phrase: &str) -> Result<Self> {
        Self::build(phrase.to_string(), &regex::escape(phrase))
    }

    /// Protect every match of a regex.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Self::build(pattern.to_string(), pattern)
    }

    fn build(label: String, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { label, pattern })
    }

    /// The phrase text (or pattern source) this entry protects.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered list of protected phrases.
///
/// Literal phrases are kept longest first so that a short phrase never shields
/// part of a longer one ("ייפוי כוח" inside "ייפוי כוח מתמשך"). Regex phrases
/// follow in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct PhraseSet {
    literals: Vec<ProtectedPhrase>,
    patterns: Vec<ProtectedPhrase>,
}

impl PhraseSet {
    /// Create an empty phrase set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from literal phrases.
    pub fn from_literals<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for phrase in phrases {
            set.add_literal(phrase.as_ref())?;
        }
        Ok(set)
    }

    /// Add a literal phrase, keeping literals longest first.
    ///
    /// Empty and duplicate phrases are ignored.
    pub fn add_literal(&mut self, phrase: &str) -> Result<()> {
        if phrase.is_empty() || self.literals.iter().any(|p| p.label == phrase) {
            return Ok(());
        }
        let entry = ProtectedPhrase::literal(phrase)?;
        let len = phrase.chars().count();
        // Stable: equal-length phrases keep insertion order
        let position = self
            .literals
            .iter()
            .position(|p| p.label.chars().count() < len)
            .unwrap_or(self.literals.len());
        self.literals.insert(position, entry);
        Ok(())
    }

    /// Add a regex phrase after all previously added ones.
    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        self.patterns.push(ProtectedPhrase::pattern(pattern)?);
        Ok(())
    }

    /// Builder-style [`Self::add_literal`].
    pub fn with_literal(mut self, phrase: &str) -> Result<Self> {
        self.add_literal(phrase)?;
        Ok(self)
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &PhraseSet) {
        for literal in &other.literals {
            if !self.literals.iter().any(|p| p.label == literal.label) {
                let len = literal.label.chars().count();
                let position = self
                    .literals
                    .iter()
                    .position(|p| p.label.chars().count() < len)
                    .unwrap_or(self.literals.len());
                self.literals.insert(position, literal.clone());
            }
        }
        self.patterns.extend(other.patterns.iter().cloned());
    }

    /// All phrases in application order.
    pub fn iter(&self) -> impl Iterator<Item = &ProtectedPhrase> {
        self.literals.iter().chain(self.patterns.iter())
    }

    /// Number of phrases.
    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    /// Check if the set has no phrases.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every protected phrase with a private token.
    pub fn protect(&self, text: &str) -> Shielded {
        if self.is_empty() {
            return Shielded::passthrough(text);
        }

        let Some(namespace) = TokenNamespace::disjoint_from(text) else {
            let unprotected: Vec<String> = self
                .iter()
                .filter(|phrase| phrase.pattern.is_match(text))
                .map(|phrase| phrase.label.clone())
                .collect();
            tracing::warn!(
                attempts = MAX_SHIELD_NAMESPACES,
                phrases = unprotected.len(),
                "No free shield namespace, text left unshielded"
            );
            return Shielded {
                text: text.to_string(),
                table: PhraseTable {
                    unprotected,
                    ..PhraseTable::default()
                },
            };
        };

        let mut table = PhraseTable {
            namespace,
            entries: Vec::new(),
            unprotected: Vec::new(),
        };
        let mut shielded = text.to_string();

        for phrase in self.iter() {
            if !phrase.pattern.is_match(&shielded) {
                continue;
            }
            let replaced = phrase
                .pattern
                .replace_all(&shielded, |caps: &regex::Captures<'_>| {
                    let original = caps[0].to_string();
                    // Zero-width matches have nothing to protect; matches that
                    // overlap an earlier token are already protected
                    if original.is_empty()
                        || original.chars().any(|c| table.namespace.contains(c))
                    {
                        return original;
                    }
                    let token = table.namespace.token(table.entries.len());
                    table.entries.push(original);
                    token
                })
                .into_owned();
            shielded = replaced;
        }

        tracing::debug!(
            phrases = table.entries.len(),
            namespace = table.namespace.index,
            "Text shielded"
        );
        Shielded {
            text: shielded,
            table,
        }
    }
}

/// Text with protected phrases replaced by tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shielded {
    /// Text safe to rewrite
    pub text: String,
    /// Table needed to restore the original phrases
    pub table: PhraseTable,
}

impl Shielded {
    fn passthrough(text: &str) -> Self {
        Self {
            text: text.to_string(),
            table: PhraseTable::default(),
        }
    }
}

/// One call's private codepoint block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenNamespace {
    index: u32,
}

impl TokenNamespace {
    fn base(&self) -> u32 {
        PRIVATE_USE_START + self.index * SHIELD_NAMESPACE_SIZE
    }

    fn char_at(&self, offset: u32) -> char {
        // The namespace range lies inside the BMP private-use area, which has
        // no surrogates, so this conversion always succeeds
        char::from_u32(self.base() + offset).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn open(&self) -> char {
        self.char_at(0)
    }

    fn close(&self) -> char {
        self.char_at(1)
    }

    fn digit(&self, d: u32) -> char {
        self.char_at(2 + d)
    }

    fn digit_value(&self, c: char) -> Option<usize> {
        let offset = (c as u32).checked_sub(self.base() + 2)?;
        (offset < 10).then_some(offset as usize)
    }

    fn contains(&self, c: char) -> bool {
        let code = c as u32;
        code >= self.base() && code < self.base() + SHIELD_NAMESPACE_SIZE
    }

    /// First namespace sharing no character with `text`.
    fn disjoint_from(text: &str) -> Option<Self> {
        for index in 0..MAX_SHIELD_NAMESPACES {
            let candidate = TokenNamespace { index };
            if !text.chars().any(|c| candidate.contains(c)) {
                if index > 0 {
                    tracing::debug!(namespace = index, "Shield namespace collision, regenerated");
                }
                return Some(candidate);
            }
        }
        None
    }

    fn token(&self, entry: usize) -> String {
        let mut token = String::new();
        token.push(self.open());
        for d in entry.to_string().chars() {
            token.push(self.digit(d.to_digit(10).unwrap_or(0)));
        }
        token.push(self.close());
        token
    }
}

/// Original phrases keyed by token number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhraseTable {
    namespace: TokenNamespace,
    entries: Vec<String>,
    /// Phrases present in the text that could not be shielded
    unprotected: Vec<String>,
}

/// Restored text plus anything that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Restored {
    /// Text with every surviving token replaced by its phrase
    pub text: String,
    /// Phrases whose tokens were destroyed by rewriting
    pub diagnostics: Diagnostics,
}

impl PhraseTable {
    /// Number of protected occurrences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was protected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore protected phrases.
    ///
    /// Every token is replaced by its original text. Malformed token fragments
    /// are removed, so no namespace character survives in the output.
    /// Phrases that were left unshielded are reported.
    pub fn restore(&self, text: &str) -> Restored {
        let mut diagnostics = Diagnostics::new();
        for phrase in &self.unprotected {
            diagnostics.push(Diagnostic::PhraseUnprotected {
                phrase: phrase.clone(),
            });
        }
        if self.entries.is_empty() {
            return Restored {
                text: text.to_string(),
                diagnostics,
            };
        }

        let ns = self.namespace;
        let mut out = String::with_capacity(text.len());
        let mut seen = vec![false; self.entries.len()];
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if !ns.contains(c) {
                out.push(c);
                continue;
            }
            if c != ns.open() {
                // Stray fragment of a damaged token
                continue;
            }
            let mut number: Option<usize> = None;
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                if let Some(d) = ns.digit_value(next) {
                    number = Some(number.unwrap_or(0).saturating_mul(10).saturating_add(d));
                    chars.next();
                } else if next == ns.close() {
                    chars.next();
                    closed = true;
                    break;
                } else {
                    break;
                }
            }
            match (closed, number.and_then(|n| self.entries.get(n).map(|e| (n, e)))) {
                (true, Some((n, phrase))) => {
                    out.push_str(phrase);
                    seen[n] = true;
                }
                _ => tracing::warn!("Damaged shield token dropped"),
            }
        }

        for (n, restored) in seen.iter().enumerate() {
            if !restored {
                diagnostics.push(Diagnostic::ShieldTokenLost {
                    phrase: self.entries[n].clone(),
                });
            }
        }

        Restored {
            text: out,
            diagnostics,
        }
    }
}

/// Protect `text` with the given phrases.
pub fn protect(text: &str, phrases: &PhraseSet) -> Shielded {
    phrases.protect(text)
}

/// Restore the phrases recorded in `table`.
pub fn unprotect(text: &str, table: &PhraseTable) -> String {
    table.restore(text).text
}
