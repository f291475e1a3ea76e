//! Gender agreement engine
//!
//! Rewrites resolved template text so that it agrees with a
//! [`GenderProfile`]. Three phases always run in this order:
//!
//! 1. **Marker**: `{{gender:m|f|p[|o]}}` markers are replaced by the form for
//!    the profile, then marker-phase table rules run (slash notation).
//! 2. **Generic**: protected phrases are shielded, generic table rules are
//!    applied as full-text rewrites, and the phrases are restored.
//! 3. **Corrective**: table corrections run until the text stops changing.
//!
//! Text is NFC-normalized before any rule sees it, so composed and decomposed
//! spellings of the same word are rewritten alike.

use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::DocumentKind;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::rules::{GenderForms, RulePhase, RuleTable};
use crate::shield::PhraseSet;
use crate::template::GENDER_MARKER;
use crate::types::GenderProfile;

static DEFAULT_ENGINE: LazyLock<GenderEngine> = LazyLock::new(GenderEngine::hebrew_default);

/// Gendered text plus non-fatal findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rewritten {
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// A rule table paired with the phrases it must not touch.
#[derive(Debug, Clone)]
pub struct GenderEngine {
    rules: RuleTable,
    phrases: PhraseSet,
}

impl Default for GenderEngine {
    fn default() -> Self {
        Self::hebrew_default()
    }
}

impl GenderEngine {
    /// Create an engine from a table and phrase set.
    pub fn new(rules: RuleTable, phrases: PhraseSet) -> Self {
        Self { rules, phrases }
    }

    /// Built-in Hebrew table with the common protected phrases.
    pub fn hebrew_default() -> Self {
        Self::for_document(DocumentKind::General)
    }

    /// Built-in Hebrew table with the phrases of one document kind.
    pub fn for_document(kind: DocumentKind) -> Self {
        Self::new(RuleTable::hebrew_default(), kind.phrase_set())
    }

    /// Append rules after the current table.
    ///
    /// Fails when an added rule rewrites a form another rule produces.
    pub fn with_extra_rules(mut self, rules: RuleTable) -> Result<Self> {
        self.rules.extend(rules)?;
        Ok(self)
    }

    /// Add protected phrases.
    pub fn with_extra_phrases(mut self, phrases: &PhraseSet) -> Self {
        self.phrases.merge(phrases);
        self
    }

    /// The rule table.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// The protected phrases.
    pub fn phrases(&self) -> &PhraseSet {
        &self.phrases
    }

    /// Rewrite text for a profile.
    pub fn apply(&self, text: &str, profile: GenderProfile) -> String {
        self.apply_with_diagnostics(text, profile).text
    }

    /// Rewrite text and report lost protected phrases.
    pub fn apply_with_diagnostics(&self, text: &str, profile: GenderProfile) -> Rewritten {
        let normalized: String = text.nfc().collect();

        // Phase 1
        let expanded = expand_markers(&normalized, profile);
        let expanded = self.rules.apply_phase(&expanded, RulePhase::Marker, profile);

        // Phase 2
        let shielded = self.phrases.protect(&expanded);
        let rewritten = self
            .rules
            .apply_phase(&shielded.text, RulePhase::Generic, profile);
        let restored = shielded.table.restore(&rewritten);

        // Phase 3
        let text = self.rules.apply_corrections(&restored.text, profile);

        Rewritten {
            text,
            diagnostics: restored.diagnostics,
        }
    }

    /// Rewrite text for a profile given by name.
    ///
    /// Unknown names use male forms and are reported.
    pub fn apply_named(&self, text: &str, profile: &str) -> Rewritten {
        match GenderProfile::parse(profile) {
            Some(profile) => self.apply_with_diagnostics(text, profile),
            None => {
                tracing::warn!(profile, "Unrecognized gender profile, using male forms");
                let mut rewritten = self.apply_with_diagnostics(text, GenderProfile::Male);
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(Diagnostic::UnknownGenderProfile {
                    value: profile.to_string(),
                });
                diagnostics.extend(rewritten.diagnostics);
                rewritten.diagnostics = diagnostics;
                rewritten
            }
        }
    }
}

/// Replace every gender marker with the form for `profile`.
///
/// Repeats until no marker remains; a form never contains braces, so each
/// round strictly shrinks the text.
pub fn expand_markers(text: &str, profile: GenderProfile) -> String {
    let mut current = text.to_string();
    while GENDER_MARKER.is_match(&current) {
        current = GENDER_MARKER
            .replace_all(&current, |caps: &regex::Captures<'_>| {
                let body = caps.get(1).map_or("", |m| m.as_str());
                let forms: Vec<&str> = body.split('|').collect();
                GenderForms::from_list(&forms)
                    .for_profile(profile)
                    .to_string()
            })
            .into_owned();
    }
    current
}

/// Rewrite text with the built-in Hebrew engine.
///
/// # Example
///
/// ```
/// use nusach_engine::{apply_gender, GenderProfile};
///
/// let text = "{{gender:מצווה|מצווה|מצווים}}";
/// assert_eq!(apply_gender(text, GenderProfile::Plural), "מצווים");
/// ```
pub fn apply_gender(text: &str, profile: GenderProfile) -> String {
    DEFAULT_ENGINE.apply(text, profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Correction, GenderRule};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marker_selects_form() {
        let text = "{{gender:מצווה|מצווה|מצווים}}";
        assert_eq!(apply_gender(text, GenderProfile::Male), "מצווה");
        assert_eq!(apply_gender(text, GenderProfile::Plural), "מצווים");
    }

    #[test]
    fn test_marker_organization_form() {
        let text = "{{gender:הוא|היא|הם|החברה}} {{gender:חתם|חתמה|חתמו}}";
        assert_eq!(
            expand_markers(text, GenderProfile::Organization),
            "החברה חתם"
        );
    }

    #[test]
    fn test_marker_missing_form_uses_male() {
        assert_eq!(expand_markers("{{gender:א}}", GenderProfile::Female), "א");
    }

    #[test]
    fn test_nested_markers_expand_completely() {
        let text = "{{{{gender:gender:א|ב}}}}";
        assert_eq!(expand_markers(text, GenderProfile::Male), "א");
    }

    #[test]
    fn test_generic_rewrite() {
        let engine = GenderEngine::hebrew_default();
        assert_eq!(
            engine.apply("הנני מצהיר כי הוא רשאי לחתום", GenderProfile::Female),
            "הנני מצהירה כי היא רשאית לחתום"
        );
        assert_eq!(
            engine.apply("הנני מצהיר כי הוא רשאי לחתום", GenderProfile::Plural),
            "הנני מצהירים כי הם רשאים לחתום"
        );
    }

    #[test]
    fn test_protected_phrase_survives() {
        let rules = RuleTable::new()
            .with_rule(GenderRule::word("שכר", GenderForms::new("שכר", "שכרה", "שכרם")).unwrap())
            .unwrap();
        let engine = GenderEngine::new(rules, DocumentKind::FeeAgreement.phrase_set());
        let out = engine.apply("שכר טרחה ישולם לעורך הדין, שכר", GenderProfile::Female);
        assert_eq!(out, "שכר טרחה ישולם לעורך הדין, שכרה");
    }

    #[test]
    fn test_common_phrase_is_not_rewritten() {
        let out = apply_gender("הוא הדין לגבי הוא", GenderProfile::Female);
        assert_eq!(out, "הוא הדין לגבי היא");
    }

    #[test]
    fn test_correction_after_generic() {
        let engine = GenderEngine::hebrew_default();
        assert_eq!(
            engine.apply("הוא חייב לפי הסכם מחייב", GenderProfile::Female),
            "היא חייבת לפי הסכם מחייב"
        );
    }

    #[test]
    fn test_idempotent() {
        let engine = GenderEngine::for_document(DocumentKind::Contract);
        let text = "הצדדים מסכימים כי הוא מתחייב/ת לשלם, והוא זכאי לזכויותיו באותו יום";
        for profile in GenderProfile::ALL {
            let once = engine.apply(text, profile);
            assert_eq!(engine.apply(&once, profile), once, "profile {profile}");
        }
    }

    #[test]
    fn test_nfc_normalization() {
        // Combining marks in non-canonical order are reordered before matching
        let unordered = "ש\u{05C1}\u{05B8}לו";
        let ordered = "ש\u{05B8}\u{05C1}לו";
        assert_eq!(apply_gender(unordered, GenderProfile::Male), ordered);
        assert_eq!(
            apply_gender(unordered, GenderProfile::Female),
            apply_gender(ordered, GenderProfile::Female)
        );
    }

    #[test]
    fn test_unknown_named_profile() {
        let engine = GenderEngine::hebrew_default();
        let rewritten = engine.apply_named("הוא", "neutral");
        assert_eq!(rewritten.text, "הוא");
        assert_eq!(
            rewritten.diagnostics.iter().next(),
            Some(&Diagnostic::UnknownGenderProfile {
                value: "neutral".to_string()
            })
        );

        let rewritten = engine.apply_named("הוא", "נקבה");
        assert_eq!(rewritten.text, "היא");
        assert!(rewritten.diagnostics.is_empty());
    }

    #[test]
    fn test_extra_rules_run_after_builtin() {
        let extra = RuleTable::new().with_correction(Correction::new("היא", "זו").unwrap());
        let engine = GenderEngine::hebrew_default().with_extra_rules(extra).unwrap();
        assert_eq!(engine.apply("הוא", GenderProfile::Female), "זו");
    }

    #[test]
    fn test_extra_rule_rewriting_builtin_form_is_rejected() {
        // Would turn "היא" back into "הוא" on a second pass
        let extra = RuleTable::new()
            .with_rule(GenderRule::word("היא", GenderForms::new("היא", "הוא", "הם")).unwrap())
            .unwrap();
        assert!(GenderEngine::hebrew_default().with_extra_rules(extra).is_err());
    }

    #[test]
    fn test_male_is_identity_on_plain_text() {
        let text = "הנני מצהיר כי הוא רשאי";
        assert_eq!(apply_gender(text, GenderProfile::Male), text);
    }
}
