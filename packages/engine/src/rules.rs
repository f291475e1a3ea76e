//! Declarative gender rule table
//!
//! Every rewrite the gender engine performs comes from a [`RuleTable`]: an
//! ordered list of phase-tagged entries.
//!
//! | Phase        | Entry kinds                 | Runs                         |
//! |--------------|-----------------------------|------------------------------|
//! | `marker`     | `pattern`                   | after `{{gender:…}}` markers |
//! | `generic`    | `word`, `ending`, `pattern` | inside the phrase shield     |
//! | `corrective` | `find` / `replace`          | last, until nothing changes  |
//!
//! # YAML Format
//!
//! ```yaml
//! rules:
//!   - word: מצהיר                       # whole word, attached prefixes allowed
//!     forms: [מצהיר, מצהירה, מצהירים]    # male, female, plural[, organization]
//!   - ending: ותיו                      # word ending
//!     forms: [ותיו, ותיה, ותיהם]
//!   - phase: marker
//!     pattern: '\b(\w+)/([הת])\b'       # raw regex, forms are replacement templates
//!     forms: ['$1', '$1$2', '${1}ים', '$1']
//!   - find: הסכם מחייבת                  # literal correction
//!     replace: הסכם מחייב
//!     profiles: [female]                # optional restriction
//! ```
//!
//! Entries are checked when the table is built so that a table that loads is
//! safe to apply repeatedly: word and ending forms must not re-match their
//! own rule, no rewrite rule may change a form that a word or ending rule of
//! the same phase produces, and a correction's replacement must not contain
//! its find text.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::{
    HEBREW_PREFIX_LETTERS, MAX_ATTACHED_PREFIXES, MAX_CORRECTION_PASSES, MAX_ENTRIES,
    MAX_SHIELD_NAMESPACES, PRIVATE_USE_START, SHIELD_NAMESPACE_SIZE,
};
use crate::error::{check_input_size, EngineError, Result};
use crate::types::GenderProfile;

/// Source of the built-in table.
const HEBREW_RULES: &str = include_str!("../rules/hebrew.yaml");

#[allow(clippy::expect_used)] // Built-in table is checked by test_builtin_table_loads
static HEBREW_DEFAULT: LazyLock<RuleTable> = LazyLock::new(|| {
    RuleTable::from_yaml_str(HEBREW_RULES).expect("built-in rule table is valid")
});

/// Pipeline phase a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulePhase {
    /// Right after gender marker expansion
    Marker,
    /// Blanket rewrite inside the phrase shield
    Generic,
    /// Known-bad output repairs
    Corrective,
}

/// Surface forms of one word, one per profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenderForms {
    pub male: String,
    pub female: String,
    pub plural: String,
    /// Falls back to the male form when absent
    #[serde(default)]
    pub organization: Option<String>,
}

impl GenderForms {
    /// Create forms without a dedicated organization form.
    pub fn new(male: &str, female: &str, plural: &str) -> Self {
        Self {
            male: male.to_string(),
            female: female.to_string(),
            plural: plural.to_string(),
            organization: None,
        }
    }

    /// Builder-style organization form.
    pub fn with_organization(mut self, form: &str) -> Self {
        self.organization = Some(form.to_string());
        self
    }

    /// Build from a `|`-separated marker body or a YAML list.
    ///
    /// Missing female or plural forms fall back to the male form.
    pub fn from_list<S: AsRef<str>>(forms: &[S]) -> Self {
        let male = forms.first().map_or("", |s| s.as_ref());
        let pick = |i: usize| forms.get(i).map_or(male, |s| s.as_ref()).to_string();
        Self {
            male: male.to_string(),
            female: pick(1),
            plural: pick(2),
            organization: forms.get(3).map(|s| s.as_ref().to_string()),
        }
    }

    /// The form selected by a profile.
    pub fn for_profile(&self, profile: GenderProfile) -> &str {
        match profile {
            GenderProfile::Male => &self.male,
            GenderProfile::Female => &self.female,
            GenderProfile::Plural => &self.plural,
            GenderProfile::Organization => self.organization.as_deref().unwrap_or(&self.male),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.male, &self.female, &self.plural]
            .into_iter()
            .map(String::as_str)
            .chain(self.organization.as_deref())
    }
}

/// What a generic or marker rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    /// A whole word, optionally preceded by attached prefix letters
    Word(String),
    /// Any word ending in this suffix
    Ending(String),
    /// A raw regex; forms may use `$1`-style group references
    Pattern(String),
}

/// A rewrite rule selecting a surface form per profile.
#[derive(Debug, Clone)]
pub struct GenderRule {
    phase: RulePhase,
    target: RuleMatch,
    forms: GenderForms,
    regex: Regex,
}

impl GenderRule {
    /// Whole-word rule in the generic phase.
    pub fn word(word: &str, forms: GenderForms) -> Result<Self> {
        Self::new(RulePhase::Generic, RuleMatch::Word(word.to_string()), forms)
    }

    /// Word-ending rule in the generic phase.
    pub fn ending(ending: &str, forms: GenderForms) -> Result<Self> {
        Self::new(RulePhase::Generic, RuleMatch::Ending(ending.to_string()), forms)
    }

    /// Raw regex rule.
    pub fn pattern(phase: RulePhase, pattern: &str, forms: GenderForms) -> Result<Self> {
        Self::new(phase, RuleMatch::Pattern(pattern.to_string()), forms)
    }

    /// Build and compile a rule.
    pub fn new(phase: RulePhase, target: RuleMatch, forms: GenderForms) -> Result<Self> {
        if phase == RulePhase::Corrective {
            return Err(invalid(0, "rewrite rules cannot run in the corrective phase"));
        }
        let source = match &target {
            RuleMatch::Word(word) => {
                format!(
                    r"\b([{HEBREW_PREFIX_LETTERS}]{{0,{MAX_ATTACHED_PREFIXES}}}){}\b",
                    regex::escape(word)
                )
            }
            RuleMatch::Ending(ending) => format!(r"\b(\w*){}\b", regex::escape(ending)),
            RuleMatch::Pattern(pattern) => pattern.clone(),
        };
        let regex = Regex::new(&source).map_err(|source_err| EngineError::InvalidPattern {
            pattern: source,
            source: source_err,
        })?;

        let rule = Self {
            phase,
            target,
            forms,
            regex,
        };
        rule.check().map_err(|reason| invalid(0, reason))?;
        Ok(rule)
    }

    fn check(&self) -> std::result::Result<(), &'static str> {
        let literal = match &self.target {
            RuleMatch::Word(s) | RuleMatch::Ending(s) => Some(s.as_str()),
            RuleMatch::Pattern(_) => None,
        };
        if literal.is_some_and(str::is_empty) {
            return Err("word and ending rules need a non-empty match");
        }
        if self.forms.iter().any(has_private_use) {
            return Err("forms must not contain private-use characters");
        }
        if let Some(source) = literal {
            for form in self.forms.iter() {
                if form != source && self.regex.is_match(form) {
                    return Err("a form re-matches its own rule");
                }
            }
        }
        Ok(())
    }

    /// Phase this rule runs in.
    pub fn phase(&self) -> RulePhase {
        self.phase
    }

    /// What the rule matches.
    pub fn target(&self) -> &RuleMatch {
        &self.target
    }

    /// Surface forms.
    pub fn forms(&self) -> &GenderForms {
        &self.forms
    }

    /// Rewrite every match for a profile.
    pub fn apply(&self, text: &str, profile: GenderProfile) -> String {
        let form = self.forms.for_profile(profile);
        let replacement = match &self.target {
            RuleMatch::Word(source) | RuleMatch::Ending(source) => {
                if form == source {
                    return text.to_string();
                }
                format!("${{1}}{}", form.replace('$', "$$"))
            }
            RuleMatch::Pattern(_) => form.to_string(),
        };
        self.regex.replace_all(text, replacement.as_str()).into_owned()
    }
}

/// A literal "known bad output → correct output" repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    find: String,
    replace: String,
    profiles: Vec<GenderProfile>,
}

impl Correction {
    /// Build a correction that applies to every profile.
    pub fn new(find: &str, replace: &str) -> Result<Self> {
        if find.is_empty() {
            return Err(invalid(0, "correction find text is empty"));
        }
        if replace.contains(find) {
            return Err(invalid(0, "correction replacement contains its own find text"));
        }
        if has_private_use(replace) {
            return Err(invalid(0, "replacement must not contain private-use characters"));
        }
        Ok(Self {
            find: find.to_string(),
            replace: replace.to_string(),
            profiles: Vec::new(),
        })
    }

    /// Restrict the correction to the given profiles.
    pub fn for_profiles(mut self, profiles: &[GenderProfile]) -> Self {
        self.profiles = profiles.to_vec();
        self
    }

    /// Check whether the correction runs for a profile.
    pub fn applies_to(&self, profile: GenderProfile) -> bool {
        self.profiles.is_empty() || self.profiles.contains(&profile)
    }

    /// Apply once.
    pub fn apply(&self, text: &str) -> String {
        text.replace(&self.find, &self.replace)
    }
}

/// One entry of a [`RuleTable`].
#[derive(Debug, Clone)]
pub enum Rule {
    Rewrite(GenderRule),
    Correction(Correction),
}

impl Rule {
    /// Phase this entry runs in.
    pub fn phase(&self) -> RulePhase {
        match self {
            Rule::Rewrite(rule) => rule.phase(),
            Rule::Correction(_) => RulePhase::Corrective,
        }
    }
}

/// Ordered, phase-tagged rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Hebrew table.
    pub fn hebrew_default() -> Self {
        HEBREW_DEFAULT.clone()
    }

    /// Append a rewrite rule.
    ///
    /// Fails, leaving the table unchanged, when the rule rewrites a form
    /// another rule produces or the other way round.
    pub fn push_rule(&mut self, rule: GenderRule) -> Result<()> {
        let len = self.rules.len();
        self.rules.push(Rule::Rewrite(rule));
        self.checked_since(len)
    }

    /// Append a correction.
    pub fn push_correction(&mut self, correction: Correction) {
        self.rules.push(Rule::Correction(correction));
    }

    /// Builder-style [`Self::push_rule`].
    pub fn with_rule(mut self, rule: GenderRule) -> Result<Self> {
        self.push_rule(rule)?;
        Ok(self)
    }

    /// Builder-style [`Self::push_correction`].
    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.push_correction(correction);
        self
    }

    /// Append every entry of another table after this table's entries.
    ///
    /// Fails, leaving the table unchanged, when the combined table has rules
    /// that rewrite each other's forms.
    pub fn extend(&mut self, other: RuleTable) -> Result<()> {
        let len = self.rules.len();
        self.rules.extend(other.rules);
        self.checked_since(len)
    }

    /// Validate the table, dropping entries from `len` on when it is invalid.
    fn checked_since(&mut self, len: usize) -> Result<()> {
        if let Err(err) = self.check_interactions() {
            self.rules.truncate(len);
            return Err(err);
        }
        Ok(())
    }

    /// Reject a rewrite rule that changes a form produced by a word or
    /// ending rule of the same phase. Pattern forms are replacement
    /// templates and are not checked as producers.
    fn check_interactions(&self) -> Result<()> {
        let rewrites: Vec<(usize, &GenderRule)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(i, rule)| match rule {
                Rule::Rewrite(r) => Some((i + 1, r)),
                Rule::Correction(_) => None,
            })
            .collect();

        for &(producer_index, producer) in &rewrites {
            let source = match producer.target() {
                RuleMatch::Word(s) | RuleMatch::Ending(s) => s.as_str(),
                RuleMatch::Pattern(_) => continue,
            };
            for profile in GenderProfile::ALL {
                let form = producer.forms().for_profile(profile);
                if form == source {
                    continue;
                }
                for &(index, other) in &rewrites {
                    if index != producer_index
                        && other.phase() == producer.phase()
                        && other.apply(form, profile) != form
                    {
                        return Err(invalid(
                            index,
                            format!(
                                "rewrites '{form}', the {profile} form of rule #{producer_index}"
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All entries in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Rewrite rules of one phase, in table order.
    pub fn rewrites(&self, phase: RulePhase) -> impl Iterator<Item = &GenderRule> {
        self.rules.iter().filter_map(move |rule| match rule {
            Rule::Rewrite(r) if r.phase() == phase => Some(r),
            _ => None,
        })
    }

    /// Corrections, in table order.
    pub fn corrections(&self) -> impl Iterator<Item = &Correction> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Correction(c) => Some(c),
            Rule::Rewrite(_) => None,
        })
    }

    /// Apply every rewrite rule of a phase once, in order.
    pub fn apply_phase(&self, text: &str, phase: RulePhase, profile: GenderProfile) -> String {
        self.rewrites(phase)
            .fold(text.to_string(), |acc, rule| rule.apply(&acc, profile))
    }

    /// Apply corrections repeatedly until the text stops changing.
    pub fn apply_corrections(&self, text: &str, profile: GenderProfile) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_CORRECTION_PASSES {
            let next = self
                .corrections()
                .filter(|c| c.applies_to(profile))
                .fold(current.clone(), |acc, c| c.apply(&acc));
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::warn!(
            passes = MAX_CORRECTION_PASSES,
            "Corrections did not reach a fixpoint"
        );
        current
    }

    /// Parse a table from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        check_input_size(yaml, "Rule table")?;
        let file: RuleFile = serde_yaml_ng::from_str(yaml)?;
        if file.rules.len() > MAX_ENTRIES {
            return Err(EngineError::LoadError(format!(
                "Too many rules ({}, max {MAX_ENTRIES})",
                file.rules.len()
            )));
        }

        let mut table = RuleTable::new();
        for (i, entry) in file.rules.into_iter().enumerate() {
            let index = i + 1;
            let rule = entry.into_rule().map_err(|err| match err {
                EngineError::InvalidRule { reason, .. } => {
                    EngineError::InvalidRule { index, reason }
                }
                other => other,
            })?;
            table.rules.push(rule);
        }
        table.check_interactions()?;

        tracing::debug!(rules = table.len(), "Parsed rule table");
        Ok(table)
    }

    /// Load a YAML table from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// On-disk layout of a rule table.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FormsEntry {
    List(Vec<String>),
    Named(GenderForms),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    #[serde(default)]
    phase: Option<RulePhase>,
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    ending: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    find: Option<String>,
    #[serde(default)]
    forms: Option<FormsEntry>,
    #[serde(default)]
    replace: Option<String>,
    #[serde(default)]
    profiles: Vec<GenderProfile>,
}

impl RuleEntry {
    fn into_rule(self) -> Result<Rule> {
        let kinds = [&self.word, &self.ending, &self.pattern, &self.find]
            .iter()
            .filter(|k| k.is_some())
            .count();
        if kinds != 1 {
            return Err(invalid(0, "exactly one of word, ending, pattern or find is required"));
        }

        if let Some(find) = self.find {
            if self.phase.is_some_and(|p| p != RulePhase::Corrective) {
                return Err(invalid(0, "find/replace entries belong to the corrective phase"));
            }
            if self.forms.is_some() {
                return Err(invalid(0, "find/replace entries take no forms"));
            }
            let replace = self
                .replace
                .ok_or_else(|| invalid(0, "find requires replace"))?;
            let correction = Correction::new(&find, &replace)?.for_profiles(&self.profiles);
            return Ok(Rule::Correction(correction));
        }

        if self.replace.is_some() || !self.profiles.is_empty() {
            return Err(invalid(0, "replace and profiles only apply to find entries"));
        }
        let forms = match self.forms {
            Some(FormsEntry::List(list)) if (3..=4).contains(&list.len()) => {
                GenderForms::from_list(&list)
            }
            Some(FormsEntry::List(_)) => return Err(invalid(0, "forms needs 3 or 4 entries")),
            Some(FormsEntry::Named(forms)) => forms,
            None => return Err(invalid(0, "forms is required")),
        };

        let phase = self.phase.unwrap_or(RulePhase::Generic);
        let target = match (self.word, self.ending, self.pattern) {
            (Some(word), _, _) => RuleMatch::Word(word),
            (_, Some(ending), _) => RuleMatch::Ending(ending),
            (_, _, Some(pattern)) => RuleMatch::Pattern(pattern),
            _ => return Err(invalid(0, "missing match")),
        };
        if phase == RulePhase::Marker && !matches!(target, RuleMatch::Pattern(_)) {
            return Err(invalid(0, "marker-phase entries must be patterns"));
        }

        Ok(Rule::Rewrite(GenderRule::new(phase, target, forms)?))
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidRule {
        index,
        reason: reason.into(),
    }
}

fn has_private_use(text: &str) -> bool {
    let end = PRIVATE_USE_START + MAX_SHIELD_NAMESPACES * SHIELD_NAMESPACE_SIZE;
    text.chars()
        .any(|c| (PRIVATE_USE_START..end).contains(&(c as u32)))
}
