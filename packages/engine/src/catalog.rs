//! Built-in protected phrases per document kind
//!
//! Each kind of document has its own terms of art that the generic gender
//! pass must never touch. Phrases shared by every kind are always included.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shield::PhraseSet;

/// Phrases protected in every document.
const COMMON_PHRASES: &[&str] = &["עורך הדין", "בית המשפט", "הוא הדין"];

const WILL_PHRASES: &[&str] = &["צוואה בעדים", "מנהל העיזבון", "היורשים החוקיים", "חוק הירושה"];

const CONTRACT_PHRASES: &[&str] = &["הצד המקבל", "הסכם זה", "הצדדים"];

const POWER_OF_ATTORNEY_PHRASES: &[&str] =
    &["ייפוי כוח מתמשך", "ייפוי כוח", "מיופה הכוח", "מיופה כוח"];

const FEE_AGREEMENT_PHRASES: &[&str] = &["שכר טרחה מוסכם", "שכר הטרחה", "שכר טרחה", "הצד המקבל"];

const AFFIDAVIT_PHRASES: &[&str] = &["העונשים הקבועים בחוק"];

/// Kind of legal document being drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    #[default]
    General,
    Will,
    Contract,
    PowerOfAttorney,
    FeeAgreement,
    Affidavit,
}

impl DocumentKind {
    /// All document kinds.
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::General,
        DocumentKind::Will,
        DocumentKind::Contract,
        DocumentKind::PowerOfAttorney,
        DocumentKind::FeeAgreement,
        DocumentKind::Affidavit,
    ];

    /// Canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::General => "general",
            DocumentKind::Will => "will",
            DocumentKind::Contract => "contract",
            DocumentKind::PowerOfAttorney => "power-of-attorney",
            DocumentKind::FeeAgreement => "fee-agreement",
            DocumentKind::Affidavit => "affidavit",
        }
    }

    fn own_phrases(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::General => &[],
            DocumentKind::Will => WILL_PHRASES,
            DocumentKind::Contract => CONTRACT_PHRASES,
            DocumentKind::PowerOfAttorney => POWER_OF_ATTORNEY_PHRASES,
            DocumentKind::FeeAgreement => FEE_AGREEMENT_PHRASES,
            DocumentKind::Affidavit => AFFIDAVIT_PHRASES,
        }
    }

    /// Literal phrases protected for this kind, common phrases first.
    pub fn protected_phrases(&self) -> Vec<&'static str> {
        COMMON_PHRASES
            .iter()
            .chain(self.own_phrases())
            .copied()
            .collect()
    }

    /// Phrase set ready for shielding.
    pub fn phrase_set(&self) -> PhraseSet {
        let mut set = PhraseSet::new();
        for phrase in self.protected_phrases() {
            if let Err(e) = set.add_literal(phrase) {
                tracing::warn!(phrase, error = %e, "Skipping protected phrase");
            }
        }
        set
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown document kind '{s}'"))
    }
}
