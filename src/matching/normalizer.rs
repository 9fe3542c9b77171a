// src/matching/normalizer.rs - rule-based name cleaning

use anyhow::{anyhow, Context, Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Honorifics and titles stripped from person names. Matches the forms
/// observed in the DPOH contact export: "The Hon.", "Rt. Hon.", courtesy
/// titles, ministerial and military prefixes.
static PERSON_REMOVALS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(the\s+|l')?(right\s+)?hon(ourable)?\b\.?",
        r"(?i)\b(mrs|mr|ms|dr)\b\.?",
        r"(?i)\b(the|mp|minister|min|ambassador|brigadier|conservative|national|rear-admiral|commodore|assistant|deputy|executive)\b\.?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in person removal patterns must compile"))
    .collect()
});

/// Casing rule applied before token removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseRule {
    /// Lowercase everything (person names).
    Lower,
    /// Capitalize the first letter of each word (organization names).
    Title,
}

/// Which kind of string universe is being normalized. Selects a removal
/// pattern set and a casing rule; the structural algorithm is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Universe {
    Organization,
    Person,
}

impl Universe {
    pub fn case_rule(self) -> CaseRule {
        match self {
            Universe::Organization => CaseRule::Title,
            Universe::Person => CaseRule::Lower,
        }
    }
}

impl FromStr for Universe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "org" | "organization" | "firm" => Ok(Universe::Organization),
            "person" | "dpoh" => Ok(Universe::Person),
            other => Err(anyhow!(
                "unknown string universe '{}' (expected 'org' or 'person')",
                other
            )),
        }
    }
}

/// Pure, idempotent name cleaner: diacritics stripped, casing normalized,
/// configured title tokens removed, whitespace collapsed, leading and
/// trailing punctuation trimmed.
#[derive(Debug, Clone)]
pub struct Normalizer {
    case: CaseRule,
    removals: Vec<Regex>,
}

impl Normalizer {
    pub fn new(case: CaseRule, removal_patterns: &[&str]) -> Result<Self> {
        let removals = removal_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid removal pattern '{}'", p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Normalizer { case, removals })
    }

    /// Organization and firm names: title case, no token removals.
    pub fn organization() -> Self {
        Normalizer {
            case: CaseRule::Title,
            removals: Vec::new(),
        }
    }

    /// Person (DPOH contact) names: lowercase, honorifics stripped.
    pub fn person() -> Self {
        Normalizer {
            case: CaseRule::Lower,
            removals: PERSON_REMOVALS.clone(),
        }
    }

    pub fn for_universe(universe: Universe) -> Self {
        match universe {
            Universe::Organization => Self::organization(),
            Universe::Person => Self::person(),
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut s = strip_diacritics(raw);
        s = match self.case {
            CaseRule::Lower => s.to_lowercase(),
            CaseRule::Title => title_case(&s),
        };
        for re in &self.removals {
            s = re.replace_all(&s, " ").into_owned();
        }
        let s = collapse_whitespace(&s);
        s.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .to_string()
    }
}

/// NFKD decomposition with combining marks removed ("é" -> "e").
fn strip_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Uppercase the first letter of every word, lowercase the rest. A word
/// starts after any non-alphabetic character, so "l'institut" becomes
/// "L'Institut".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_strips_honorifics_and_case() {
        let n = Normalizer::person();
        assert_eq!(n.normalize("Jean Dupont"), "jean dupont");
        assert_eq!(n.normalize("JEAN DUPONT"), "jean dupont");
        assert_eq!(n.normalize("The Hon. Jean Dupont"), "jean dupont");
        assert_eq!(n.normalize("The Right Honourable Jean Dupont"), "jean dupont");
        assert_eq!(n.normalize("Deputy Minister Jean Dupont"), "jean dupont");
        assert_eq!(n.normalize("Mr. Jean Dupont"), "jean dupont");
    }

    #[test]
    fn test_person_leaves_distinct_names_distinct() {
        let n = Normalizer::person();
        assert_ne!(n.normalize("Jean Dupont"), n.normalize("Marie Curie"));
        // "dr" must only match as a whole word.
        assert_eq!(n.normalize("Andre Drouin"), "andre drouin");
    }

    #[test]
    fn test_organization_title_case_and_whitespace() {
        let n = Normalizer::organization();
        assert_eq!(n.normalize("  ACME   holdings  "), "Acme Holdings");
        assert_eq!(n.normalize("l'institut canadien"), "L'Institut Canadien");
    }

    #[test]
    fn test_diacritics_are_stripped() {
        let n = Normalizer::organization();
        assert_eq!(n.normalize("Société Générale"), "Societe Generale");
        let p = Normalizer::person();
        assert_eq!(p.normalize("François Côté"), "francois cote");
    }

    #[test]
    fn test_leading_and_trailing_punctuation_trimmed() {
        let n = Normalizer::organization();
        assert_eq!(n.normalize("\"Acme Inc.\""), "Acme Inc");
    }

    #[test]
    fn test_custom_removal_patterns() {
        let n = Normalizer::new(CaseRule::Title, &[r"(?i)\b(inc|ltd|corp)\b\.?"]).unwrap();
        assert_eq!(n.normalize("ACME holdings inc."), "Acme Holdings");
        assert_eq!(n.normalize("Acme Ltd"), "Acme");
    }

    #[test]
    fn test_invalid_removal_pattern_is_an_error() {
        assert!(Normalizer::new(CaseRule::Lower, &["("]).is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "The Hon. Jean Dupont",
            "Société Générale",
            "  ACME   holdings  ",
            "\"Acme Inc.\"",
            "Mr. François Côté",
            "Marie Curie",
        ];
        for n in [Normalizer::organization(), Normalizer::person()] {
            for s in samples {
                let once = n.normalize(s);
                assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", s);
            }
        }
    }
}
