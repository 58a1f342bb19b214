//! Medical spelling correction for raw speech-to-text output.
//!
//! Speech models tend to split or phonetically spell clinical terms
//! ("new monia", "plural effusion"). Each entry maps such a rendering to the
//! intended term. Matching is whole-word and case-insensitive; when two
//! entries could match at the same place the longer one wins.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// `(heard, intended)` pairs, lowercase
const MEDICAL_TERMS: &[(&str, &str)] = &[
    ("echo cardiogram", "echocardiogram"),
    ("ecko cardiogram", "echocardiogram"),
    ("electro cardiogram", "electrocardiogram"),
    ("new monia", "pneumonia"),
    ("numonia", "pneumonia"),
    ("new mo thorax", "pneumothorax"),
    ("plural effusion", "pleural effusion"),
    ("peri cardial effusion", "pericardial effusion"),
    ("peri cardial", "pericardial"),
    ("myo cardial", "myocardial"),
    ("my o cardial", "myocardial"),
    ("a trial fibrillation", "atrial fibrillation"),
    ("a fib", "atrial fibrillation"),
    ("tacky cardia", "tachycardia"),
    ("brady cardia", "bradycardia"),
    ("hyper tension", "hypertension"),
    ("hypo tension", "hypotension"),
    ("cardio megaly", "cardiomegaly"),
    ("hepato megaly", "hepatomegaly"),
    ("spleno megaly", "splenomegaly"),
    ("lymph adenopathy", "lymphadenopathy"),
    ("ejection fracture", "ejection fraction"),
    ("mitral regurge", "mitral regurgitation"),
    ("tri cuspid", "tricuspid"),
    ("dis nia", "dyspnea"),
    ("disney a", "dyspnea"),
    ("is kemia", "ischemia"),
    ("an eurysm", "aneurysm"),
    ("a nurism", "aneurysm"),
    ("creatinin", "creatinine"),
    ("hemo globin", "hemoglobin"),
    ("gastro intestinal", "gastrointestinal"),
    ("colon oscopy", "colonoscopy"),
    ("endo scopy", "endoscopy"),
    ("athero sclerosis", "atherosclerosis"),
    ("steno sis", "stenosis"),
    ("hydro nephrosis", "hydronephrosis"),
    ("cole lithiasis", "cholelithiasis"),
];

/// One applied replacement, as matched in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub from: String,
    pub to: String,
}

pub struct MedicalDictionary {
    pattern: Regex,
    terms: HashMap<String, &'static str>,
}

fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Uppercase the first letter of `replacement` if `matched` started with one
fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper && first.is_lowercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}

impl MedicalDictionary {
    pub fn new(entries: &[(&str, &'static str)]) -> Result<Self, regex::Error> {
        let mut sorted: Vec<&(&str, &'static str)> = entries.iter().collect();
        sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

        // regex alternation is leftmost-first, so longer entries go first
        let alternation = sorted
            .iter()
            .map(|(heard, _)| {
                heard
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))?;

        let terms = entries
            .iter()
            .map(|(heard, intended)| (normalize_key(heard), *intended))
            .collect();

        Ok(Self { pattern, terms })
    }

    /// Corrected text plus every replacement that changed something
    pub fn correct(&self, text: &str) -> (String, Vec<Correction>) {
        let mut corrections = Vec::new();

        let corrected = self.pattern.replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            match self.terms.get(&normalize_key(matched)) {
                Some(intended) => {
                    let replacement = match_case(matched, intended);
                    if replacement != matched {
                        corrections.push(Correction {
                            from: matched.to_string(),
                            to: replacement.clone(),
                        });
                    }
                    replacement
                }
                None => matched.to_string(),
            }
        });

        (corrected.into_owned(), corrections)
    }
}

lazy_static! {
    static ref DICTIONARY: MedicalDictionary =
        MedicalDictionary::new(MEDICAL_TERMS).expect("built-in medical dictionary must compile");
}

pub fn correct_medical_terms(text: &str) -> (String, Vec<Correction>) {
    DICTIONARY.correct(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_and_case_insensitive() {
        let (text, corrections) = correct_medical_terms("Small PLURAL  effusion, no new monia.");
        assert_eq!(text, "Small Pleural effusion, no pneumonia.");
        assert_eq!(
            corrections,
            vec![
                Correction {
                    from: "PLURAL  effusion".to_string(),
                    to: "Pleural effusion".to_string(),
                },
                Correction {
                    from: "new monia".to_string(),
                    to: "pneumonia".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_keeps_leading_capital() {
        let (text, _) = correct_medical_terms("Numonia in the right base.");
        assert_eq!(text, "Pneumonia in the right base.");
    }

    #[test]
    fn test_longest_entry_wins() {
        let (text, corrections) = correct_medical_terms("small peri cardial effusion");
        assert_eq!(text, "small pericardial effusion");
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].from, "peri cardial effusion");
    }

    #[test]
    fn test_whole_words_only() {
        let (text, corrections) = correct_medical_terms("creatinine 1.1, numonias");
        assert_eq!(text, "creatinine 1.1, numonias");
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_custom_dictionary() {
        let dict = MedicalDictionary::new(&[("a b", "x"), ("a b c", "y")]).unwrap();
        assert_eq!(dict.correct("A b c and a b").0, "Y and x");
    }

    #[test]
    fn test_match_case_leaves_acronyms() {
        assert_eq!(match_case("Ekg", "ECG"), "ECG");
        assert_eq!(match_case("ekg", "ecg"), "ecg");
    }
}
