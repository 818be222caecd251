use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module provides functions for normalizing and matching ISO 639-1
/// (2-letter) and ISO 639-2/T (3-letter) language codes, plus the handful of
/// predicates the orchestrator needs (auto-detection marker, English check).
/// Marker for requests that leave source-language detection to the provider
pub const AUTO_LANGUAGE: &str = "auto";

/// Check whether a source-language value requests provider-side detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO_LANGUAGE)
}

/// Resolve a language code or English name to an isolang entry
fn resolve(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        0 => None,
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        // isolang names are capitalized ("English", "Mandarin Chinese")
        _ => Language::from_name(&capitalize(&normalized)),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Normalize a language code to ISO 639-1 where one exists, falling back to
/// the lower-cased input for codes isolang does not know
pub fn normalize(code: &str) -> String {
    let trimmed = code.trim().to_lowercase();
    match resolve(&trimmed) {
        Some(lang) => lang
            .to_639_1()
            .map(|c| c.to_string())
            .unwrap_or_else(|| lang.to_639_3().to_string()),
        None => trimmed,
    }
}

/// Check if two language codes refer to the same language
///
/// Handles mixed 2-letter / 3-letter / English-name forms ("en" matches
/// "eng" and "English").
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    if code1.trim().eq_ignore_ascii_case(code2.trim()) {
        return true;
    }
    match (resolve(code1), resolve(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Check whether a target-language code denotes English
pub fn is_english(code: &str) -> bool {
    resolve(code) == Some(Language::Eng)
}

/// Get the English display name for a language code, falling back to the
/// code itself when it cannot be resolved
pub fn language_name(code: &str) -> String {
    resolve(code)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.trim().to_string())
}
