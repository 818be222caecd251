/*!
 * Formula protection for the document pipeline.
 *
 * Mathematical notation sent through a translation provider comes back
 * mangled more often than not. Before the translate stage, detected
 * notation is swapped for opaque placeholder tokens, and after a block is
 * translated the placeholders are substituted back. Placeholders match
 * none of the detection patterns, so running protection twice is a no-op.
 */

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Display math: `$$ ... $$`
static DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$[^$]+\$\$").unwrap());

/// Bracketed display math: `\[ ... \]`
static BRACKET_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\[.+?\\\]").unwrap());

/// Inline math: `$ ... $`
static INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$\n]+\$").unwrap());

/// Bare equation runs: `lhs = rhs` with an operator-chained right side
static BARE_EQUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[A-Za-z][A-Za-z0-9_]*\s*=\s*[0-9A-Za-z_^(){}\\]+(?:\s*[+\-*/^=]\s*[0-9A-Za-z_^(){}\\]+)*",
    )
    .unwrap()
});

/// Outcome of protecting one block's text.
#[derive(Debug, Clone)]
pub struct ProtectedText {
    /// Text with notation replaced by placeholder tokens
    pub text: String,

    /// Placeholder token -> original notation
    pub placeholders: HashMap<String, String>,

    /// Whether the whole text collapsed to a single placeholder
    /// (pure notation, nothing left to translate)
    pub collapsed_to_notation: bool,
}

/// Replace mathematical notation with opaque placeholders.
///
/// Each match gets its own token (`⟦EQ_n⟧`), so identical formulas in one
/// block restore independently. Already-protected text is left unchanged.
pub fn protect(text: &str) -> ProtectedText {
    let mut placeholders = HashMap::new();
    let mut counter = 0usize;
    let mut result = text.to_string();

    for pattern in [&*DISPLAY_MATH, &*BRACKET_MATH, &*INLINE_MATH, &*BARE_EQUATION] {
        result = pattern
            .replace_all(&result, |caps: &regex::Captures<'_>| {
                let token = format!("⟦EQ_{}⟧", counter);
                counter += 1;
                placeholders.insert(token.clone(), caps[0].to_string());
                token
            })
            .into_owned();
    }

    let collapsed_to_notation = placeholders.contains_key(result.trim());
    ProtectedText { text: result, placeholders, collapsed_to_notation }
}

/// Substitute the original notation back into translated text.
///
/// Placeholders a provider dropped or altered are simply absent from the
/// output; restoration never fails.
pub fn restore(text: &str, placeholders: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (token, original) in placeholders {
        result = result.replace(token, original);
    }
    result
}
