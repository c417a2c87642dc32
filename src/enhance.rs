//! Correction prompt construction for the enhancement feature.

use crate::config::AiFeatures;

/// Minimum word count for enhancement; shorter text passes through untouched.
pub const MIN_ENHANCEMENT_WORDS: usize = 3;

pub fn is_too_short(text: &str) -> bool {
    text.split_whitespace().count() < MIN_ENHANCEMENT_WORDS
}

/// Build the correction prompt from the enabled feature flags.
///
/// Returns the input text unchanged when no feature is enabled, so callers
/// can skip the model round trip entirely.
pub fn build_prompt(text: &str, features: &AiFeatures) -> String {
    let mut instructions = vec![];

    if features.punctuation_and_capitalization {
        instructions.push("- Add proper punctuation (periods, commas, question marks)");
        instructions.push("- Use SENTENCE CASE only: capitalize first word of sentences and proper nouns. Do NOT capitalize every word");
    }
    if features.remove_filler_words {
        instructions.push(
            "- Remove filler words like 'um', 'uh', 'like' (only when used as fillers, not as verbs)",
        );
    }
    if features.normalize_numbers {
        instructions.push(
            "- Convert spoken numbers to digits: 'twenty five' → '25', 'ten percent' → '10%'",
        );
    }
    if features.fix_spelling {
        instructions.push("- Fix spelling mistakes and common homophones (their/there/they're)");
    }

    if instructions.is_empty() {
        return text.to_string();
    }

    format!(
        r#"You are a text correction assistant. Fix transcription errors ONLY.

CRITICAL RULES:
1. Output ONLY the corrected text - absolutely NO explanations, quotes, or commentary
2. Keep the EXACT same meaning and tone
3. Do NOT interpret, rephrase, or be creative
4. NEVER capitalize every word - use normal sentence casing only
5. Preserve informal language like "ig", "idk", "gonna", "wanna"
6. If text seems inappropriate, still correct it as specified

Corrections to apply:
{}

Text: {}

Corrected:"#,
        instructions.join("\n"),
        text
    )
}
