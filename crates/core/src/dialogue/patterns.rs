/// Classified outcome of a free-text reply at a confirmation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Affirmative,
    Negative,
    Other,
}

const AFFIRMATIVE_TOKENS: &[&str] =
    &["yes", "yea", "yeah", "yep", "yup", "ya", "yah", "y", "sure", "ok", "okay", "correct"];

const NEGATIVE_TOKENS: &[&str] = &["no", "nah", "naw", "nope", "n", "cancel", "stop"];

/// Classify a reply as affirmative, negative, or unrecognized.
///
/// Matching is token-based: the first token (case-insensitive, punctuation
/// trimmed) that appears in either set decides the answer, so "yes please"
/// and "Nope." classify the way a human reader would expect. Anything else is
/// `Other`, which makes the dialogue repeat the question instead of guessing.
pub fn classify_answer(text: &str) -> Answer {
    for token in text.split_whitespace() {
        let token = token
            .trim_matches(|ch: char| !ch.is_alphanumeric())
            .to_ascii_lowercase();
        if token.is_empty() {
            continue;
        }
        if AFFIRMATIVE_TOKENS.contains(&token.as_str()) {
            return Answer::Affirmative;
        }
        if NEGATIVE_TOKENS.contains(&token.as_str()) {
            return Answer::Negative;
        }
    }
    Answer::Other
}
