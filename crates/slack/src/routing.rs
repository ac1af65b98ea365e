//! Keyword routing tables. Purely a routing layer: no state, no I/O.
//!
//! Account-changing intents (create, reset) are only honored in direct
//! messages; mentions in shared channels can only ask for the greeting or
//! setup information.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageIntent {
    Greeting,
    SetupInfo,
    CreateAccount,
    ResetPassword,
}

const GREETING_KEYWORDS: &[&str] = &["hi", "hallo", "hello", "hey", "hoi", "what", "help"];
const INFO_KEYWORDS: &[&str] = &["how", "info", "install", "web"];
const CREATE_KEYWORDS: &[&str] = &["create", "add", "new", "neu"];
const RESET_KEYWORDS: &[&str] = &["reset", "password", "change", "forgot", "forget"];

/// Intent for a direct message. Keyword sets are checked in a fixed order so
/// that e.g. "help me create an account" greets and explains the options
/// instead of jumping straight into provisioning.
pub fn direct_message_intent(text: &str) -> Option<MessageIntent> {
    let tokens = tokenize(text);
    if matches_any(&tokens, GREETING_KEYWORDS) {
        return Some(MessageIntent::Greeting);
    }
    if matches_any(&tokens, INFO_KEYWORDS) {
        return Some(MessageIntent::SetupInfo);
    }
    if matches_any(&tokens, CREATE_KEYWORDS) {
        return Some(MessageIntent::CreateAccount);
    }
    if matches_any(&tokens, RESET_KEYWORDS) {
        return Some(MessageIntent::ResetPassword);
    }
    None
}

/// Intent for a direct mention: informational intents only.
pub fn mention_intent(text: &str) -> Option<MessageIntent> {
    let tokens = tokenize(text);
    if matches_any(&tokens, GREETING_KEYWORDS) {
        return Some(MessageIntent::Greeting);
    }
    if matches_any(&tokens, INFO_KEYWORDS) {
        return Some(MessageIntent::SetupInfo);
    }
    None
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token.trim_matches(|ch: char| !ch.is_alphanumeric()).to_ascii_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn matches_any(tokens: &[String], keywords: &[&str]) -> bool {
    tokens.iter().any(|token| keywords.contains(&token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::{direct_message_intent, mention_intent, MessageIntent};

    #[test]
    fn greeting_keywords_route_to_greeting() {
        for text in ["hi", "Hello!", "hey there", "help"] {
            assert_eq!(direct_message_intent(text), Some(MessageIntent::Greeting), "text: {text}");
        }
    }

    #[test]
    fn create_keywords_route_to_create() {
        for text in ["create", "I want a new account", "add me", "neu bitte"] {
            assert_eq!(
                direct_message_intent(text),
                Some(MessageIntent::CreateAccount),
                "text: {text}"
            );
        }
    }

    #[test]
    fn reset_keywords_route_to_reset() {
        for text in ["reset", "I forgot my password", "change it please"] {
            assert_eq!(
                direct_message_intent(text),
                Some(MessageIntent::ResetPassword),
                "text: {text}"
            );
        }
    }

    #[test]
    fn info_keywords_route_to_setup_info() {
        for text in ["how do I set this up?", "info", "install", "web access"] {
            assert_eq!(direct_message_intent(text), Some(MessageIntent::SetupInfo), "text: {text}");
        }
    }

    #[test]
    fn greeting_wins_over_later_sets() {
        assert_eq!(
            direct_message_intent("help me create an account"),
            Some(MessageIntent::Greeting),
        );
    }

    #[test]
    fn unmatched_text_has_no_intent() {
        assert_eq!(direct_message_intent("lorem ipsum dolor"), None);
        assert_eq!(direct_message_intent(""), None);
    }

    #[test]
    fn mentions_never_route_to_account_changing_intents() {
        assert_eq!(mention_intent("create an account for me"), None);
        assert_eq!(mention_intent("reset my password"), None);
        assert_eq!(mention_intent("how does this work"), Some(MessageIntent::SetupInfo));
        assert_eq!(mention_intent("hello bot"), Some(MessageIntent::Greeting));
    }
}
