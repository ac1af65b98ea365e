use serde::{Deserialize, Serialize};

/// A fully qualified email address (`local@domain`).
///
/// Candidate addresses are derived deterministically from free-text name
/// input; uniqueness is checked against the directory, never locally.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Builds the candidate address `<first>.<last>@<domain>` from raw name
    /// input. Normalization is idempotent: feeding an already-normalized part
    /// back in yields the same address.
    pub fn candidate(first_name: &str, last_name: &str, domain: &str) -> Self {
        Self(format!(
            "{}.{}@{}",
            normalize_name_part(first_name),
            normalize_name_part(last_name),
            domain.trim().to_ascii_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The domain portion, used to scope directory listings.
    pub fn domain(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, domain)| domain)
    }

    pub fn local_part(&self) -> Option<&str> {
        self.0.split_once('@').map(|(local, _)| local)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercases and strips everything that is not a letter or digit, folding
/// common Latin-1 accented letters to their ASCII base first so that
/// "Jöhn" and "John" produce the same local part.
pub fn normalize_name_part(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    for character in raw.chars() {
        if character.is_ascii_alphanumeric() {
            normalized.push(character.to_ascii_lowercase());
        } else if let Some(folded) = fold_accented(character) {
            normalized.push_str(folded);
        }
    }
    normalized
}

fn fold_accented(character: char) -> Option<&'static str> {
    let folded = match character.to_lowercase().next().unwrap_or(character) {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::{normalize_name_part, EmailAddress};

    #[test]
    fn candidate_strips_punctuation_and_lowercases() {
        let address = EmailAddress::candidate("Jöhn!!", "O'Neil 2", "example.com");
        assert_eq!(address.as_str(), "john.oneil2@example.com");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_name_part("Jöhn!!");
        let twice = normalize_name_part(&once);
        assert_eq!(once, "john");
        assert_eq!(once, twice);

        let address = EmailAddress::candidate(&once, &normalize_name_part("O'Neil 2"), "example.com");
        assert_eq!(address.as_str(), "john.oneil2@example.com");
    }

    #[test]
    fn domain_and_local_part_split_on_at_sign() {
        let address = EmailAddress::new("ada.lovelace@example.com");
        assert_eq!(address.domain(), Some("example.com"));
        assert_eq!(address.local_part(), Some("ada.lovelace"));
    }

    #[test]
    fn empty_input_produces_empty_local_segment() {
        let address = EmailAddress::candidate("!!!", "Lovelace", "example.com");
        assert_eq!(address.as_str(), ".lovelace@example.com");
    }

    #[test]
    fn domain_is_trimmed_and_lowercased() {
        let address = EmailAddress::candidate("Ada", "Lovelace", " Example.COM ");
        assert_eq!(address.as_str(), "ada.lovelace@example.com");
    }
}
