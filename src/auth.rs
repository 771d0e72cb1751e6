use std::fmt;

/// Bearer token used to authenticate against the cluster API.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

// Never print the secret itself
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_trimmed() {
        let token = Token::from("  sha256~abc\n");
        assert_eq!(token.as_str(), "sha256~abc");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::from("secret");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
