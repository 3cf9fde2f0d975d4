//! Form state and validation for the account screens.
//!
//! Validation is local and field-level: a form that fails validation never
//! produces a request payload. Messages are the ones shown next to the fields.

pub mod login;
pub mod profile;
pub mod register;

use std::collections::BTreeMap;

pub use login::{LoginField, LoginForm};
pub use profile::{ProfileError, ProfileField, ProfileForm, ProfileSubmission};
pub use register::{RegisterField, RegisterForm};

/// Field -> message, ordered like the form.
pub type FieldErrors<F> = BTreeMap<F, String>;

pub const MSG_INVALID_EMAIL: &str = "Informe um e-mail válido";
pub const MSG_SHORT_PASSWORD: &str = "A senha deve ter pelo menos 6 caracteres";

/// Minimum password length accepted by the backend
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum length for a single text input.
/// 128 chars accommodates password managers and long company names.
pub const MAX_INPUT_LENGTH: usize = 128;

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a typed character should be accepted into a field
pub fn can_add_char(current: &str, c: char) -> bool {
    current.chars().count() < MAX_INPUT_LENGTH && is_valid_input_char(c)
}

/// Pragmatic address check: one `@`, no whitespace, a dotted domain whose
/// last label is at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || local.starts_with('.') || local.ends_with('.') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty() || l.starts_with('-')) {
        return false;
    }
    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("ana.souza+frete@vai-logistica.com.br"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("@vai.com"));
        assert!(!is_valid_email("ana@vai"));
        assert!(!is_valid_email("ana@vai.c"));
        assert!(!is_valid_email("ana @vai.com"));
        assert!(!is_valid_email("ana@@vai.com"));
        assert!(!is_valid_email("ana@vai..com"));
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char("", 'a'));
        assert!(can_add_char("", 'ç'));
        assert!(can_add_char(&"x".repeat(MAX_INPUT_LENGTH - 1), 'z'));
        assert!(!can_add_char(&"x".repeat(MAX_INPUT_LENGTH), 'z'));
        assert!(!can_add_char("", '\n'));
        assert!(!can_add_char("", '\x00'));
        assert!(!can_add_char("", '\t'));
    }
}
