use crate::models::LoginRequest;

use super::{char_len, is_valid_email, FieldErrors, MIN_PASSWORD_LENGTH, MSG_INVALID_EMAIL, MSG_SHORT_PASSWORD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Keep the session on disk after the app closes
    pub remember: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            remember: true,
        }
    }
}

impl LoginForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Both fields filled in; the submit control is disabled otherwise.
    pub fn can_submit(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    pub fn validate(&self) -> Result<LoginRequest, FieldErrors<LoginField>> {
        let mut errors = FieldErrors::new();
        let email = self.email.trim();
        if !is_valid_email(email) {
            errors.insert(LoginField::Email, MSG_INVALID_EMAIL.to_string());
        }
        if char_len(&self.password) < MIN_PASSWORD_LENGTH {
            errors.insert(LoginField::Password, MSG_SHORT_PASSWORD.to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(LoginRequest {
            email: email.to_string(),
            senha: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_login() {
        let form = LoginForm {
            email: " a@b.com ".into(),
            password: "secret1".into(),
            remember: true,
        };
        let req = form.validate().expect("valid form");
        assert_eq!(req.email, "a@b.com");
        assert_eq!(req.senha, "secret1");
    }

    #[test]
    fn test_field_errors() {
        let form = LoginForm {
            email: "nope".into(),
            password: "123".into(),
            remember: false,
        };
        let errors = form.validate().expect_err("invalid form");
        assert_eq!(errors.get(&LoginField::Email).map(String::as_str), Some(MSG_INVALID_EMAIL));
        assert_eq!(errors.get(&LoginField::Password).map(String::as_str), Some(MSG_SHORT_PASSWORD));
    }

    #[test]
    fn test_can_submit_and_default_remember() {
        let mut form = LoginForm::new("a@b.com");
        assert!(form.remember);
        assert!(!form.can_submit());
        form.password.push('x');
        assert!(form.can_submit());
    }
}
