use crate::models::{Document, RegisterRequest};
use crate::utils::{mask_cpf_cnpj, mask_phone_br, only_digits};

use super::{char_len, is_valid_email, FieldErrors, MIN_PASSWORD_LENGTH, MSG_INVALID_EMAIL, MSG_SHORT_PASSWORD};

const MSG_NAME: &str = "Informe seu nome";
const MSG_PHONE: &str = "Informe um celular válido";
const MSG_DOCUMENT: &str = "Informe um CPF (11 dígitos) ou CNPJ (14 dígitos) válido";
const MSG_COMPANY: &str = "Informe o nome da empresa";
const MSG_CONFIRM: &str = "Confirme sua senha";
const MSG_MISMATCH: &str = "As senhas não conferem";

/// Masked phone length bounds: "(99) 9999-9999" is 14, "(99) 99999-9999" is 15
const PHONE_MASKED_MIN: usize = 14;
const PHONE_MASKED_MAX: usize = 16;

const CPF_DIGITS: usize = 11;
const CNPJ_DIGITS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterField {
    Name,
    Email,
    Phone,
    Document,
    Company,
    Password,
    ConfirmPassword,
}

impl RegisterField {
    pub const ALL: [RegisterField; 7] = [
        RegisterField::Name,
        RegisterField::Email,
        RegisterField::Phone,
        RegisterField::Document,
        RegisterField::Company,
        RegisterField::Password,
        RegisterField::ConfirmPassword,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RegisterField::Name => "Nome",
            RegisterField::Email => "E-mail",
            RegisterField::Phone => "Celular",
            RegisterField::Document => "CPF/CNPJ",
            RegisterField::Company => "Empresa",
            RegisterField::Password => "Senha",
            RegisterField::ConfirmPassword => "Confirmar senha",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, RegisterField::Password | RegisterField::ConfirmPassword)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    /// Masked, e.g. "(11) 98765-4321"
    pub phone: String,
    /// Masked CPF or CNPJ
    pub document: String,
    pub company: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn value(&self, field: RegisterField) -> &str {
        match field {
            RegisterField::Name => &self.name,
            RegisterField::Email => &self.email,
            RegisterField::Phone => &self.phone,
            RegisterField::Document => &self.document,
            RegisterField::Company => &self.company,
            RegisterField::Password => &self.password,
            RegisterField::ConfirmPassword => &self.confirm_password,
        }
    }

    /// Replace a field's text, re-applying the phone and document masks.
    pub fn set(&mut self, field: RegisterField, text: String) {
        match field {
            RegisterField::Name => self.name = text,
            RegisterField::Email => self.email = text,
            RegisterField::Phone => self.phone = mask_phone_br(&text),
            RegisterField::Document => self.document = mask_cpf_cnpj(&text),
            RegisterField::Company => self.company = text,
            RegisterField::Password => self.password = text,
            RegisterField::ConfirmPassword => self.confirm_password = text,
        }
    }

    /// Remove the last character. For masked fields this drops the last digit,
    /// not a mask separator.
    pub fn pop(&mut self, field: RegisterField) {
        match field {
            RegisterField::Phone | RegisterField::Document => {
                let mut digits = only_digits(self.value(field));
                digits.pop();
                self.set(field, digits);
            }
            _ => {
                let mut text = self.value(field).to_string();
                text.pop();
                self.set(field, text);
            }
        }
    }

    pub fn can_submit(&self) -> bool {
        RegisterField::ALL.iter().all(|f| !self.value(*f).is_empty())
    }

    pub fn validate(&self) -> Result<RegisterRequest, FieldErrors<RegisterField>> {
        let mut errors = FieldErrors::new();

        if char_len(self.name.trim()) < 2 {
            errors.insert(RegisterField::Name, MSG_NAME.to_string());
        }
        if !is_valid_email(self.email.trim()) {
            errors.insert(RegisterField::Email, MSG_INVALID_EMAIL.to_string());
        }
        let phone_len = char_len(&self.phone);
        if !(PHONE_MASKED_MIN..=PHONE_MASKED_MAX).contains(&phone_len) {
            errors.insert(RegisterField::Phone, MSG_PHONE.to_string());
        }
        let doc = only_digits(&self.document);
        let document = match doc.len() {
            CPF_DIGITS => Some(Document::Cpf(doc)),
            CNPJ_DIGITS => Some(Document::Cnpj(doc)),
            _ => {
                errors.insert(RegisterField::Document, MSG_DOCUMENT.to_string());
                None
            }
        };
        if char_len(self.company.trim()) < 2 {
            errors.insert(RegisterField::Company, MSG_COMPANY.to_string());
        }
        if char_len(&self.password) < MIN_PASSWORD_LENGTH {
            errors.insert(RegisterField::Password, MSG_SHORT_PASSWORD.to_string());
        }
        if char_len(&self.confirm_password) < MIN_PASSWORD_LENGTH {
            errors.insert(RegisterField::ConfirmPassword, MSG_CONFIRM.to_string());
        } else if self.password != self.confirm_password {
            errors.insert(RegisterField::ConfirmPassword, MSG_MISMATCH.to_string());
        }

        match document {
            Some(document) if errors.is_empty() => Ok(RegisterRequest {
                nome: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                celular: only_digits(&self.phone),
                senha: self.password.clone(),
                empresa: self.company.trim().to_string(),
                document,
            }),
            _ => Err(errors),
        }
    }
}
